//! Card file loader (.txt format)
//!
//! Reads Forge-style `Key:Value` card descriptions. Only the characteristic
//! lines are used; abilities come from parsing the `Oracle:` text.

use crate::core::{
    Ability, AbilityType, Card, CardId, CardName, CardType, Color, Keyword, ManaCost, PlayerId,
    Spell, Subtype,
};
use crate::parser::{granted_keyword, OracleParser};
use crate::{EngineError, Result};
use smallvec::SmallVec;
use std::fs;
use std::path::Path;

const SUPERTYPES: [&str; 4] = ["Legendary", "Basic", "Snow", "World"];

pub struct CardLoader;

impl CardLoader {
    pub fn load_from_file(path: &Path) -> Result<CardDefinition> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a card from its text content
    pub fn parse(content: &str) -> Result<CardDefinition> {
        let mut name = None;
        let mut mana_cost = ManaCost::new();
        let mut types = Vec::new();
        let mut subtypes = Vec::new();
        let mut power = None;
        let mut toughness = None;
        let mut oracle = String::new();
        let mut keywords = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "Name" => name = Some(CardName::new(value)),
                "ManaCost" if value != "no cost" => mana_cost = ManaCost::from_string(value),
                "Types" => {
                    for part in value.split_whitespace() {
                        if SUPERTYPES.contains(&part) {
                            continue;
                        }
                        match CardType::from_word(part) {
                            Some(card_type) => types.push(card_type),
                            None => subtypes.push(Subtype::new(part)),
                        }
                    }
                }
                "PT" => {
                    let (p, t) = value.split_once('/').ok_or_else(|| {
                        EngineError::InvalidCardFormat(format!("bad PT line '{value}'"))
                    })?;
                    power = p.trim().parse().ok();
                    toughness = t.trim().parse().ok();
                }
                // Forge writes line breaks in oracle text as a literal \n
                "Oracle" => oracle = value.replace("\\n", "\n"),
                "K" => keywords.push(
                    Keyword::parse(value).unwrap_or_else(|| Keyword::Other(value.to_string())),
                ),
                _ => {}
            }
        }

        let name =
            name.ok_or_else(|| EngineError::InvalidCardFormat("missing Name line".to_string()))?;
        if types.is_empty() {
            return Err(EngineError::InvalidCardFormat(format!(
                "{name} has no card types"
            )));
        }

        Ok(CardDefinition {
            name,
            colors: mana_cost.colors(),
            mana_cost,
            types,
            subtypes,
            power,
            toughness,
            oracle,
            keywords,
        })
    }
}

/// Card definition (not yet instantiated in a game)
#[derive(Debug, Clone, PartialEq)]
pub struct CardDefinition {
    pub name: CardName,
    pub mana_cost: ManaCost,
    pub types: Vec<CardType>,
    pub subtypes: Vec<Subtype>,
    pub colors: Vec<Color>,
    pub power: Option<i8>,
    pub toughness: Option<i8>,
    pub oracle: String,
    /// Keywords from `K:` lines
    pub keywords: Vec<Keyword>,
}

/// A card ready to be put into a game, with what its text parsed into
#[derive(Debug, Clone)]
pub struct LoadedCard {
    pub card: Card,

    /// Permanent abilities: everything except the spell's own instructions
    pub abilities: Vec<Ability>,

    /// Present for instants and sorceries whose text parsed
    pub spell: Option<Spell>,
}

impl CardDefinition {
    pub fn instantiate(&self, id: CardId, owner: PlayerId) -> Card {
        let mut card = Card::new(id, self.name.as_str(), owner);
        card.mana_cost = self.mana_cost;
        card.types = SmallVec::from_vec(self.types.clone());
        card.subtypes = SmallVec::from_vec(self.subtypes.clone());
        card.colors = SmallVec::from_vec(self.colors.clone());
        card.power = self.power;
        card.toughness = self.toughness;
        card.text = self.oracle.clone();
        card.keywords = self.keywords.clone();
        card
    }

    pub fn is_instant_or_sorcery(&self) -> bool {
        self.types
            .iter()
            .any(|t| matches!(t, CardType::Instant | CardType::Sorcery))
    }

    /// Instantiate the card and parse its oracle text
    ///
    /// Keywords granted by the card's own static lines are added to the card.
    pub fn build(&self, id: CardId, owner: PlayerId, parser: &mut OracleParser) -> LoadedCard {
        let mut card = self.instantiate(id, owner);
        let parsed = parser.parse_card(&self.oracle, self.name.as_str(), id);

        for ability in parsed.iter().filter(|a| a.ability_type == AbilityType::Static) {
            for keyword in ability.effects.iter().filter_map(granted_keyword) {
                if !card.keywords.contains(&keyword) {
                    card.keywords.push(keyword);
                }
            }
        }

        let (spell_abilities, abilities): (Vec<Ability>, Vec<Ability>) = parsed
            .into_iter()
            .partition(|a| a.ability_type == AbilityType::Spell);

        let spell = if self.is_instant_or_sorcery() {
            let effects: Vec<_> = spell_abilities.into_iter().flat_map(|a| a.effects).collect();
            (!effects.is_empty()).then(|| Spell::from_card(&card, effects))
        } else {
            None
        };

        LoadedCard {
            card,
            abilities,
            spell,
        }
    }
}
