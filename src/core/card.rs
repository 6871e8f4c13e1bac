//! Card types, keywords and the permanent capability surface

use crate::core::{CardId, Color, Duration, ManaCost, PlayerId, Subtype};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Creature,
    Instant,
    Sorcery,
    Enchantment,
    Artifact,
    Land,
    Planeswalker,
}

impl CardType {
    /// Parse a type word ("creature", "Artifact")
    pub fn from_word(word: &str) -> Option<CardType> {
        match word.to_ascii_lowercase().as_str() {
            "creature" | "creatures" => Some(CardType::Creature),
            "instant" | "instants" => Some(CardType::Instant),
            "sorcery" | "sorceries" => Some(CardType::Sorcery),
            "enchantment" | "enchantments" => Some(CardType::Enchantment),
            "artifact" | "artifacts" => Some(CardType::Artifact),
            "land" | "lands" => Some(CardType::Land),
            "planeswalker" | "planeswalkers" => Some(CardType::Planeswalker),
            _ => None,
        }
    }

    /// Permanents are everything that can sit on the battlefield
    pub fn is_permanent_type(&self) -> bool {
        !matches!(self, CardType::Instant | CardType::Sorcery)
    }
}

/// Keyword abilities
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Flying,
    FirstStrike,
    DoubleStrike,
    Deathtouch,
    Haste,
    Hexproof,
    Indestructible,
    Lifelink,
    Menace,
    Reach,
    Trample,
    Vigilance,
    Defender,
    Flash,
    Shroud,
    ProtectionFrom(Color),
    Other(String),
}

impl Keyword {
    /// Parse one keyword as written on a card ("Flying", "protection from red")
    ///
    /// Returns `None` for text that is not a keyword at all.
    pub fn parse(text: &str) -> Option<Keyword> {
        let lower = text.trim().to_ascii_lowercase();
        let keyword = match lower.as_str() {
            "flying" => Keyword::Flying,
            "first strike" => Keyword::FirstStrike,
            "double strike" => Keyword::DoubleStrike,
            "deathtouch" => Keyword::Deathtouch,
            "haste" => Keyword::Haste,
            "hexproof" => Keyword::Hexproof,
            "indestructible" => Keyword::Indestructible,
            "lifelink" => Keyword::Lifelink,
            "menace" => Keyword::Menace,
            "reach" => Keyword::Reach,
            "trample" => Keyword::Trample,
            "vigilance" => Keyword::Vigilance,
            "defender" => Keyword::Defender,
            "flash" => Keyword::Flash,
            "shroud" => Keyword::Shroud,
            _ => {
                let color = lower
                    .strip_prefix("protection from ")
                    .and_then(Color::from_word)?;
                Keyword::ProtectionFrom(color)
            }
        };
        Some(keyword)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::FirstStrike => write!(f, "First strike"),
            Keyword::DoubleStrike => write!(f, "Double strike"),
            Keyword::ProtectionFrom(color) => write!(f, "Protection from {color:?}"),
            Keyword::Other(text) => write!(f, "{text}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// A temporary power/toughness change applied by a pump effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PtModifier {
    pub power: i32,
    pub toughness: i32,
    pub duration: Duration,
}

/// A card instance: a permanent on the battlefield or a card in another zone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,

    /// Card name (e.g., "Llanowar Elves")
    pub name: String,

    pub mana_cost: ManaCost,

    /// Card types (a card can be multiple types)
    pub types: SmallVec<[CardType; 2]>,

    /// Card subtypes (e.g., "Elf", "Druid")
    pub subtypes: SmallVec<[Subtype; 2]>,

    pub colors: SmallVec<[Color; 2]>,

    pub power: Option<i8>,
    pub toughness: Option<i8>,

    /// Oracle text
    pub text: String,

    pub owner: PlayerId,

    /// Current controller (can differ from owner)
    pub controller: PlayerId,

    pub tapped: bool,

    pub keywords: Vec<Keyword>,

    /// Active pump effects, cleared by duration
    pub modifiers: Vec<PtModifier>,

    /// Damage marked this turn
    pub damage: i32,
}

impl Card {
    pub fn new(id: CardId, name: impl Into<String>, owner: PlayerId) -> Self {
        Card {
            id,
            name: name.into(),
            mana_cost: ManaCost::new(),
            types: SmallVec::new(),
            subtypes: SmallVec::new(),
            colors: SmallVec::new(),
            power: None,
            toughness: None,
            text: String::new(),
            owner,
            controller: owner,
            tapped: false,
            keywords: Vec::new(),
            modifiers: Vec::new(),
            damage: 0,
        }
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.types.contains(&card_type)
    }

    pub fn is_creature(&self) -> bool {
        self.is_type(CardType::Creature)
    }

    pub fn is_land(&self) -> bool {
        self.is_type(CardType::Land)
    }

    pub fn has_subtype(&self, subtype: &str) -> bool {
        self.subtypes.iter().any(|s| s.matches(subtype))
    }

    pub fn has_keyword(&self, keyword: &Keyword) -> bool {
        self.keywords.contains(keyword)
    }

    pub fn has_hexproof(&self) -> bool {
        self.has_keyword(&Keyword::Hexproof)
    }

    pub fn has_shroud(&self) -> bool {
        self.has_keyword(&Keyword::Shroud)
    }

    pub fn has_protection_from(&self, color: Color) -> bool {
        self.has_keyword(&Keyword::ProtectionFrom(color))
    }

    pub fn tap(&mut self) {
        self.tapped = true;
    }

    pub fn untap(&mut self) {
        self.tapped = false;
    }

    /// Current power including temporary modifiers (None for non-creatures)
    pub fn current_power(&self) -> Option<i32> {
        let base = self.power? as i32;
        Some(base + self.modifiers.iter().map(|m| m.power).sum::<i32>())
    }

    /// Current toughness including temporary modifiers (None for non-creatures)
    pub fn current_toughness(&self) -> Option<i32> {
        let base = self.toughness? as i32;
        Some(base + self.modifiers.iter().map(|m| m.toughness).sum::<i32>())
    }

    pub fn add_modifier(&mut self, power: i32, toughness: i32, duration: Duration) {
        self.modifiers.push(PtModifier {
            power,
            toughness,
            duration,
        });
    }

    /// Drop modifiers whose duration has elapsed
    pub fn expire_modifiers(&mut self, elapsed: Duration) {
        self.modifiers.retain(|m| m.duration != elapsed);
    }
}
