//! Castable spells

use crate::core::{Card, CardId, CardType, Effect, Keyword, ManaCost, Target};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A spell being cast: distinct from a permanent's abilities but resolved
/// through the same effect-application path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spell {
    pub name: String,

    pub mana_cost: ManaCost,

    pub types: SmallVec<[CardType; 2]>,

    pub oracle_text: String,

    pub effects: Vec<Effect>,

    /// Card the spell was cast from
    pub source: CardId,

    /// Castable any time its controller holds priority
    pub flash: bool,
}

impl Spell {
    pub fn new(name: impl Into<String>, source: CardId, effects: Vec<Effect>) -> Self {
        Spell {
            name: name.into(),
            mana_cost: ManaCost::new(),
            types: SmallVec::new(),
            oracle_text: String::new(),
            effects,
            source,
            flash: false,
        }
    }

    /// Build the spell for casting `card`
    pub fn from_card(card: &Card, effects: Vec<Effect>) -> Self {
        Spell {
            name: card.name.clone(),
            mana_cost: card.mana_cost,
            types: card.types.clone(),
            oracle_text: card.text.clone(),
            effects,
            source: card.id,
            flash: card.has_keyword(&Keyword::Flash),
        }
    }

    pub fn with_types(mut self, types: &[CardType]) -> Self {
        self.types = types.iter().copied().collect();
        self
    }

    pub fn with_mana_cost(mut self, cost: ManaCost) -> Self {
        self.mana_cost = cost;
        self
    }

    pub fn is_instant(&self) -> bool {
        self.types.contains(&CardType::Instant)
    }

    /// Everything but instants and flash spells is cast at sorcery speed
    pub fn is_sorcery_speed(&self) -> bool {
        !self.is_instant() && !self.flash
    }

    pub fn is_permanent_spell(&self) -> bool {
        self.types.iter().any(|t| t.is_permanent_type())
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.effects.iter().flat_map(|e| e.targets.iter())
    }

    pub fn required_target_count(&self) -> usize {
        self.targets()
            .filter(|t| t.required)
            .map(|t| t.count as usize)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;

    #[test]
    fn test_spell_speed() {
        let bolt = Spell::new("Lightning Bolt", EntityId::new(1), vec![])
            .with_types(&[CardType::Instant]);
        assert!(!bolt.is_sorcery_speed());

        let divination = Spell::new("Divination", EntityId::new(2), vec![Effect::draw_cards(2)])
            .with_types(&[CardType::Sorcery]);
        assert!(divination.is_sorcery_speed());
        assert!(!divination.is_permanent_spell());

        let mut bears = Spell::new("Grizzly Bears", EntityId::new(3), vec![])
            .with_types(&[CardType::Creature]);
        assert!(bears.is_sorcery_speed());
        bears.flash = true;
        assert!(!bears.is_sorcery_speed());
    }
}
