//! Structured abilities
//!
//! An ability is what the parser produces from one sentence of oracle text:
//! a type, a cost, an ordered list of effects and the restrictions on when
//! it may be used. Abilities are registered against their source permanent
//! and live as long as that permanent stays on the battlefield.

use crate::core::{AbilityId, CardId, Cost, Effect, Target};
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of ability this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityType {
    /// Produces mana and resolves immediately, never using the stack
    Mana,
    /// "[Cost]: [Effect]"
    Activated,
    /// "When/Whenever/At ..."
    Triggered,
    /// Always-on effect of a permanent
    Static,
    /// Modifies how an event happens ("enters the battlefield tapped")
    Replacement,
    /// The instructions of an instant or sorcery
    Spell,
}

impl AbilityType {
    /// Abilities a player can choose to activate
    pub fn is_activatable(&self) -> bool {
        matches!(self, AbilityType::Mana | AbilityType::Activated)
    }
}

/// The event a triggered ability waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerCondition {
    EntersTheBattlefield,
    Dies,
    BeginningOfUpkeep,
    Attacks,
    LeavesTheBattlefield,
}

/// When an ability may be activated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimingRestriction {
    /// Main phase, empty stack, priority
    pub sorcery_speed: bool,
    pub combat_only: bool,
    /// Controller must be the active player
    pub your_turn_only: bool,
}

impl TimingRestriction {
    pub fn sorcery() -> Self {
        TimingRestriction {
            sorcery_speed: true,
            ..Self::default()
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        !self.sorcery_speed && !self.combat_only && !self.your_turn_only
    }
}

/// How often an ability may be activated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageLimit {
    pub per_turn: Option<u32>,
    pub per_game: Option<u32>,
}

impl UsageLimit {
    pub fn once_each_turn() -> Self {
        UsageLimit {
            per_turn: Some(1),
            per_game: None,
        }
    }
}

/// A structured ability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub id: AbilityId,

    pub name: String,

    pub ability_type: AbilityType,

    /// Permanent (or card) this ability belongs to
    pub source: CardId,

    pub cost: Cost,

    /// Never empty
    pub effects: Vec<Effect>,

    pub trigger: Option<TriggerCondition>,

    pub timing: TimingRestriction,

    pub usage_limit: UsageLimit,

    pub uses_this_turn: u32,

    pub uses_this_game: u32,

    /// Sentence of oracle text this ability came from
    pub oracle_text: String,

    /// Whether the parser built this ability
    pub parsed: bool,
}

impl Ability {
    /// Create an ability; fails on a nil id or an empty effect list
    pub fn new(
        id: AbilityId,
        name: impl Into<String>,
        ability_type: AbilityType,
        source: CardId,
        cost: Cost,
        effects: Vec<Effect>,
    ) -> Result<Self> {
        let name = name.into();
        if id.is_nil() {
            return Err(EngineError::InvalidAbility(format!(
                "ability '{name}' has a nil id"
            )));
        }
        if effects.is_empty() {
            return Err(EngineError::InvalidAbility(format!(
                "ability '{name}' has no effects"
            )));
        }
        Ok(Ability {
            id,
            name,
            ability_type,
            source,
            cost,
            effects,
            trigger: None,
            timing: TimingRestriction::default(),
            usage_limit: UsageLimit::default(),
            uses_this_turn: 0,
            uses_this_game: 0,
            oracle_text: String::new(),
            parsed: false,
        })
    }

    pub fn with_trigger(mut self, trigger: TriggerCondition) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn with_timing(mut self, timing: TimingRestriction) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_usage_limit(mut self, limit: UsageLimit) -> Self {
        self.usage_limit = limit;
        self
    }

    pub fn with_oracle_text(mut self, text: impl Into<String>) -> Self {
        self.oracle_text = text.into();
        self
    }

    pub fn is_mana_ability(&self) -> bool {
        self.ability_type == AbilityType::Mana
    }

    /// All target requirements across effects, in effect order
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.effects.iter().flat_map(|e| e.targets.iter())
    }

    pub fn requires_targets(&self) -> bool {
        self.effects.iter().any(|e| e.requires_targets())
    }

    /// Number of target choices the controller must supply
    pub fn required_target_count(&self) -> usize {
        self.targets()
            .filter(|t| t.required)
            .map(|t| t.count as usize)
            .sum()
    }

    pub fn has_variable_amount(&self) -> bool {
        self.cost.mana.has_x() || self.effects.iter().any(|e| e.is_variable())
    }

    /// Whether a per-turn or per-game limit has been reached
    pub fn usage_exhausted(&self) -> Option<&'static str> {
        if matches!(self.usage_limit.per_turn, Some(n) if self.uses_this_turn >= n) {
            return Some("per-turn");
        }
        if matches!(self.usage_limit.per_game, Some(n) if self.uses_this_game >= n) {
            return Some("per-game");
        }
        None
    }

    pub fn record_use(&mut self) {
        self.uses_this_turn += 1;
        self.uses_this_game += 1;
    }

    pub fn reset_turn_usage(&mut self) {
        self.uses_this_turn = 0;
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.ability_type, self.name)?;
        if let Some(trigger) = self.trigger {
            write!(f, " on {trigger:?}")?;
        }
        if !self.cost.is_free() {
            write!(f, " (cost: {})", self.cost)?;
        }
        let effects: Vec<&str> = self.effects.iter().map(|e| e.description.as_str()).collect();
        write!(f, ": {}", effects.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EffectType, EntityId, TargetType};

    fn draw_ability() -> Ability {
        Ability::new(
            AbilityId::new(1),
            "Draw",
            AbilityType::Activated,
            EntityId::new(10),
            Cost::tap(),
            vec![Effect::draw_cards(1)],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_effects_rejected() {
        let result = Ability::new(
            AbilityId::new(1),
            "Nothing",
            AbilityType::Activated,
            EntityId::new(10),
            Cost::tap(),
            vec![],
        );
        assert!(matches!(result, Err(EngineError::InvalidAbility(_))));
    }

    #[test]
    fn test_nil_id_rejected() {
        let result = Ability::new(
            AbilityId::NIL,
            "Draw",
            AbilityType::Activated,
            EntityId::new(10),
            Cost::tap(),
            vec![Effect::draw_cards(1)],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_usage_limits() {
        let mut ability = draw_ability().with_usage_limit(UsageLimit::once_each_turn());
        assert_eq!(ability.usage_exhausted(), None);
        ability.record_use();
        assert_eq!(ability.usage_exhausted(), Some("per-turn"));
        ability.reset_turn_usage();
        assert_eq!(ability.usage_exhausted(), None);
        assert_eq!(ability.uses_this_game, 1);
    }

    #[test]
    fn test_target_requirements() {
        let ability = Ability::new(
            AbilityId::new(2),
            "Shock",
            AbilityType::Activated,
            EntityId::new(10),
            Cost::tap(),
            vec![Effect::deal_damage(2, Target::new(TargetType::Any))],
        )
        .unwrap();
        assert!(ability.requires_targets());
        assert_eq!(ability.required_target_count(), 1);
        assert_eq!(ability.effects[0].effect_type, EffectType::DealDamage);
        assert!(!draw_ability().requires_targets());
    }
}
