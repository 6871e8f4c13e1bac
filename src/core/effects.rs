//! Effects: what an ability or spell does when it resolves

use crate::core::Target;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Magnitude sentinel for "X" (chosen when the ability is activated or the spell cast)
pub const VARIABLE_AMOUNT: i32 = -1;

/// The kind of change an effect makes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectType {
    /// "deals 3 damage to any target"
    DealDamage,
    /// "draw a card"
    DrawCards,
    /// "you gain 3 life"
    GainLife,
    /// "target player loses 2 life"
    LoseLife,
    /// "Add {G}"
    AddMana,
    /// "+2/+2 until end of turn"; magnitude encodes power and toughness
    Pump,
    /// "Destroy target creature"
    Destroy,
    /// "Counter target spell"
    CounterSpell,
    /// "Tap target creature"
    Tap,
    /// "Untap target land"
    Untap,
    /// "Target player mills three cards"
    Mill,
    /// "Exile target creature"
    Exile,
    /// "Return target creature to its owner's hand"
    ReturnToHand,
    /// "Create a 1/1 white Soldier creature token"
    CreateToken,
    /// Keyword granted by a static ability ("Flying")
    GrantKeyword,
    /// "enters the battlefield tapped"
    EntersTapped,
    /// "Choose one —" when no mode could be recognized
    Modal,
}

/// How long an effect's change lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Duration {
    /// One-shot change (damage, card draw)
    #[default]
    Instant,
    UntilEndOfTurn,
    UntilEndOfCombat,
    Permanent,
    UntilLeavesPlay,
}

/// A single effect of an ability or spell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub effect_type: EffectType,

    /// Amount; semantics depend on `effect_type`. [`VARIABLE_AMOUNT`] means X.
    pub magnitude: i32,

    pub duration: Duration,

    /// Target requirements, in the order targets are chosen
    pub targets: Vec<Target>,

    /// Human-readable description ("draw 2 card(s)")
    pub description: String,
}

impl Effect {
    pub fn new(effect_type: EffectType, magnitude: i32) -> Self {
        Effect {
            effect_type,
            magnitude,
            duration: Duration::Instant,
            targets: Vec::new(),
            description: String::new(),
        }
        .described()
    }

    pub fn deal_damage(amount: i32, target: Target) -> Self {
        Effect::new(EffectType::DealDamage, amount).with_target(target)
    }

    pub fn draw_cards(count: i32) -> Self {
        Effect::new(EffectType::DrawCards, count)
    }

    pub fn gain_life(amount: i32) -> Self {
        Effect::new(EffectType::GainLife, amount)
    }

    pub fn add_mana(amount: i32) -> Self {
        Effect::new(EffectType::AddMana, amount)
    }

    /// A pump effect; power and toughness share one magnitude (power * 100 + toughness)
    ///
    /// `None` when the pair cannot be encoded, see [`encode_pump`].
    pub fn pump(power: i32, toughness: i32, duration: Duration) -> Option<Self> {
        let magnitude = encode_pump(power, toughness)?;
        Some(Effect::new(EffectType::Pump, magnitude).with_duration(duration))
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self.described()
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self.described()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_variable(&self) -> bool {
        self.magnitude == VARIABLE_AMOUNT
    }

    /// Magnitude with X substituted
    pub fn amount(&self, x_value: Option<u32>) -> i32 {
        if self.is_variable() {
            x_value
                .map(|x| i32::try_from(x).unwrap_or(i32::MAX))
                .unwrap_or(0)
        } else {
            self.magnitude
        }
    }

    /// Decoded (power, toughness) of a pump effect
    pub fn pump_values(&self) -> (i32, i32) {
        decode_pump(self.magnitude)
    }

    pub fn requires_targets(&self) -> bool {
        self.targets.iter().any(|t| t.required)
    }

    /// Regenerate the description from the structured fields
    pub fn refresh_description(&mut self) {
        self.description = self.to_string();
    }

    fn described(mut self) -> Self {
        self.refresh_description();
        self
    }
}

/// Largest toughness change a pump magnitude can carry
pub const MAX_PUMP_TOUGHNESS: i32 = 49;

/// Encode a power/toughness pair into a single magnitude
///
/// `None` when toughness is outside -49..=49 or the magnitude overflows.
pub fn encode_pump(power: i32, toughness: i32) -> Option<i32> {
    if toughness.abs() > MAX_PUMP_TOUGHNESS {
        return None;
    }
    power.checked_mul(100)?.checked_add(toughness)
}

/// Decode a pump magnitude produced by [`encode_pump`]
pub fn decode_pump(magnitude: i32) -> (i32, i32) {
    let toughness = (magnitude % 100 + 150) % 100 - 50;
    let power = (i64::from(magnitude) - i64::from(toughness)) / 100;
    (power as i32, toughness)
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = if self.is_variable() {
            "X".to_string()
        } else {
            self.magnitude.to_string()
        };
        let target = self
            .targets
            .first()
            .map(|t| format!(" to {t}"))
            .unwrap_or_default();
        match self.effect_type {
            EffectType::DealDamage => write!(f, "deal {amount} damage{target}"),
            EffectType::DrawCards => write!(f, "draw {amount} card(s)"),
            EffectType::GainLife => write!(f, "gain {amount} life"),
            EffectType::LoseLife => write!(f, "lose {amount} life"),
            EffectType::AddMana => write!(f, "add {amount} mana"),
            EffectType::Pump => {
                let (p, t) = self.pump_values();
                write!(f, "{p:+}/{t:+}{target} ({:?})", self.duration)
            }
            EffectType::Mill => write!(f, "mill {amount} card(s)"),
            other => write!(f, "{other:?}{target}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TargetType;

    #[test]
    fn test_pump_encoding() {
        assert_eq!(encode_pump(2, 2), Some(202));
        assert_eq!(decode_pump(202), (2, 2));
        for (p, t) in [(-2, -2), (2, -1), (0, 3), (-3, 0), (7, 49), (-7, -49)] {
            assert_eq!(encode_pump(p, t).map(decode_pump), Some((p, t)));
        }
    }

    #[test]
    fn test_pump_encoding_limits() {
        assert_eq!(encode_pump(50, 50), None);
        assert_eq!(encode_pump(0, -50), None);
        assert_eq!(encode_pump(30_000_000, 0), None);
        assert_eq!(encode_pump(i32::MIN, 0), None);
        assert!(Effect::pump(1, 60, Duration::UntilEndOfTurn).is_none());
        assert_eq!(decode_pump(i32::MIN).1, -48);
    }

    #[test]
    fn test_variable_amount() {
        let effect = Effect::draw_cards(VARIABLE_AMOUNT);
        assert!(effect.is_variable());
        assert_eq!(effect.amount(Some(4)), 4);
        assert_eq!(effect.amount(None), 0);
        assert_eq!(effect.amount(Some(u32::MAX)), i32::MAX);
        assert_eq!(effect.description, "draw X card(s)");
    }

    #[test]
    fn test_damage_description() {
        let effect = Effect::deal_damage(3, Target::new(TargetType::Any));
        assert_eq!(effect.description, "deal 3 damage to any target");
        assert!(effect.requires_targets());
    }
}
