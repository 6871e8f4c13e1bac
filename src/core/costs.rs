//! Cost system for activated abilities
//!
//! Represents what a player pays to activate an ability: mana, tapping the
//! source, sacrificing it, discarding cards, paying life. Costs the engine
//! does not model structurally yet are kept verbatim in `other`.

use crate::core::ManaCost;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A cost that must be paid to activate an ability
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cost {
    /// Mana requirement; X symbols are counted in `mana.x`
    pub mana: ManaCost,

    /// {T}
    pub tap: bool,

    /// "Sacrifice this permanent"
    pub sacrifice: bool,

    /// Number of cards to discard
    pub discard: u8,

    /// Life to pay
    pub life: i32,

    /// Unstructured cost fragments ("Remove a +1/+1 counter from this creature")
    pub other: Vec<String>,
}

impl Cost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tap() -> Self {
        Cost {
            tap: true,
            ..Cost::default()
        }
    }

    pub fn mana(mana: ManaCost) -> Self {
        Cost {
            mana,
            ..Cost::default()
        }
    }

    pub fn with_tap(mut self) -> Self {
        self.tap = true;
        self
    }

    pub fn includes_tap(&self) -> bool {
        self.tap
    }

    pub fn includes_mana(&self) -> bool {
        !self.mana.is_free()
    }

    pub fn is_free(&self) -> bool {
        !self.includes_mana()
            && !self.tap
            && !self.sacrifice
            && self.discard == 0
            && self.life == 0
            && self.other.is_empty()
    }

    /// The cost with X fixed to a concrete value; `None` if the mana overflows
    pub fn with_x(&self, x_value: u32) -> Option<Cost> {
        Some(Cost {
            mana: self.mana.with_x(x_value)?,
            ..self.clone()
        })
    }

    /// The cost with X counted as zero
    pub fn without_x(&self) -> Cost {
        Cost {
            mana: self.mana.without_x(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.includes_mana() {
            parts.push(self.mana.to_string());
        }
        if self.tap {
            parts.push("{T}".to_string());
        }
        if self.sacrifice {
            parts.push("Sacrifice this permanent".to_string());
        }
        if self.discard > 0 {
            parts.push(format!("Discard {} card(s)", self.discard));
        }
        if self.life > 0 {
            parts.push(format!("Pay {} life", self.life));
        }
        parts.extend(self.other.iter().cloned());
        if parts.is_empty() {
            write!(f, "free")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_cost() {
        let cost = Cost::tap();
        assert!(cost.includes_tap());
        assert!(!cost.includes_mana());
        assert!(!cost.is_free());
        assert_eq!(cost.to_string(), "{T}");
    }

    #[test]
    fn test_mana_and_tap_display() {
        let cost = Cost::mana(ManaCost::from_string("{1}{R}")).with_tap();
        assert_eq!(cost.to_string(), "{1}{R}, {T}");
    }

    #[test]
    fn test_x_cost() {
        let cost = Cost::mana(ManaCost::from_string("{X}{R}"));
        assert!(cost.includes_mana());
        let fixed = cost.with_x(4).unwrap();
        assert_eq!(fixed.mana.generic, 4);
        assert_eq!(fixed.mana.red, 1);
    }

    #[test]
    fn test_default_is_free() {
        assert!(Cost::new().is_free());
    }
}
