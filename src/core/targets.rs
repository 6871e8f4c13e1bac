//! Target requirements and restrictions

use crate::core::{CardId, CardType, Color, Keyword, PlayerId, StackItemId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Basic category a target must belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    /// "any target": a creature, player or planeswalker
    Any,
    Creature,
    Player,
    Opponent,
    Permanent,
    Spell,
    Artifact,
    Enchantment,
    Land,
    Planeswalker,
    CreatureOrPlayer,
}

impl TargetType {
    /// Map the noun of a target phrase ("creature", "spell") to a target type
    pub fn from_noun(noun: &str) -> Option<TargetType> {
        let target_type = match noun.trim().to_ascii_lowercase().as_str() {
            "creature" | "creatures" => TargetType::Creature,
            "player" | "players" => TargetType::Player,
            "opponent" | "opponents" => TargetType::Opponent,
            "permanent" | "permanents" => TargetType::Permanent,
            "spell" | "spells" => TargetType::Spell,
            "artifact" | "artifacts" => TargetType::Artifact,
            "enchantment" | "enchantments" => TargetType::Enchantment,
            "land" | "lands" => TargetType::Land,
            "planeswalker" | "planeswalkers" => TargetType::Planeswalker,
            "creature or player" | "player or creature" => TargetType::CreatureOrPlayer,
            "any" => TargetType::Any,
            _ => return None,
        };
        Some(target_type)
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = match self {
            TargetType::Any => "any target",
            TargetType::Creature => "creature",
            TargetType::Player => "player",
            TargetType::Opponent => "opponent",
            TargetType::Permanent => "permanent",
            TargetType::Spell => "spell",
            TargetType::Artifact => "artifact",
            TargetType::Enchantment => "enchantment",
            TargetType::Land => "land",
            TargetType::Planeswalker => "planeswalker",
            TargetType::CreatureOrPlayer => "creature or player",
        };
        write!(f, "{noun}")
    }
}

/// Numeric comparison used by power/toughness/mana value restrictions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    Equal,
    LessOrEqual,
    GreaterOrEqual,
    Less,
    Greater,
}

impl Comparison {
    pub fn holds(&self, actual: i32, expected: i32) -> bool {
        match self {
            Comparison::Equal => actual == expected,
            Comparison::LessOrEqual => actual <= expected,
            Comparison::GreaterOrEqual => actual >= expected,
            Comparison::Less => actual < expected,
            Comparison::Greater => actual > expected,
        }
    }
}

/// Who must control the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlRelation {
    You,
    Opponent,
}

/// What a single restriction tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestrictionKind {
    CardType(CardType),
    Subtype(String),
    Keyword(Keyword),
    Power(Comparison, i32),
    Toughness(Comparison, i32),
    ManaValue(Comparison, i32),
    Controller(ControlRelation),
    Color(Color),
    Tapped,
    Untapped,
    /// Is this particular permanent; negated for "other" creatures
    Card(CardId),
    /// Not modeled yet; always satisfied
    Other(String),
}

/// A restriction on a target, optionally negated ("nonartifact")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRestriction {
    pub kind: RestrictionKind,
    pub negated: bool,
}

impl TargetRestriction {
    pub fn new(kind: RestrictionKind) -> Self {
        TargetRestriction {
            kind,
            negated: false,
        }
    }

    pub fn negated(kind: RestrictionKind) -> Self {
        TargetRestriction {
            kind,
            negated: true,
        }
    }
}

impl fmt::Display for TargetRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (true, RestrictionKind::Card(card)) = (self.negated, &self.kind) {
            return write!(f, "other than {card}");
        }
        if self.negated {
            write!(f, "non-")?;
        }
        match &self.kind {
            RestrictionKind::CardType(t) => write!(f, "{t:?}"),
            RestrictionKind::Subtype(s) => write!(f, "{s}"),
            RestrictionKind::Keyword(k) => write!(f, "with {k}"),
            RestrictionKind::Power(cmp, n) => write!(f, "power {cmp:?} {n}"),
            RestrictionKind::Toughness(cmp, n) => write!(f, "toughness {cmp:?} {n}"),
            RestrictionKind::ManaValue(cmp, n) => write!(f, "mana value {cmp:?} {n}"),
            RestrictionKind::Controller(ControlRelation::You) => write!(f, "you control"),
            RestrictionKind::Controller(ControlRelation::Opponent) => {
                write!(f, "an opponent controls")
            }
            RestrictionKind::Color(c) => write!(f, "{c:?}"),
            RestrictionKind::Tapped => write!(f, "tapped"),
            RestrictionKind::Untapped => write!(f, "untapped"),
            RestrictionKind::Card(card) => write!(f, "{card}"),
            RestrictionKind::Other(text) => write!(f, "{text}"),
        }
    }
}

/// A target requirement of an effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub target_type: TargetType,

    /// Whether the effect needs this target to do anything
    pub required: bool,

    /// Number of objects chosen for this requirement
    pub count: u8,

    pub restrictions: Vec<TargetRestriction>,
}

impl Target {
    pub fn new(target_type: TargetType) -> Self {
        Target {
            target_type,
            required: true,
            count: 1,
            restrictions: Vec::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_count(mut self, count: u8) -> Self {
        self.count = count;
        self
    }

    pub fn with_restriction(mut self, restriction: TargetRestriction) -> Self {
        self.restrictions.push(restriction);
        self
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.target_type == TargetType::Any {
            write!(f, "any target")?;
        } else {
            write!(f, "target {}", self.target_type)?;
        }
        if !self.restrictions.is_empty() {
            let parts: Vec<String> = self.restrictions.iter().map(|r| r.to_string()).collect();
            write!(f, " [{}]", parts.join(", "))?;
        }
        Ok(())
    }
}

/// A chosen target: exactly one kind of game object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRef {
    Player(PlayerId),
    Permanent(CardId),
    Spell(StackItemId),
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetRef::Player(id) => write!(f, "player {id}"),
            TargetRef::Permanent(id) => write!(f, "permanent {id}"),
            TargetRef::Spell(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison() {
        assert!(Comparison::LessOrEqual.holds(2, 2));
        assert!(!Comparison::Less.holds(2, 2));
        assert!(Comparison::GreaterOrEqual.holds(4, 3));
        assert!(Comparison::Equal.holds(0, 0));
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::new(TargetType::Any).to_string(), "any target");
        let target = Target::new(TargetType::Creature)
            .with_restriction(TargetRestriction::negated(RestrictionKind::CardType(
                CardType::Artifact,
            )));
        assert_eq!(target.to_string(), "target creature [non-Artifact]");
    }

    #[test]
    fn test_from_noun() {
        assert_eq!(TargetType::from_noun("Creature"), Some(TargetType::Creature));
        assert_eq!(TargetType::from_noun("spell"), Some(TargetType::Spell));
        assert_eq!(TargetType::from_noun("wizard"), None);
    }
}
