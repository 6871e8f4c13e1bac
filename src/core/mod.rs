//! Core game types and entities

pub mod ability;
pub mod card;
pub mod costs;
pub mod effects;
pub mod entity;
pub mod mana;
pub mod player;
pub mod spell;
pub mod targets;
pub mod types;

pub use ability::{Ability, AbilityType, TimingRestriction, TriggerCondition, UsageLimit};
pub use card::{Card, CardType, Keyword, PtModifier};
pub use costs::Cost;
pub use effects::{decode_pump, encode_pump, Duration, Effect, EffectType, VARIABLE_AMOUNT};
pub use entity::{
    AbilityId, AbilityIdGenerator, CardId, EntityId, EntityStore, PlayerId, StackItemId,
};
pub use mana::{Color, ManaCost, ManaPool};
pub use player::Player;
pub use spell::Spell;
pub use targets::{
    Comparison, ControlRelation, RestrictionKind, Target, TargetRef, TargetRestriction,
    TargetType,
};
pub use types::{CardName, PlayerName, Subtype};
