//! Error types for the oracle engine

use crate::core::{AbilityId, EffectType, PlayerId, StackItemId};
use thiserror::Error;

/// Why an ability could not be activated
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    #[error("{0:?} abilities cannot be activated")]
    NotActivatable(crate::core::AbilityType),

    #[error("sorcery-speed ability outside a main phase")]
    SorcerySpeed,

    #[error("ability can only be activated during combat")]
    CombatOnly,

    #[error("ability can only be activated during its controller's turn")]
    NotYourTurn,

    #[error("usage limit reached ({0})")]
    UsageExhausted(&'static str),

    #[error("source is already tapped")]
    SourceTapped,

    #[error("controller cannot pay the cost")]
    CannotPayCost,

    #[error("no legal targets available")]
    NoLegalTargets,

    #[error("controller does not control the source")]
    NotController,
}

/// Violations of the priority protocol
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("player {player} acted out of turn (priority is held by {holder})")]
    OutOfTurn { player: PlayerId, holder: PlayerId },

    #[error("stack item {0} is not a spell and cannot be countered")]
    CounterNonSpell(StackItemId),

    #[error("stack item {0} is not on the stack")]
    ItemNotFound(StackItemId),

    #[error("cannot resolve an empty stack")]
    EmptyStack,

    #[error("spell cannot be cast at this time")]
    SpellTiming,

    #[error("player {0} is not seated at this table")]
    UnknownPlayer(PlayerId),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Activation denied: {0}")]
    ActivationDenied(#[from] DenialReason),

    #[error("Invalid target #{index}: {reason}")]
    InvalidTarget { index: usize, reason: String },

    #[error("Insufficient targets: {required} required, {supplied} supplied")]
    InsufficientTargets { required: usize, supplied: usize },

    #[error("Cost payment failed: {0}")]
    CostPayment(String),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(#[from] ProtocolViolation),

    #[error("Unimplemented effect: {0:?}")]
    UnimplementedEffect(EffectType),

    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("Ability not found: {0}")]
    AbilityNotFound(AbilityId),

    #[error("Invalid ability: {0}")]
    InvalidAbility(String),

    #[error("Invalid card format: {0}")]
    InvalidCardFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl EngineError {
    /// True for failures that only mean "not right now" (timing, usage, cost, targets)
    pub fn is_activation_denied(&self) -> bool {
        matches!(self, EngineError::ActivationDenied(_))
    }

    /// True for priority-protocol violations
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, EngineError::ProtocolViolation(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
