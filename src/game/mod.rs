//! Rules engine: target evaluation, ability execution, stack and priority

pub mod executor;
pub mod interfaces;
pub mod logger;
pub mod phase;
pub mod registry;
pub mod stack;
pub mod state;
pub mod targeting;

pub use executor::{
    Activation, ActivationChoices, EffectContext, ExecutionEngine, PendingTrigger,
};
pub use interfaces::{GameCallbacks, GameView};
pub use logger::{EngineLogger, LogEntry, OutputFormat, OutputMode, VerbosityLevel};
pub use phase::{Phase, Step, TurnStructure};
pub use registry::AbilityRegistry;
pub use stack::{PassOutcome, PriorityStack, ResolutionOutcome, StackItem, StackObject};
pub use state::GameState;
pub use targeting::{
    DefaultUntargetability, KeywordUntargetability, TargetCandidate, TargetValidator,
    TargetVerdict, UntargetabilityRules,
};
