//! MTG oracle engine - ability parsing and stack resolution
//!
//! Converts oracle text into structured abilities and resolves spells and
//! abilities through a priority-and-stack protocol.
//!
//! Text flows into [`parser::OracleParser`], abilities are registered with a
//! [`game::ExecutionEngine`], and spells and activated abilities are resolved
//! by a [`game::PriorityStack`] against any [`game::GameCallbacks`]
//! implementation ([`game::GameState`] is the reference one).

/// Log a verbose message when the `verbose-logging` feature is enabled
macro_rules! log_if_verbose {
    ($logger:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $logger.verbose(&format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$logger;
        }
    };
}

pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod loader;
pub mod parser;
pub mod zones;

pub use config::EngineConfig;
pub use error::{DenialReason, EngineError, ProtocolViolation, Result};
