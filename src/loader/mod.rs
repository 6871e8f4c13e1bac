//! Card loader
//!
//! Parser for the Forge card format (.txt)

pub mod card;

pub use card::{CardDefinition, CardLoader, LoadedCard};
