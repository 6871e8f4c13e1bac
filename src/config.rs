//! Engine configuration
//!
//! A small JSON document; every field is optional and falls back to the
//! defaults below.

use crate::game::logger::{EngineLogger, OutputFormat, OutputMode, VerbosityLevel};
use crate::game::targeting::TargetValidator;
use crate::parser::OracleParser;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub verbosity: VerbosityLevel,
    pub output_mode: OutputMode,
    pub output_format: OutputFormat,
    pub starting_life: i32,
    /// Attach restrictions found in target phrases to parsed abilities
    pub enhanced_targeting: bool,
    /// Read shroud, hexproof and protection from keywords
    pub keyword_untargetability: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            verbosity: VerbosityLevel::Normal,
            output_mode: OutputMode::Stdout,
            output_format: OutputFormat::Text,
            starting_life: 20,
            enhanced_targeting: true,
            keyword_untargetability: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<()> {
        if self.starting_life <= 0 {
            return Err(EngineError::Config(format!(
                "starting_life must be positive, got {}",
                self.starting_life
            )));
        }
        Ok(())
    }

    pub fn build_logger(&self) -> EngineLogger {
        let mut logger = EngineLogger::with_verbosity(self.verbosity);
        logger.set_output_mode(self.output_mode);
        logger.set_output_format(self.output_format);
        logger
    }

    pub fn build_parser(&self) -> OracleParser {
        let mut parser = OracleParser::new().with_logger(self.build_logger());
        parser.set_enhanced_targeting(self.enhanced_targeting);
        parser
    }

    pub fn build_validator(&self) -> TargetValidator {
        if self.keyword_untargetability {
            TargetValidator::with_keyword_rules()
        } else {
            TargetValidator::default()
        }
    }
}
