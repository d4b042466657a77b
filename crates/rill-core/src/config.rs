//! Runtime configuration for the event core
//!
//! ```toml
//! [registry]
//! duplicates = "reject"      # reject | first_wins | last_wins
//!
//! [dispatch]
//! max_depth = 64
//! trace_events = false
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RillConfig {
    /// Event type registry behaviour
    pub registry: RegistryConfig,

    /// Dispatch behaviour for multiplexers and the root program
    pub dispatch: DispatchConfig,
}

impl RillConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "loaded rill config");
        Ok(config)
    }
}

/// What the registry does when one name is declared twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with `RillError::DuplicateEventType`
    #[default]
    Reject,
    /// Keep the first declaration's position, ignore later ones
    FirstWins,
    /// Move the name to its last declared position
    LastWins,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub duplicates: DuplicatePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Maximum nesting of re-entrant dispatches on the root program
    pub max_depth: usize,

    /// Trace-log every record flowing through a multiplexer
    pub trace_events: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            trace_events: false,
        }
    }
}
