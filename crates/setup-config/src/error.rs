// crates/setup-config/src/error.rs
// ============================================================================
// Module: Config Errors
// Description: Error taxonomy for settings and live configuration I/O.
// Purpose: Stable, string-payload errors shared by the config crate.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Configuration loading or validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading or writing configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML or YAML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}
