// crates/setup-config/src/live.rs
// ============================================================================
// Module: Live Configuration
// Description: Reader and YAML codec for the configuration the daemon runs.
// Purpose: Seed drafts from the live file and render promoted documents.
// Dependencies: serde_yaml, tracing
// ============================================================================

//! ## Overview
//! The live configuration is a YAML file beside the draft. Reads are size
//! capped. An absent or blank file reads as "no live configuration"; a file
//! that does not parse is an error so callers never silently discard it.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::document::Config;
use crate::error::ConfigError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum live configuration size in bytes.
pub const MAX_LIVE_CONFIG_BYTES: u64 = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Source Trait
// ============================================================================

/// Read access to the live configuration.
pub trait LiveConfigSource: Send + Sync {
    /// Returns the live document, or `None` when none exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file exists but cannot be read or
    /// parsed.
    fn read_live(&self) -> Result<Option<Config>, ConfigError>;
}

/// Live configuration stored at a fixed path.
#[derive(Debug, Clone)]
pub struct FileLiveConfig {
    /// Location of the live YAML file.
    path: PathBuf,
}

impl FileLiveConfig {
    /// Creates a source for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Returns the live file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LiveConfigSource for FileLiveConfig {
    fn read_live(&self) -> Result<Option<Config>, ConfigError> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no live configuration");
                return Ok(None);
            }
            Err(err) => return Err(ConfigError::Io(err.to_string())),
        };
        if metadata.len() > MAX_LIVE_CONFIG_BYTES {
            return Err(ConfigError::Invalid("live config exceeds size limit".to_string()));
        }
        let bytes = fs::read(&self.path).map_err(|err| ConfigError::Io(err.to_string()))?;
        parse_yaml(&bytes)
    }
}

// ============================================================================
// SECTION: YAML Codec
// ============================================================================

/// Parses a live configuration document.
///
/// # Errors
///
/// Returns [`ConfigError`] when the bytes are not UTF-8 YAML of the expected
/// shape.
pub fn parse_yaml(bytes: &[u8]) -> Result<Option<Config>, ConfigError> {
    let content = std::str::from_utf8(bytes)
        .map_err(|_| ConfigError::Invalid("live config must be utf-8".to_string()))?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_yaml::from_str(content).map(Some).map_err(|err| ConfigError::Parse(err.to_string()))
}

/// Renders a document as YAML.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] when serialization fails.
pub fn render_yaml(config: &Config) -> Result<String, ConfigError> {
    serde_yaml::to_string(config).map_err(|err| ConfigError::Parse(err.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
