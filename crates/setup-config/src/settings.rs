// crates/setup-config/src/settings.rs
// ============================================================================
// Module: Wizard Settings
// Description: TOML settings for the draft lifecycle and its collaborators.
// Purpose: Strict, fail-closed settings parsing with hard limits.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! Settings are resolved from an explicit path, then `SETUP_WIZARD_CONFIG`,
//! then `setup-wizard.toml` in the working directory. Only the default file
//! may be missing; it then yields defaults. Every loaded value is validated
//! before use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default settings filename when no path is specified.
const DEFAULT_SETTINGS_NAME: &str = "setup-wizard.toml";
/// Environment variable used to override the settings path.
pub const SETTINGS_ENV_VAR: &str = "SETUP_WIZARD_CONFIG";
/// Environment variable that forces test mode on.
pub const TEST_MODE_ENV_VAR: &str = "SETUP_WIZARD_TEST_MODE";
/// Maximum settings file size in bytes.
pub(crate) const MAX_SETTINGS_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default session inactivity window in seconds.
pub(crate) const DEFAULT_INACTIVITY_WINDOW_SECS: u64 = 300;
/// Maximum session inactivity window in seconds.
pub(crate) const MAX_INACTIVITY_WINDOW_SECS: u64 = 86_400;
/// Default maximum age of a corruption notice in seconds.
pub(crate) const DEFAULT_NOTICE_MAX_AGE_SECS: u64 = 600;
/// Default probe timeout in milliseconds.
pub(crate) const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3_000;
/// Minimum probe timeout in milliseconds.
pub(crate) const MIN_PROBE_TIMEOUT_MS: u64 = 100;
/// Maximum probe timeout in milliseconds.
pub(crate) const MAX_PROBE_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// SECTION: Settings Types
// ============================================================================

/// Wizard settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WizardSettings {
    /// File locations.
    #[serde(default)]
    pub paths: PathSettings,
    /// Session guard settings.
    #[serde(default)]
    pub session: SessionSettings,
    /// Draft store settings.
    #[serde(default)]
    pub draft: DraftSettings,
    /// Liveness probe settings.
    #[serde(default)]
    pub probe: ProbeSettings,
    /// Audit sink settings.
    #[serde(default)]
    pub audit: AuditSettings,
    /// Skip network liveness checks.
    #[serde(default)]
    pub test_mode: bool,
}

/// File locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathSettings {
    /// Folder holding the live file and the draft.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
    /// Live configuration file name.
    #[serde(default = "default_live_file")]
    pub live_file: String,
    /// Data folder seeded into fresh drafts.
    #[serde(default)]
    pub default_data_folder: Option<String>,
}

/// Session guard settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSettings {
    /// Idle seconds after which another session may take over.
    #[serde(default = "default_inactivity_window_secs")]
    pub inactivity_window_secs: u64,
}

/// Draft store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DraftSettings {
    /// Corruption notices older than this are dropped unseen.
    #[serde(default = "default_notice_max_age_secs")]
    pub corruption_notice_max_age_secs: u64,
}

/// Liveness probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeSettings {
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// Append-only JSON lines file.
    File,
    /// Discard events.
    None,
}

/// Audit sink settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditSettings {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log path for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            live_file: default_live_file(),
            default_data_folder: None,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            inactivity_window_secs: default_inactivity_window_secs(),
        }
    }
}

impl Default for DraftSettings {
    fn default() -> Self {
        Self {
            corruption_notice_max_age_secs: default_notice_max_age_secs(),
        }
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout_ms(),
        }
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl WizardSettings {
    /// Loads settings from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        let mut settings = match fs::read(&resolved) {
            Ok(bytes) => Self::parse(&bytes)?,
            Err(err) if !explicit && err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(ConfigError::Io(err.to_string())),
        };
        if env::var(TEST_MODE_ENV_VAR).is_ok_and(|value| is_truthy(&value)) {
            settings.test_mode = true;
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Parses settings from raw bytes without validating them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bytes are oversized, not UTF-8, or not
    /// valid TOML for this shape.
    pub fn parse(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_SETTINGS_FILE_SIZE {
            return Err(ConfigError::Invalid("settings file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("settings file must be utf-8".to_string()))?;
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates the settings for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when settings are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.paths.validate()?;
        self.session.validate()?;
        self.probe.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Returns the live configuration path.
    #[must_use]
    pub fn live_path(&self) -> PathBuf {
        self.paths.config_dir.join(&self.paths.live_file)
    }

    /// Returns the session inactivity window.
    #[must_use]
    pub const fn inactivity_window(&self) -> Duration {
        Duration::from_secs(self.session.inactivity_window_secs)
    }

    /// Returns the corruption notice maximum age.
    #[must_use]
    pub const fn notice_max_age(&self) -> Duration {
        Duration::from_secs(self.draft.corruption_notice_max_age_secs)
    }

    /// Returns the probe timeout.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe.timeout_ms)
    }
}

impl PathSettings {
    /// Validates file locations.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("paths.config_dir", &self.config_dir.to_string_lossy())?;
        let live = Path::new(self.live_file.trim());
        if live.components().count() != 1 || live.file_name().is_none() {
            return Err(ConfigError::Invalid(
                "paths.live_file must be a single file name".to_string(),
            ));
        }
        let has_yaml_extension = live
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if !has_yaml_extension {
            return Err(ConfigError::Invalid(
                "paths.live_file must end in .yaml or .yml".to_string(),
            ));
        }
        if let Some(folder) = &self.default_data_folder {
            validate_path_string("paths.default_data_folder", folder)?;
        }
        Ok(())
    }
}

impl SessionSettings {
    /// Validates the inactivity window.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1 ..= MAX_INACTIVITY_WINDOW_SECS).contains(&self.inactivity_window_secs) {
            return Err(ConfigError::Invalid(format!(
                "session.inactivity_window_secs must be between 1 and \
                 {MAX_INACTIVITY_WINDOW_SECS}"
            )));
        }
        Ok(())
    }
}

impl ProbeSettings {
    /// Validates the probe timeout.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PROBE_TIMEOUT_MS ..= MAX_PROBE_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "probe.timeout_ms must be between {MIN_PROBE_TIMEOUT_MS} and \
                 {MAX_PROBE_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

impl AuditSettings {
    /// Validates the sink selection.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (AuditSinkKind::File, Some(path)) => {
                validate_path_string("audit.path", &path.to_string_lossy())
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the settings path; the flag is false for the default file.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(SETTINGS_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("settings path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_SETTINGS_NAME), false))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("settings path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("settings path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Returns true for `1`, `true` and `yes`, ignoring case.
fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

/// Default folder holding the live file.
fn default_config_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Default live file name.
fn default_live_file() -> String {
    "config.yaml".to_string()
}

/// Default inactivity window.
const fn default_inactivity_window_secs() -> u64 {
    DEFAULT_INACTIVITY_WINDOW_SECS
}

/// Default corruption notice age.
const fn default_notice_max_age_secs() -> u64 {
    DEFAULT_NOTICE_MAX_AGE_SECS
}

/// Default probe timeout.
const fn default_probe_timeout_ms() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

// ============================================================================
// SECTION: Tests
// ============================================================================
