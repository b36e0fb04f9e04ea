// crates/setup-draft/src/apply.rs
// ============================================================================
// Module: Promotion
// Description: Replace the live configuration with a fully valid draft.
// Purpose: Write, verify and roll back in a fixed order.
// Dependencies: setup-config, setup-validate, tracing
// ============================================================================

//! ## Overview
//! [`Promoter::apply`] runs these steps in order and stops at the first
//! failure:
//!
//! 1. load the draft;
//! 2. run `final` validation;
//! 3. ensure the data folder exists (mode `0750` on unix);
//! 4. read the current live bytes as the rollback source;
//! 5. back up the live file (best effort);
//! 6. write the live file through a [`LiveConfigWriter`];
//! 7. verify the live file is non-empty, restoring the original otherwise;
//! 8. delete the draft.
//!
//! A failure in step 8 is a cleanup failure: the live file is already
//! promoted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use setup_config::Config;
use setup_config::KnownChains;
use setup_config::render_yaml;
use setup_validate::builtins::expand_home;
use tracing::info;
use tracing::warn;

use crate::atomic::write_atomic;
use crate::error::ApplyError;
use crate::phase::Phase;
use crate::phase::validate_phase_with;
use crate::store::DraftStore;

// ============================================================================
// SECTION: Writer Seam
// ============================================================================

/// Writes a document to the live configuration path.
pub trait LiveConfigWriter: Send + Sync {
    /// Replaces the file at `path` with `config`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the write fails.
    fn write_live(&self, path: &Path, config: &Config) -> io::Result<()>;
}

/// Atomic YAML writer used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlLiveWriter;

impl LiveConfigWriter for YamlLiveWriter {
    fn write_live(&self, path: &Path, config: &Config) -> io::Result<()> {
        let yaml = render_yaml(config).map_err(io::Error::other)?;
        write_atomic(path, yaml.as_bytes())
    }
}

// ============================================================================
// SECTION: Promoter
// ============================================================================

/// Summary of a successful promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Live configuration path.
    pub live_path: PathBuf,
    /// Data folder ensured before writing.
    pub data_folder: PathBuf,
    /// Whether the previous live file was copied to the backup slot.
    pub backup_created: bool,
    /// Size of the new live file.
    pub bytes_written: u64,
}

/// Runs one promotion.
pub struct Promoter<'a> {
    /// Draft source and backup slot.
    store: &'a DraftStore,
    /// Live file writer.
    writer: &'a dyn LiveConfigWriter,
    /// Chain table for final validation.
    chains: &'a dyn KnownChains,
}

impl<'a> Promoter<'a> {
    /// Creates a promoter.
    #[must_use]
    pub fn new(
        store: &'a DraftStore,
        writer: &'a dyn LiveConfigWriter,
        chains: &'a dyn KnownChains,
    ) -> Self {
        Self {
            store,
            writer,
            chains,
        }
    }

    /// Promotes the stored draft to the live configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError`] naming the step that failed. Every error except
    /// [`ApplyError::Cleanup`] leaves the draft in place.
    pub fn apply(&self) -> Result<ApplyReport, ApplyError> {
        let draft = match self.store.load() {
            Ok(Some(draft)) => draft,
            Ok(None) => return Err(ApplyError::DraftMissing),
            Err(err) => return Err(ApplyError::DraftUnreadable(err.to_string())),
        };

        let errors = validate_phase_with(&draft, Phase::Final, self.chains);
        if !errors.is_empty() {
            return Err(ApplyError::Invalid(errors));
        }

        let data_folder = expand_home(draft.config.general.data_folder.trim());
        ensure_data_folder(&data_folder)?;

        let live_path = self.store.layout().live_path();
        let original = match fs::read(&live_path) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => return Err(ApplyError::Io(err.to_string())),
        };

        let backup_created = self.store.backup_live_config().unwrap_or_else(|err| {
            warn!(error = %err, "live config backup skipped");
            false
        });

        self.writer
            .write_live(&live_path, &draft.config)
            .map_err(|err| ApplyError::Io(err.to_string()))?;

        let bytes_written = fs::metadata(&live_path).map(|meta| meta.len()).unwrap_or(0);
        if bytes_written == 0 {
            roll_back(&live_path, original.as_deref());
            return Err(ApplyError::Truncated(format!(
                "{} was empty after write",
                live_path.display()
            )));
        }

        self.store.remove().map_err(|err| ApplyError::Cleanup(err.to_string()))?;
        info!(live = %live_path.display(), bytes = bytes_written, "draft promoted");
        Ok(ApplyReport {
            live_path,
            data_folder,
            backup_created,
            bytes_written,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Creates the data folder when absent; an existing non-directory fails.
fn ensure_data_folder(path: &Path) -> Result<(), ApplyError> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(ApplyError::DataFolderNotDirectory(path.to_path_buf()));
    }
    create_restricted_dir(path).map_err(|err| ApplyError::DataFolder(err.to_string()))
}

/// Creates `path` and its parents with mode `0750`.
#[cfg(unix)]
fn create_restricted_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o750).create(path)
}

/// Creates `path` and its parents.
#[cfg(not(unix))]
fn create_restricted_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Restores the original live bytes, or removes the new file when there were
/// none.
fn roll_back(live_path: &Path, original: Option<&[u8]>) {
    let result = match original {
        Some(bytes) => write_atomic(live_path, bytes),
        None => fs::remove_file(live_path),
    };
    match result {
        Ok(()) => warn!(live = %live_path.display(), "empty live config rolled back"),
        Err(err) => warn!(live = %live_path.display(), error = %err, "live config rollback failed"),
    }
}
