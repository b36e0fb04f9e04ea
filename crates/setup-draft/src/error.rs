// crates/setup-draft/src/error.rs
// ============================================================================
// Module: Draft Errors
// Description: Error taxonomy for the draft lifecycle.
// Purpose: Distinct, machine-readable failures for store, session and apply.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Store and promotion errors carry string payloads with stable `Display`
//! prefixes. Session rejections are a separate type so surfaces can tell
//! "someone else is editing" apart from "please identify yourself".

use std::path::PathBuf;

use setup_config::ConfigError;
use thiserror::Error;
use time::OffsetDateTime;

use crate::phase::FieldError;

// ============================================================================
// SECTION: Store
// ============================================================================

/// Draft store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftStoreError {
    /// I/O failure while reading, writing or renaming draft files.
    #[error("draft store io error: {0}")]
    Io(String),
    /// The draft was unreadable and has been archived.
    #[error("draft store corruption: {reason}")]
    Corrupt {
        /// Why the draft was rejected.
        reason: String,
        /// Where the original bytes were moved, when the rename succeeded.
        archived: Option<PathBuf>,
    },
    /// The draft could not be serialized.
    #[error("draft store serialization error: {0}")]
    Serialize(String),
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Reasons the session guard refuses a mutating request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionRejection {
    /// Another session is active.
    #[error("session conflict: session {active_id} is active")]
    Conflict {
        /// Session currently holding editing rights.
        active_id: String,
        /// Last time that session was seen.
        last_activity: OffsetDateTime,
    },
    /// No session id was presented.
    #[error("session required: requests must carry a session id")]
    SessionRequired,
}

// ============================================================================
// SECTION: Promotion
// ============================================================================

/// Promotion failures, in the order the steps run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// No draft exists.
    #[error("cannot load draft: no draft exists")]
    DraftMissing,
    /// The draft exists but could not be loaded.
    #[error("cannot load draft: {0}")]
    DraftUnreadable(String),
    /// Final validation failed; nothing was written.
    #[error("draft is invalid: {}", render_field_errors(.0))]
    Invalid(Vec<FieldError>),
    /// The data folder could not be created.
    #[error("data folder error: {0}")]
    DataFolder(String),
    /// The data folder path exists and is not a directory.
    #[error("data folder is not a directory: {0}")]
    DataFolderNotDirectory(PathBuf),
    /// I/O failure while reading or writing the live configuration.
    #[error("live config io error: {0}")]
    Io(String),
    /// The live configuration was empty after the write and was rolled back.
    #[error("live config truncated: unexpected end of file ({0})")]
    Truncated(String),
    /// The live configuration is in place but the draft could not be removed.
    #[error("cleanup failed after promotion: {0}")]
    Cleanup(String),
}

/// Joins field errors into one line.
fn render_field_errors(errors: &[FieldError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Failures surfaced by the draft service facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The session guard rejected the request.
    #[error(transparent)]
    Session(#[from] SessionRejection),
    /// The draft store failed.
    #[error(transparent)]
    Store(#[from] DraftStoreError),
    /// Promotion failed.
    #[error(transparent)]
    Apply(#[from] ApplyError),
    /// Live configuration or settings could not be used.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
