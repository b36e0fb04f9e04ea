// crates/setup-draft/src/audit.rs
// ============================================================================
// Module: Draft Audit Logging
// Description: Structured audit events for draft lifecycle transitions.
// Purpose: Emit observable records of takeovers, corruption and promotion.
// Dependencies: serde, serde_json, setup-config
// ============================================================================

//! ## Overview
//! Audit events are JSON objects with an `event` label and a millisecond
//! timestamp. Sinks decide where they go; writes are best effort and never
//! fail the operation that produced them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use setup_config::AuditSettings;
use setup_config::AuditSinkKind;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Draft lifecycle audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Session that triggered the event, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Session displaced by a takeover.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_session_id: Option<String>,
    /// Last activity of the displaced session (seconds since epoch).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_activity: Option<i64>,
    /// File the event refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Free-form detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl DraftAuditEvent {
    /// Creates a bare event.
    fn new(event: &'static str) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            session_id: None,
            previous_session_id: None,
            previous_activity: None,
            path: None,
            detail: None,
        }
    }

    /// A session displaced an idle one.
    #[must_use]
    pub fn session_takeover(new_id: &str, previous_id: &str, previous_activity: i64) -> Self {
        Self {
            session_id: Some(new_id.to_string()),
            previous_session_id: Some(previous_id.to_string()),
            previous_activity: Some(previous_activity),
            ..Self::new("session_takeover")
        }
    }

    /// A corrupt draft was archived.
    #[must_use]
    pub fn draft_corruption(reason: &str, archived: Option<&Path>) -> Self {
        Self {
            path: archived.map(|path| path.display().to_string()),
            detail: Some(reason.to_string()),
            ..Self::new("draft_corruption")
        }
    }

    /// A draft became the live configuration.
    #[must_use]
    pub fn draft_promoted(session_id: Option<&str>, live_path: &Path) -> Self {
        Self {
            session_id: session_id.map(ToString::to_string),
            path: Some(live_path.display().to_string()),
            ..Self::new("draft_promoted")
        }
    }

    /// A draft was discarded on request.
    #[must_use]
    pub fn draft_reset(session_id: &str) -> Self {
        Self {
            session_id: Some(session_id.to_string()),
            ..Self::new("draft_reset")
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for draft lifecycle events.
pub trait DraftAuditSink: Send + Sync {
    /// Records an audit event.
    fn record(&self, event: &DraftAuditEvent);
}

/// Audit sink writing JSON lines to stderr.
pub struct StderrAuditSink;

impl DraftAuditSink for StderrAuditSink {
    fn record(&self, event: &DraftAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink appending JSON lines to a file.
pub struct FileAuditSink {
    /// Append-only log handle.
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens (or creates) the audit log at `path`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the file cannot be opened for append.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl DraftAuditSink for FileAuditSink {
    fn record(&self, event: &DraftAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Audit sink that discards events.
pub struct NoopAuditSink;

impl DraftAuditSink for NoopAuditSink {
    fn record(&self, _event: &DraftAuditEvent) {}
}

/// Builds the sink selected by `settings`.
///
/// # Errors
///
/// Returns the I/O error when a file sink cannot be opened.
pub fn sink_from_settings(settings: &AuditSettings) -> io::Result<Arc<dyn DraftAuditSink>> {
    match (settings.sink, &settings.path) {
        (AuditSinkKind::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
        (AuditSinkKind::None, _) => Ok(Arc::new(NoopAuditSink)),
        (AuditSinkKind::File, Some(path)) => Ok(Arc::new(FileAuditSink::new(path)?)),
        (AuditSinkKind::File, None) => {
            Err(io::Error::new(io::ErrorKind::InvalidInput, "file audit sink requires a path"))
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
