// crates/setup-draft/src/store.rs
// ============================================================================
// Module: Draft Store
// Description: Durable, atomic persistence of the working draft.
// Purpose: Load, save, archive corrupt drafts and keep the live backup slot.
// Dependencies: serde_json, setup-config, time, tracing
// ============================================================================

//! ## Overview
//! The store owns `config.draft.json` and its siblings. Loads never return a
//! partial document: empty, oversized, malformed or schema-mismatched files
//! are renamed aside to `config.draft.json.corrupt-<unix>` and a one-time
//! corruption flag is raised. Saves go through [`write_atomic`]. One mutex
//! serializes every operation on the draft file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use std::time::SystemTime;

use serde::Deserialize;
use serde::Serialize;
use setup_config::KnownChains;
use time::OffsetDateTime;
use tracing::debug;
use tracing::warn;

use crate::atomic::write_atomic;
use crate::audit::DraftAuditEvent;
use crate::audit::DraftAuditSink;
use crate::draft::DRAFT_SCHEMA_VERSION;
use crate::draft::Draft;
use crate::error::DraftStoreError;
use crate::layout::DraftLayout;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest draft file accepted on load.
pub const MAX_DRAFT_BYTES: u64 = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One-time notice that a corrupt draft was archived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptionNotice {
    /// When the corruption was detected (seconds since epoch).
    #[serde(default)]
    pub detected_at: i64,
    /// Why the draft was rejected.
    #[serde(default)]
    pub reason: Option<String>,
    /// Where the corrupt bytes were moved.
    #[serde(default)]
    pub archived: Option<PathBuf>,
}

/// Durable store for the working draft.
pub struct DraftStore {
    /// File names beside the live configuration.
    layout: DraftLayout,
    /// Chain id source for back-filling.
    chains: Arc<dyn KnownChains>,
    /// Sink for corruption events.
    audit: Arc<dyn DraftAuditSink>,
    /// Corruption notices older than this are discarded.
    notice_max_age: Duration,
    /// Serializes draft file operations.
    lock: Mutex<()>,
}

// ============================================================================
// SECTION: Store
// ============================================================================

impl DraftStore {
    /// Creates a store over `layout`.
    #[must_use]
    pub fn new(
        layout: DraftLayout,
        chains: Arc<dyn KnownChains>,
        audit: Arc<dyn DraftAuditSink>,
        notice_max_age: Duration,
    ) -> Self {
        Self {
            layout,
            chains,
            audit,
            notice_max_age,
            lock: Mutex::new(()),
        }
    }

    /// Returns the file layout.
    #[must_use]
    pub const fn layout(&self) -> &DraftLayout {
        &self.layout
    }

    /// Loads the draft.
    ///
    /// Returns `Ok(None)` when no draft exists.
    ///
    /// # Errors
    ///
    /// Returns [`DraftStoreError::Corrupt`] after archiving an unreadable
    /// draft, or [`DraftStoreError::Io`] when the file cannot be read.
    pub fn load(&self) -> Result<Option<Draft>, DraftStoreError> {
        let _guard = self.lock()?;
        let path = self.layout.draft_path();
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(DraftStoreError::Io(err.to_string())),
        };
        if metadata.len() == 0 {
            return Err(self.quarantine("draft file is empty".to_string()));
        }
        if metadata.len() > MAX_DRAFT_BYTES {
            return Err(self.quarantine("draft file exceeds size limit".to_string()));
        }
        let bytes = fs::read(&path).map_err(|err| DraftStoreError::Io(err.to_string()))?;
        let draft: Draft = match serde_json::from_slice(&bytes) {
            Ok(draft) => draft,
            Err(err) => return Err(self.quarantine(format!("draft is not valid: {err}"))),
        };
        if draft.meta.schema != DRAFT_SCHEMA_VERSION {
            return Err(self.quarantine(format!(
                "draft schema {} does not match {DRAFT_SCHEMA_VERSION}",
                draft.meta.schema
            )));
        }
        Ok(Some(draft))
    }

    /// Saves `draft`, back-filling names and chain ids and stamping metadata.
    ///
    /// # Errors
    ///
    /// Returns [`DraftStoreError`] when serialization or the atomic write
    /// fails; the previous draft is left in place.
    pub fn save(&self, draft: &mut Draft) -> Result<(), DraftStoreError> {
        draft.config.backfill(self.chains.as_ref());
        draft.meta.schema = DRAFT_SCHEMA_VERSION;
        draft.meta.updated = unix_now();
        let bytes = serde_json::to_vec_pretty(draft)
            .map_err(|err| DraftStoreError::Serialize(err.to_string()))?;
        let _guard = self.lock()?;
        fs::create_dir_all(self.layout.dir())
            .map_err(|err| DraftStoreError::Io(err.to_string()))?;
        write_atomic(&self.layout.draft_path(), &bytes)
            .map_err(|err| DraftStoreError::Io(err.to_string()))
    }

    /// Copies the live configuration into the rolling backup slot.
    ///
    /// Returns `false` when there is no live configuration to back up.
    ///
    /// # Errors
    ///
    /// Returns [`DraftStoreError::Io`] when reading or writing fails.
    pub fn backup_live_config(&self) -> Result<bool, DraftStoreError> {
        let bytes = match fs::read(self.layout.live_path()) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(DraftStoreError::Io(err.to_string())),
        };
        write_atomic(&self.layout.backup_path(), &bytes)
            .map_err(|err| DraftStoreError::Io(err.to_string()))?;
        Ok(true)
    }

    /// Deletes the draft; a missing draft is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DraftStoreError::Io`] when the file exists but cannot be
    /// removed.
    pub fn remove(&self) -> Result<(), DraftStoreError> {
        let _guard = self.lock()?;
        remove_if_present(&self.layout.draft_path())
    }

    /// Consumes the corruption flag.
    ///
    /// Returns the notice only when the flag is younger than the configured
    /// maximum age; stale flags are discarded silently.
    #[must_use]
    pub fn take_corruption_notice(&self) -> Option<CorruptionNotice> {
        let _guard = self.lock().ok()?;
        let path = self.layout.flag_path();
        let modified = fs::metadata(&path).and_then(|metadata| metadata.modified()).ok()?;
        let contents = fs::read(&path).unwrap_or_default();
        if let Err(err) = remove_if_present(&path) {
            warn!(path = %path.display(), error = %err, "corruption flag not removed");
        }
        let age = SystemTime::now().duration_since(modified).unwrap_or_default();
        if age > self.notice_max_age {
            debug!(age_secs = age.as_secs(), "stale corruption notice discarded");
            return None;
        }
        let mut notice =
            serde_json::from_slice::<CorruptionNotice>(&contents).unwrap_or(CorruptionNotice {
                detected_at: 0,
                reason: None,
                archived: None,
            });
        notice.detected_at = OffsetDateTime::from(modified).unix_timestamp();
        Some(notice)
    }

    /// Removes the corruption flag without reading it.
    ///
    /// # Errors
    ///
    /// Returns [`DraftStoreError::Io`] when the flag exists but cannot be
    /// removed.
    pub fn clear_corruption_flag(&self) -> Result<(), DraftStoreError> {
        let _guard = self.lock()?;
        remove_if_present(&self.layout.flag_path())
    }

    /// Archives the draft, raises the flag and builds the corruption error.
    fn quarantine(&self, reason: String) -> DraftStoreError {
        let path = self.layout.draft_path();
        let target = self.layout.corrupt_archive_path(unix_now());
        let archived = match fs::rename(&path, &target) {
            Ok(()) => Some(target),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "corrupt draft not archived");
                None
            }
        };
        let notice = CorruptionNotice {
            detected_at: unix_now(),
            reason: Some(reason.clone()),
            archived: archived.clone(),
        };
        let flag = serde_json::to_vec(&notice).unwrap_or_default();
        if let Err(err) = write_atomic(&self.layout.flag_path(), &flag) {
            warn!(error = %err, "corruption flag not written");
        }
        let archived_to =
            archived.as_ref().map(|path| path.display().to_string()).unwrap_or_default();
        warn!(reason = %reason, archived = %archived_to, "corrupt draft archived");
        self.audit.record(&DraftAuditEvent::draft_corruption(&reason, archived.as_deref()));
        DraftStoreError::Corrupt {
            reason,
            archived,
        }
    }

    /// Acquires the draft file lock.
    fn lock(&self) -> Result<MutexGuard<'_, ()>, DraftStoreError> {
        self.lock.lock().map_err(|_| DraftStoreError::Io("draft store lock poisoned".to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Removes `path`, treating absence as success.
fn remove_if_present(path: &std::path::Path) -> Result<(), DraftStoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(DraftStoreError::Io(err.to_string())),
    }
}

/// Current time in seconds since the Unix epoch.
pub(crate) fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
