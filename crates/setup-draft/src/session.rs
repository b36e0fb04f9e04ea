// crates/setup-draft/src/session.rs
// ============================================================================
// Module: Session Guard
// Description: Single global editing session with idle takeover.
// Purpose: Reject writes from a second, still-active editor.
// Dependencies: time, crate::audit
// ============================================================================

//! ## Overview
//! The guard holds one `(session_id, last_activity)` record. The first
//! presented id is recorded; the same id refreshes it; a different id is a
//! conflict while the record is fresh and a takeover once it has been idle
//! longer than the window. Empty ids are always refused. The record lives in
//! memory only.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;

use crate::audit::DraftAuditEvent;
use crate::audit::DraftAuditSink;
use crate::error::SessionRejection;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Current holder of editing rights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    /// Session identifier.
    pub session_id: String,
    /// Last accepted request.
    #[serde(with = "time::serde::timestamp")]
    pub last_activity: OffsetDateTime,
}

/// Result of presenting a session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The id holds (or now holds) editing rights.
    Accepted,
    /// The id displaced an idle session.
    Takeover {
        /// Displaced session.
        previous_id: String,
        /// Last activity of the displaced session.
        previous_activity: OffsetDateTime,
    },
    /// Another session is active.
    Conflict {
        /// Session holding editing rights.
        active_id: String,
        /// Last activity of that session.
        last_activity: OffsetDateTime,
    },
    /// No id was presented.
    SessionRequired,
}

impl SessionOutcome {
    /// Converts refusals into a [`SessionRejection`].
    ///
    /// # Errors
    ///
    /// Returns the rejection for `Conflict` and `SessionRequired`.
    pub fn into_result(self) -> Result<Self, SessionRejection> {
        match self {
            Self::Conflict {
                active_id,
                last_activity,
            } => Err(SessionRejection::Conflict {
                active_id,
                last_activity,
            }),
            Self::SessionRequired => Err(SessionRejection::SessionRequired),
            outcome => Ok(outcome),
        }
    }

    /// Returns a short label for the outcome.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Takeover { .. } => "takeover",
            Self::Conflict { .. } => "conflict",
            Self::SessionRequired => "session_required",
        }
    }
}

// ============================================================================
// SECTION: Guard
// ============================================================================

/// Owner of the single session record.
pub struct SessionGuard {
    /// Recorded session, if any.
    record: Mutex<Option<SessionRecord>>,
    /// Sink for takeover events.
    audit: Arc<dyn DraftAuditSink>,
}

impl SessionGuard {
    /// Creates a guard with no recorded session.
    #[must_use]
    pub fn new(audit: Arc<dyn DraftAuditSink>) -> Self {
        Self {
            record: Mutex::new(None),
            audit,
        }
    }

    /// Presents `session_id` at the current time.
    pub fn enforce(&self, session_id: &str, window: Duration) -> SessionOutcome {
        self.enforce_at(session_id, window, OffsetDateTime::now_utc())
    }

    /// Presents `session_id` at `now`.
    pub fn enforce_at(
        &self,
        session_id: &str,
        window: Duration,
        now: OffsetDateTime,
    ) -> SessionOutcome {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return SessionOutcome::SessionRequired;
        }
        let mut record = self.lock_record();
        let outcome = match record.as_ref() {
            None => SessionOutcome::Accepted,
            Some(active) if active.session_id == session_id => SessionOutcome::Accepted,
            Some(active) if idle_for(active.last_activity, now) <= window => {
                return SessionOutcome::Conflict {
                    active_id: active.session_id.clone(),
                    last_activity: active.last_activity,
                };
            }
            Some(active) => {
                self.audit.record(&DraftAuditEvent::session_takeover(
                    session_id,
                    &active.session_id,
                    active.last_activity.unix_timestamp(),
                ));
                SessionOutcome::Takeover {
                    previous_id: active.session_id.clone(),
                    previous_activity: active.last_activity,
                }
            }
        };
        *record = Some(SessionRecord {
            session_id: session_id.to_string(),
            last_activity: now,
        });
        outcome
    }

    /// Returns the recorded session.
    #[must_use]
    pub fn current(&self) -> Option<SessionRecord> {
        self.lock_record().clone()
    }

    /// Clears the record when `session_id` holds it.
    ///
    /// Returns true when the record was cleared.
    pub fn release(&self, session_id: &str) -> bool {
        let mut record = self.lock_record();
        if record.as_ref().is_some_and(|active| active.session_id == session_id.trim()) {
            *record = None;
            return true;
        }
        false
    }

    /// Locks the record, recovering it from a poisoned lock.
    fn lock_record(&self) -> MutexGuard<'_, Option<SessionRecord>> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Time elapsed between `since` and `now`, zero when the clock went back.
fn idle_for(since: OffsetDateTime, now: OffsetDateTime) -> Duration {
    Duration::try_from(now - since).unwrap_or_default()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
