// crates/setup-draft/src/draft.rs
// ============================================================================
// Module: Draft Model
// Description: In-progress configuration document and its lifecycle metadata.
// Purpose: The unit the store persists and the phase validators inspect.
// Dependencies: serde, setup-config, time
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use setup_config::Config;
use setup_config::Estimates;
use time::OffsetDateTime;

/// Draft schema version written by this engine; any other value on load is
/// corruption.
pub const DRAFT_SCHEMA_VERSION: u32 = 1;

/// Draft lifecycle metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftMeta {
    /// Schema version of the persisted draft.
    pub schema: u32,
    /// Last save time, seconds since the Unix epoch.
    pub updated: i64,
    /// Session that last saved the draft.
    #[serde(default)]
    pub session: String,
    /// Disk and time estimates for the document.
    #[serde(default)]
    pub estimates: Estimates,
}

impl Default for DraftMeta {
    fn default() -> Self {
        Self {
            schema: DRAFT_SCHEMA_VERSION,
            updated: 0,
            session: String::new(),
            estimates: Estimates::default(),
        }
    }
}

/// A configuration document being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// Lifecycle metadata.
    pub meta: DraftMeta,
    /// Owned configuration document.
    pub config: Config,
}

impl Draft {
    /// Wraps `config` in fresh metadata.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            meta: DraftMeta::default(),
            config,
        }
    }

    /// Returns the last save time, when it is representable.
    #[must_use]
    pub fn updated_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.meta.updated).ok()
    }
}
