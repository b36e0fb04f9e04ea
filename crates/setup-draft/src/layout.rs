// crates/setup-draft/src/layout.rs
// ============================================================================
// Module: Draft Layout
// Description: File names of the draft lifecycle beside the live file.
// Purpose: One place that derives every persisted path.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! Every file lives in the live file's directory:
//! `config.yaml`, `config.draft.json`, `config.draft.json.tmp-<pid>-<rand>`,
//! `config.draft.json.corrupt-<unix>`, `config.draft.json.corruption.flag`
//! and `config.prev.yaml`. The backup keeps the live file's extension.

use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;
use std::process;

/// Draft file name.
pub const DRAFT_FILE_NAME: &str = "config.draft.json";
/// Corruption flag file name.
pub const CORRUPTION_FLAG_NAME: &str = "config.draft.json.corruption.flag";
/// Stem of the rolling live backup.
const BACKUP_STEM: &str = "config.prev";

/// Paths used by the draft lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLayout {
    /// Directory holding every file.
    dir: PathBuf,
    /// Live configuration file name.
    live_file: String,
}

impl DraftLayout {
    /// Creates a layout rooted at `dir` with the given live file name.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, live_file: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            live_file: live_file.into(),
        }
    }

    /// Creates a layout for an existing live file path.
    #[must_use]
    pub fn for_live_path(live_path: &Path) -> Self {
        let dir = live_path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let live_file = live_path
            .file_name()
            .map_or_else(|| "config.yaml".to_string(), |name| name.to_string_lossy().into_owned());
        Self::new(dir, live_file)
    }

    /// Returns the directory holding every file.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the live configuration path.
    #[must_use]
    pub fn live_path(&self) -> PathBuf {
        self.dir.join(&self.live_file)
    }

    /// Returns the draft path.
    #[must_use]
    pub fn draft_path(&self) -> PathBuf {
        self.dir.join(DRAFT_FILE_NAME)
    }

    /// Returns the corruption flag path.
    #[must_use]
    pub fn flag_path(&self) -> PathBuf {
        self.dir.join(CORRUPTION_FLAG_NAME)
    }

    /// Returns the rolling backup path, keeping the live file's extension.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        let extension = Path::new(&self.live_file)
            .extension()
            .map_or_else(|| "yaml".to_string(), |ext| ext.to_string_lossy().into_owned());
        self.dir.join(format!("{BACKUP_STEM}.{extension}"))
    }

    /// Returns a fresh temporary path beside `target`.
    #[must_use]
    pub fn temp_path_for(target: &Path) -> PathBuf {
        let suffix = format!(".tmp-{}-{:08x}", process::id(), rand::random::<u32>());
        append_suffix(target, &suffix)
    }

    /// Returns an unused archive path for a corrupt draft found at `unix`.
    #[must_use]
    pub fn corrupt_archive_path(&self, unix: i64) -> PathBuf {
        let base = append_suffix(&self.draft_path(), &format!(".corrupt-{unix}"));
        if !base.exists() {
            return base;
        }
        (1_u32 ..)
            .map(|attempt| append_suffix(&base, &format!(".{attempt}")))
            .find(|candidate| !candidate.exists())
            .unwrap_or(base)
    }
}

/// Appends `suffix` to the final component of `path`.
fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map_or_else(OsString::new, OsString::from);
    name.push(suffix);
    path.with_file_name(name)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
