// crates/setup-draft/src/atomic.rs
// ============================================================================
// Module: Atomic Writes
// Description: Temp-file, fsync and rename sequence for durable replacement.
// Purpose: Readers observe either the old file or the complete new one.
// Dependencies: tracing
// ============================================================================

//! ## Overview
//! [`write_atomic`] writes to a unique temporary sibling, syncs it, syncs the
//! directory, renames over the target and syncs the directory again. The
//! rename is the only visible transition. Directory syncs are best effort;
//! everything else is surfaced. The temporary file is removed on every
//! failure path.

use std::fs;
use std::fs::File;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::layout::DraftLayout;

/// Temporary names tried before giving up.
const MAX_TEMP_ATTEMPTS: u32 = 64;

/// Atomically replaces `target` with `bytes`.
///
/// # Errors
///
/// Returns the underlying I/O error when creating, writing, syncing or
/// renaming the temporary file fails, or `AlreadyExists` when no free
/// temporary name was found.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    write_atomic_with(target, bytes, || DraftLayout::temp_path_for(target))
}

/// Runs [`write_atomic`] drawing temporary names from `next_temp`.
fn write_atomic_with(
    target: &Path,
    bytes: &[u8],
    mut next_temp: impl FnMut() -> PathBuf,
) -> io::Result<()> {
    for _ in 0 .. MAX_TEMP_ATTEMPTS {
        let temp_path = next_temp();
        let file = match fs::OpenOptions::new().write(true).create_new(true).open(&temp_path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        };
        let result = write_and_rename(file, &temp_path, target, bytes);
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        return result;
    }
    Err(io::Error::new(io::ErrorKind::AlreadyExists, "unable to allocate temporary file"))
}

/// Runs the write sequence on an opened temporary file without cleanup.
fn write_and_rename(
    mut file: File,
    temp_path: &Path,
    target: &Path,
    bytes: &[u8],
) -> io::Result<()> {
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    let dir = target.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = dir {
        sync_dir(dir);
    }
    fs::rename(temp_path, target)?;
    if let Some(dir) = dir {
        sync_dir(dir);
    }
    Ok(())
}

/// Syncs a directory, ignoring platforms and filesystems that refuse it.
pub fn sync_dir(dir: &Path) {
    match File::open(dir).and_then(|handle| handle.sync_all()) {
        Ok(()) => {}
        Err(err) => debug!(dir = %dir.display(), error = %err, "directory fsync skipped"),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
