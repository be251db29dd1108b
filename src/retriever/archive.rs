//! Landing downloaded bytes on disk without ever leaving a truncated file.
//!
//! Both paths stage the content in a temp file beside the destination and
//! rename it into place, so the canonical file is either untouched or fully
//! replaced.

use anyhow::{Context, Result};
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::warn;
use zip::ZipArchive;
use zip::result::ZipError;

fn staging_file(dest: &Path) -> Result<NamedTempFile> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(dir).with_context(|| format!("Failed to stage file in {}", dir.display()))
}

fn commit(staged: NamedTempFile, dest: &Path) -> Result<()> {
    staged
        .persist(dest)
        .with_context(|| format!("Failed to move staged file to {}", dest.display()))?;
    Ok(())
}

/// Writes `bytes` verbatim to `dest`.
pub fn write_raw(bytes: &[u8], dest: &Path) -> Result<()> {
    let mut staged = staging_file(dest)?;
    staged.write_all(bytes)?;
    staged.flush()?;
    commit(staged, dest)
}

/// Extracts the single entry `entry_name` from the zip in `bytes` to `dest`.
///
/// Returns `Ok(false)` when the payload is not a zip or lacks the entry.
pub fn extract_entry(bytes: &[u8], entry_name: &str, dest: &Path) -> Result<bool> {
    let mut archive = match ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) => archive,
        Err(e) => {
            warn!(error = %e, "Download is not a readable zip archive");
            return Ok(false);
        }
    };

    let mut entry = match archive.by_name(entry_name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            warn!(entry = entry_name, "Expected entry not found in archive");
            return Ok(false);
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to open '{entry_name}' in archive")),
    };

    let mut staged = staging_file(dest)?;
    std::io::copy(&mut entry, &mut staged)
        .with_context(|| format!("Failed to extract '{entry_name}'"))?;
    staged.flush()?;
    commit(staged, dest)?;
    Ok(true)
}
