//! Drop-folder scanning
//!
//! The watched folder is flat (a synced drive directory); only its direct
//! children are considered. The newest `.xlsx` wins, mirroring the upstream
//! workflow that always replaces the drop with a fresher file.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;
use walkdir::WalkDir;

/// Pick the most recently modified `.xlsx` in the folder, if any.
///
/// Hidden files and Office lock files (`~$...`) are ignored. Unreadable
/// entries are logged and skipped, never fatal.
pub fn latest_xlsx(folder: &Path) -> Result<Option<PathBuf>> {
    if !folder.is_dir() {
        bail!("Not a directory: {}", folder.display());
    }

    let mut newest: Option<(SystemTime, PathBuf)> = None;

    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error accessing entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') || name.starts_with("~$") {
            continue;
        }
        if !name.to_lowercase().ends_with(".xlsx") {
            continue;
        }

        let modified = match entry.metadata().map(|m| m.modified()) {
            Ok(Ok(modified)) => modified,
            Ok(Err(e)) => {
                warn!("Error reading mtime for {}: {}", entry.path().display(), e);
                continue;
            }
            Err(e) => {
                warn!("Error reading metadata for {}: {}", entry.path().display(), e);
                continue;
            }
        };

        match &newest {
            Some((best, _)) if *best >= modified => {}
            _ => newest = Some((modified, entry.path().to_path_buf())),
        }
    }

    Ok(newest.map(|(_, path)| path))
}
