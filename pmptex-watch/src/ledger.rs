//! Processed-file ledger
//!
//! Remembers which drops were already handled so re-presenting the same file
//! triggers nothing. Identity is the SHA-256 of the content; the
//! modification timestamp is the fallback when no hash is available.
//! Persisted as JSON, written atomically (tmp + rename) so a crash mid-save
//! never corrupts the ledger.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// One handled drop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedEntry {
    pub name: String,
    /// File modification time, unix epoch milliseconds
    pub modified_ms: i64,
    /// SHA-256 of the file content, lowercase hex
    pub sha256: Option<String>,
    pub processed_at: DateTime<Utc>,
}

/// Ledger of handled drops, keyed by the file's path
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Ledger {
    entries: HashMap<String, ProcessedEntry>,
}

impl Ledger {
    /// Load from disk; a missing or unreadable ledger starts empty.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(ledger) => ledger,
                Err(e) => {
                    warn!("Ledger {} is unreadable ({}); starting empty", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist atomically: write a sibling tmp file, then rename over.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&tmp, content)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ProcessedEntry> {
        self.entries.get(key)
    }

    pub fn record(&mut self, key: String, entry: ProcessedEntry) {
        self.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fingerprint a local file: content hash plus modification time.
pub fn fingerprint(path: &Path) -> Result<ProcessedEntry> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {} for hashing", path.display()))?;
    let sha256 = format!("{:x}", Sha256::digest(&bytes));

    let metadata = std::fs::metadata(path)?;
    let modified_ms = metadata
        .modified()?
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(ProcessedEntry {
        name,
        modified_ms,
        sha256: Some(sha256),
        processed_at: Utc::now(),
    })
}

/// Should this drop be handed to the sync CLI?
///
/// New files always process. Otherwise the content hash decides; when the
/// current fingerprint has no hash, the modification time decides.
pub fn should_process(previous: Option<&ProcessedEntry>, current: &ProcessedEntry) -> bool {
    let Some(previous) = previous else {
        return true;
    };
    match (&current.sha256, &previous.sha256) {
        (Some(current_hash), Some(previous_hash)) => current_hash != previous_hash,
        _ => current.modified_ms != previous.modified_ms,
    }
}
