//! Spawning the sync CLI for one drop
//!
//! The drop is copied under its sanitized name into a temporary directory
//! before the CLI sees it, so an odd drop name never leaks into the child's
//! arguments as anything but a clean path. The temporary directory goes away
//! with the invocation.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{info, warn};

use crate::sanitize::sanitize_filename;

/// Environment toggle that appends `--dry-run` to every spawned run
pub const DRY_RUN_ENV_VAR: &str = "WATCH_DRY_RUN";

/// How one sync invocation is assembled
#[derive(Debug, Clone)]
pub struct SyncInvocation {
    /// The pmptex-sync binary (name on PATH or explicit path)
    pub bin: PathBuf,
    /// Worksheet name forwarded as `--sheet`
    pub sheet: String,
    /// Extra arguments forwarded verbatim (seeding flags, caps, mapping)
    pub extra_args: Vec<String>,
}

impl SyncInvocation {
    /// Full argument vector for one drop, honoring the dry-run env toggle.
    pub fn args_for(&self, xlsx: &Path) -> Vec<String> {
        let mut args = vec![
            xlsx.display().to_string(),
            "--sheet".to_string(),
            self.sheet.clone(),
        ];
        args.extend(self.extra_args.iter().cloned());
        if dry_run_requested() {
            args.push("--dry-run".to_string());
        }
        args
    }
}

fn dry_run_requested() -> bool {
    matches!(
        std::env::var(DRY_RUN_ENV_VAR).as_deref().map(str::trim),
        Ok("1") | Ok("true") | Ok("True")
    )
}

/// Run the sync CLI over one drop file.
///
/// Fails when the child cannot be spawned or exits non-zero; the caller
/// decides whether the drop is recorded as handled (it is not, on failure).
pub async fn run_sync(invocation: &SyncInvocation, drop_path: &Path) -> Result<()> {
    let original_name = drop_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let safe_name = sanitize_filename(&original_name);
    if safe_name != original_name {
        info!("Sanitized drop name: '{}' -> '{}'", original_name, safe_name);
    }

    let workdir = tempfile::tempdir().context("Failed to create temp dir")?;
    let local_path = workdir.path().join(&safe_name);
    std::fs::copy(drop_path, &local_path)
        .with_context(|| format!("Failed to copy {} into temp dir", drop_path.display()))?;

    let args = invocation.args_for(&local_path);
    info!("Exec: {} {}", invocation.bin.display(), args.join(" "));

    let output = Command::new(&invocation.bin)
        .args(&args)
        .output()
        .await
        .with_context(|| format!("Failed to spawn {}", invocation.bin.display()))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        info!("sync stdout:\n{}", stdout.trim_end());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        warn!("sync stderr:\n{}", stderr.trim_end());
    }

    if !output.status.success() {
        bail!(
            "{} failed (status {})",
            invocation.bin.display(),
            output.status
        );
    }

    Ok(())
}
