//! pmptex-watch - Drop-folder watcher
//!
//! Polls a drive-synced folder on a fixed interval and hands the newest
//! unseen `.xlsx` to the pmptex-sync CLI, at most one file per tick, fully
//! serial. Handled files are fingerprinted in a ledger that survives
//! restarts. Shutdown is cooperative: a signal stops the loop between ticks
//! or during the sleep, never mid-run.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pmptex_watch::ledger::{fingerprint, should_process, Ledger};
use pmptex_watch::runner::{run_sync, SyncInvocation};
use pmptex_watch::scan::latest_xlsx;

/// Command-line arguments for pmptex-watch
#[derive(Parser, Debug)]
#[command(name = "pmptex-watch")]
#[command(about = "Watches a drop folder and runs pmptex-sync on new spreadsheets")]
#[command(version)]
struct Args {
    /// Drop folder to poll (a locally synced drive directory)
    folder: PathBuf,

    /// Seconds between polls
    #[arg(long, default_value_t = 30, env = "PMPTEX_WATCH_INTERVAL")]
    interval_secs: u64,

    /// Ledger of already-handled drops
    #[arg(long, default_value = "processados.json")]
    state_file: PathBuf,

    /// pmptex-sync binary to spawn
    #[arg(long, default_value = "pmptex-sync")]
    sync_bin: PathBuf,

    /// Worksheet name forwarded to the sync CLI
    #[arg(long, default_value = "Planilha1")]
    sheet: String,

    /// Arguments after `--` are forwarded verbatim to the sync CLI
    /// (e.g. `-- --auto-seed --max-seed 15 --default-idconteudo 1`)
    #[arg(last = true)]
    sync_args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pmptex_watch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!(
        folder = %args.folder.display(),
        interval_secs = args.interval_secs,
        "Watcher started"
    );

    let invocation = SyncInvocation {
        bin: args.sync_bin.clone(),
        sheet: args.sheet.clone(),
        extra_args: args.sync_args.clone(),
    };

    let mut ledger = Ledger::load(&args.state_file);
    info!(known_drops = ledger.len(), "Ledger loaded");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        // A tick failure must not kill the watcher; the next poll retries
        if let Err(e) = tick(&args, &invocation, &mut ledger).await {
            warn!("Tick failed: {:#}", e);
        }

        tokio::select! {
            _ = &mut shutdown => {
                info!("Stop requested; shutting down watcher");
                break;
            }
            _ = tokio::time::sleep(Duration::from_secs(args.interval_secs)) => {}
        }
    }

    info!("Watcher finished");
    Ok(())
}

/// One poll: newest drop, fingerprint, skip-or-run, record on success.
async fn tick(args: &Args, invocation: &SyncInvocation, ledger: &mut Ledger) -> Result<()> {
    let Some(drop_path) = latest_xlsx(&args.folder)? else {
        debug!("No .xlsx in the drop folder");
        return Ok(());
    };

    let entry = fingerprint(&drop_path)?;
    let key = drop_path.display().to_string();

    if !should_process(ledger.get(&key), &entry) {
        debug!(drop = %entry.name, "Already handled; skipping");
        return Ok(());
    }

    info!(drop = %entry.name, "Processing drop");
    run_sync(invocation, &drop_path).await?;

    // Recorded only after a successful run, so failures are retried
    ledger.record(key, entry);
    ledger.save(&args.state_file)?;
    info!("Drop handled and recorded");

    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
