//! pmptex-sync - Spreadsheet reconciliation CLI
//!
//! Reads an XLSX drop, reconciles its rows against the PMP text tables and
//! applies updates, optionally seeding base records for identifiers the
//! store does not know yet. Guard aborts end the run cleanly with no writes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pmptex_common::config::resolve_database_path;
use pmptex_common::db::init_store;
use pmptex_sync::db::mapping::{ContentMapConfig, PickPolicy};
use pmptex_sync::reconcile::{self, ReconcileOptions, RunOutcome};
use pmptex_sync::sheet;

/// Tie-break choice exposed on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PickArg {
    Min,
    Max,
}

impl From<PickArg> for PickPolicy {
    fn from(arg: PickArg) -> Self {
        match arg {
            PickArg::Min => PickPolicy::Min,
            PickArg::Max => PickPolicy::Max,
        }
    }
}

/// Command-line arguments for pmptex-sync
#[derive(Parser, Debug)]
#[command(name = "pmptex-sync")]
#[command(about = "Updates the PMP text tables from an XLSX sheet, with optional auto-seed")]
#[command(version)]
struct Args {
    /// Path of the .xlsx input file
    excel_path: PathBuf,

    /// Worksheet name
    #[arg(long, default_value = "Planilha1")]
    sheet: String,

    /// Create base records when an idTipo does not exist yet
    #[arg(long)]
    auto_seed: bool,

    /// Preview the seed plan without writing to the store
    #[arg(long)]
    dry_run: bool,

    /// Maximum seeds allowed per run
    #[arg(long, default_value_t = 50)]
    max_seed: usize,

    /// Abort when missing/input exceeds this ratio (0.0-1.0) and --auto-seed is off
    #[arg(long, default_value_t = 0.35)]
    abort_if_missing_ratio: f64,

    /// Use MIN or MAX of the content id when an idTipo maps to several
    #[arg(long, value_enum, default_value_t = PickArg::Min)]
    pick_idconteudo: PickArg,

    /// Mapping table for idTipo -> IdConteudo
    #[arg(long, default_value = "TEMATICOS_CONTEUDO_ITEM")]
    map_table: String,

    /// idTipo column in the mapping table
    #[arg(long, default_value = "IDTIPO")]
    tipo_col: String,

    /// IdConteudo column in the mapping table
    #[arg(long, default_value = "ID")]
    conteudo_col: String,

    /// Content id used when no mapping row exists
    #[arg(long)]
    default_idconteudo: Option<i64>,

    /// SQLite database path (overrides PMPTEX_DATABASE and the config file)
    #[arg(long)]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pmptex_sync=info,pmptex_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if !args.excel_path.exists() {
        error!("File not found: {}", args.excel_path.display());
        std::process::exit(2);
    }

    let mut table = sheet::read_sheet(&args.excel_path, &args.sheet)
        .with_context(|| format!("Failed to read {}", args.excel_path.display()))?;
    info!(rows = table.rows.len(), sheet = %args.sheet, "Sheet loaded");

    let db_path = resolve_database_path(args.database.as_deref());
    let pool = init_store(&db_path).await.context("Failed to open the store")?;

    let options = ReconcileOptions {
        auto_seed: args.auto_seed,
        dry_run: args.dry_run,
        max_seed: args.max_seed,
        abort_missing_ratio: args.abort_if_missing_ratio,
        content_map: ContentMapConfig {
            table: args.map_table,
            tipo_col: args.tipo_col,
            conteudo_col: args.conteudo_col,
            pick: args.pick_idconteudo.into(),
        },
        default_id_conteudo: args.default_idconteudo,
    };

    let report = reconcile::run(&pool, &options, &mut table).await?;

    match report.outcome {
        RunOutcome::Completed => {
            info!(
                texts_updated = report.texts_updated,
                titles_updated = report.titles_updated,
                seeded = report.seed.created_texts,
                "Run complete"
            );
        }
        RunOutcome::DryRun => {
            info!(
                planned_seeds = report.seed.planned,
                "Dry-run complete; no changes were made"
            );
        }
        RunOutcome::MissingRatioAbort { ratio, threshold } => {
            warn!(
                "Run aborted: {:.0}% of identifiers missing (limit {:.0}%); nothing written",
                ratio * 100.0,
                threshold * 100.0
            );
        }
        RunOutcome::SeedCapAbort { missing, max_seed } => {
            warn!(
                missing,
                max_seed, "Run aborted: seed batch above cap; nothing written"
            );
        }
    }

    Ok(())
}
