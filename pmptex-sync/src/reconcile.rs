//! Reconciliation orchestrator
//!
//! Drives one run end to end: identifier resolution, existence partition,
//! safety guards, optional seeding, and the two independent update passes.
//! Guard aborts are ordinary outcomes with zero writes, not errors; only
//! store and configuration failures propagate as errors.

use pmptex_common::Result;
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::db::mapping::{resolve_id_conteudo, ContentMapConfig};
use crate::db::seed::{seed_missing, SeedReport};
use crate::db::texts::{fetch_existing_id_tipos, update_texts};
use crate::db::titles::update_titles;
use crate::resolve::ensure_id_tipo;
use crate::rows::build_frames;
use crate::sheet::SheetTable;

/// Immutable per-run configuration, fully resolved before the run starts
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Create base records for absent identifiers
    pub auto_seed: bool,
    /// Report intended writes without applying any
    pub dry_run: bool,
    /// Hard cap on the number of identifiers seeded per run
    pub max_seed: usize,
    /// Abort threshold for missing/input when seeding is disabled
    pub abort_missing_ratio: f64,
    /// Where and how to resolve content ids
    pub content_map: ContentMapConfig,
    /// Fallback content id for identifiers the mapping does not cover
    pub default_id_conteudo: Option<i64>,
}

/// How the run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Updates applied to both tables
    Completed,
    /// Partition and seed plan reported, nothing written
    DryRun,
    /// Too many input identifiers absent while seeding is disabled
    MissingRatioAbort { ratio: f64, threshold: f64 },
    /// Seed batch larger than the configured cap
    SeedCapAbort { missing: usize, max_seed: usize },
}

/// Everything a caller needs to log or assert about one run
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Distinct identifiers present in the input
    pub input_ids: usize,
    /// Of those, how many existed before the run
    pub existing: usize,
    /// Of those, how many were absent before the run
    pub missing: usize,
    /// Rows in the texts frame (before existence filtering)
    pub text_rows: usize,
    /// Rows in the titles frame (before existence filtering)
    pub title_rows: usize,
    pub seed: SeedReport,
    pub texts_updated: u64,
    pub titles_updated: u64,
    /// Distinct (id_cat, id_grupo) pairs that resolved to nothing
    pub unresolved_pairs: Vec<(i64, i64)>,
    /// Identifiers that stayed without a content id after the fallback
    pub unmapped_ids: Vec<i64>,
}

/// Run one reconciliation batch over the given sheet.
pub async fn run(
    pool: &SqlitePool,
    options: &ReconcileOptions,
    table: &mut SheetTable,
) -> Result<RunReport> {
    options.content_map.validate()?;

    let resolve_outcome = ensure_id_tipo(pool, table).await?;

    let (mut texts, mut titles) = build_frames(table);
    info!(text_rows = texts.len(), title_rows = titles.len(), "Frames built");

    let ids: Vec<i64> = table
        .rows
        .iter()
        .filter_map(|r| r.id_tipo)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut existing = fetch_existing_id_tipos(pool, &ids).await?;
    let missing: Vec<i64> = ids.iter().copied().filter(|id| !existing.contains(id)).collect();
    info!(
        input_ids = ids.len(),
        existing = existing.len(),
        missing = missing.len(),
        "Existence partition"
    );
    if !missing.is_empty() {
        info!("Missing idTipo (in sheet, absent from store): {:?}", missing);
    }

    let mut report = RunReport {
        outcome: RunOutcome::Completed,
        input_ids: ids.len(),
        existing: existing.len(),
        missing: missing.len(),
        text_rows: texts.len(),
        title_rows: titles.len(),
        seed: SeedReport::default(),
        texts_updated: 0,
        titles_updated: 0,
        unresolved_pairs: resolve_outcome.unresolved_pairs,
        unmapped_ids: Vec::new(),
    };

    // Safety valve, reachable only with seeding disabled: a high missing
    // ratio usually means the wrong sheet was dropped
    if !ids.is_empty() && !options.auto_seed {
        let ratio = missing.len() as f64 / ids.len() as f64;
        if ratio > options.abort_missing_ratio {
            warn!(
                "{:.0}% of input identifiers are absent (limit {:.0}%); aborting with no writes. \
                 Re-run with --auto-seed or raise --abort-if-missing-ratio.",
                ratio * 100.0,
                options.abort_missing_ratio * 100.0
            );
            report.outcome = RunOutcome::MissingRatioAbort {
                ratio,
                threshold: options.abort_missing_ratio,
            };
            return Ok(report);
        }
    }

    if options.auto_seed && !missing.is_empty() {
        // Second safety valve: a mass creation is never what a weekly text
        // drop should trigger
        if missing.len() > options.max_seed {
            warn!(
                missing = missing.len(),
                max_seed = options.max_seed,
                "Seed batch above cap; aborting with no writes"
            );
            report.outcome = RunOutcome::SeedCapAbort {
                missing: missing.len(),
                max_seed: options.max_seed,
            };
            return Ok(report);
        }

        let mut plan = resolve_id_conteudo(pool, &options.content_map, &missing).await?;
        let mut unmapped: Vec<i64> = missing
            .iter()
            .copied()
            .filter(|id| !plan.contains_key(id))
            .collect();
        info!(mapped = plan.len(), unmapped = unmapped.len(), "Content ids resolved");

        if let Some(default) = options.default_id_conteudo {
            if !unmapped.is_empty() {
                info!(
                    default_id_conteudo = default,
                    count = unmapped.len(),
                    "Applying fallback content id"
                );
                for id in unmapped.drain(..) {
                    plan.insert(id, default);
                }
            }
        }
        if !unmapped.is_empty() {
            warn!(
                "idTipo without IdConteudo, excluded from seeding: {:?}",
                &unmapped[..unmapped.len().min(20)]
            );
        }
        report.unmapped_ids = unmapped;

        report.seed = seed_missing(pool, &plan, options.dry_run).await?;
    }

    if options.dry_run {
        info!("Dry-run: stopping before updates");
        report.outcome = RunOutcome::DryRun;
        return Ok(report);
    }

    if options.auto_seed && !missing.is_empty() {
        // Authoritative post-seed set; what actually exists now is what
        // gets updated
        existing = fetch_existing_id_tipos(pool, &ids).await?;
    }

    texts.retain(|row| existing.contains(&row.id_tipo));
    titles.retain(|row| existing.contains(&row.id_tipo));

    report.texts_updated = update_texts(pool, &texts).await?;
    report.titles_updated = update_titles(pool, &titles).await?;
    info!(
        texts_updated = report.texts_updated,
        titles_updated = report.titles_updated,
        "Updates applied"
    );

    Ok(report)
}
