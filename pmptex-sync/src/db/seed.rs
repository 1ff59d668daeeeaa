//! Seeding of base records for absent identifiers
//!
//! Creates minimal rows in both target tables so subsequent updates have a
//! row to target: empty text placeholders, Ativo=1, the resolved content id.
//! The whole batch runs inside one transaction; any failure rolls everything
//! back. Existence is re-checked per row at write time, so re-running a seed
//! for an identifier that already has records is a no-op.

use pmptex_common::db::{TEXTS_TABLE, TITLES_TABLE};
use pmptex_common::Result;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::info;

/// How many planned pairs the dry-run preview logs
const PREVIEW_LIMIT: usize = 20;

/// Outcome of a seed invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Pairs in the seed plan (dry-run and live)
    pub planned: usize,
    /// Rows actually inserted into the texts table
    pub created_texts: u64,
    /// Rows actually inserted into the titles table
    pub created_titles: u64,
    pub dry_run: bool,
}

/// Seed base records for every (idTipo, IdConteudo) pair.
///
/// Dry-run performs no writes and only reports what would be created.
pub async fn seed_missing(
    pool: &SqlitePool,
    plan: &BTreeMap<i64, i64>,
    dry_run: bool,
) -> Result<SeedReport> {
    if plan.is_empty() {
        return Ok(SeedReport::default());
    }

    if dry_run {
        info!(
            planned = plan.len(),
            "[dry-run] seed plan for {} and {}", TEXTS_TABLE, TITLES_TABLE
        );
        for (id_tipo, id_conteudo) in plan.iter().take(PREVIEW_LIMIT) {
            info!("[dry-run] idTipo={} IdConteudo={}", id_tipo, id_conteudo);
        }
        if plan.len() > PREVIEW_LIMIT {
            info!("[dry-run] ... {} more", plan.len() - PREVIEW_LIMIT);
        }
        return Ok(SeedReport {
            planned: plan.len(),
            dry_run: true,
            ..SeedReport::default()
        });
    }

    let insert_text = format!(
        "INSERT INTO {t} (idTipo, TextoPrimario, TextoSecundario, Ativo, IdConteudo, Header) \
         SELECT ?, '', '', 1, ?, NULL \
         WHERE NOT EXISTS (SELECT 1 FROM {t} WHERE idTipo = ?)",
        t = TEXTS_TABLE
    );
    let insert_title = format!(
        "INSERT INTO {t} (idTipo, TextoTitle, TextoMetaDescription, Ativo, IdConteudo) \
         SELECT ?, '', '', 1, ? \
         WHERE NOT EXISTS (SELECT 1 FROM {t} WHERE idTipo = ?)",
        t = TITLES_TABLE
    );

    let mut report = SeedReport {
        planned: plan.len(),
        ..SeedReport::default()
    };

    let mut tx = pool.begin().await?;
    for (&id_tipo, &id_conteudo) in plan {
        let result = sqlx::query(&insert_text)
            .bind(id_tipo)
            .bind(id_conteudo)
            .bind(id_tipo)
            .execute(&mut *tx)
            .await?;
        report.created_texts += result.rows_affected();

        let result = sqlx::query(&insert_title)
            .bind(id_tipo)
            .bind(id_conteudo)
            .bind(id_tipo)
            .execute(&mut *tx)
            .await?;
        report.created_titles += result.rows_affected();
    }
    tx.commit().await?;

    info!(
        created_texts = report.created_texts,
        created_titles = report.created_titles,
        "Seed committed"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmptex_common::db::create_target_tables;

    async fn pool_with_schema() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_target_tables(&pool).await.unwrap();
        pool
    }

    fn plan(pairs: &[(i64, i64)]) -> BTreeMap<i64, i64> {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn seeds_both_tables_with_placeholders() {
        let pool = pool_with_schema().await;
        let report = seed_missing(&pool, &plan(&[(99, 5)]), false).await.unwrap();
        assert_eq!(report.created_texts, 1);
        assert_eq!(report.created_titles, 1);

        let (primario, ativo, conteudo): (Option<String>, i64, Option<i64>) = sqlx::query_as(
            "SELECT TextoPrimario, Ativo, IdConteudo FROM PUB_TIPOS_TEXTOS WHERE idTipo = 99",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(primario.as_deref(), Some(""));
        assert_eq!(ativo, 1);
        assert_eq!(conteudo, Some(5));

        let titles: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM PUB_TIPOS_TEXTOS_TITULOS WHERE idTipo = 99")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(titles, 1);
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let pool = pool_with_schema().await;
        let the_plan = plan(&[(1, 2), (3, 4)]);

        let first = seed_missing(&pool, &the_plan, false).await.unwrap();
        assert_eq!(first.created_texts, 2);

        let second = seed_missing(&pool, &the_plan, false).await.unwrap();
        assert_eq!(second.created_texts, 0);
        assert_eq!(second.created_titles, 0);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM PUB_TIPOS_TEXTOS")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn existing_record_is_left_untouched() {
        let pool = pool_with_schema().await;
        sqlx::query(
            "INSERT INTO PUB_TIPOS_TEXTOS (idTipo, TextoPrimario, IdConteudo) VALUES (7, 'keep', 42)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let report = seed_missing(&pool, &plan(&[(7, 1)]), false).await.unwrap();
        assert_eq!(report.created_texts, 0);
        // Title row did not exist yet, so that side seeds
        assert_eq!(report.created_titles, 1);

        let primario: Option<String> =
            sqlx::query_scalar("SELECT TextoPrimario FROM PUB_TIPOS_TEXTOS WHERE idTipo = 7")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(primario.as_deref(), Some("keep"));
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let pool = pool_with_schema().await;
        let report = seed_missing(&pool, &plan(&[(1, 1), (2, 2)]), true).await.unwrap();
        assert!(report.dry_run);
        assert_eq!(report.planned, 2);
        assert_eq!(report.created_texts, 0);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM PUB_TIPOS_TEXTOS")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn empty_plan_is_a_no_op() {
        let pool = pool_with_schema().await;
        let report = seed_missing(&pool, &BTreeMap::new(), false).await.unwrap();
        assert_eq!(report, SeedReport::default());
    }
}
