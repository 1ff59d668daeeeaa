//! Identifier resolution for sheets that carry (id_cat, id_grupo) pairs
//! instead of idTipo

use pmptex_common::{Error, Result};
use sqlx::SqlitePool;
use std::collections::{BTreeSet, HashSet};
use tracing::warn;

use crate::db::mapping::fetch_category_group_map;
use crate::sheet::SheetTable;

/// How many unresolved pairs the diagnostic lists
const REPORT_LIMIT: usize = 20;

/// What identifier resolution found
#[derive(Debug, Clone, Default)]
pub struct ResolveOutcome {
    /// Rows that received an idTipo from the pair lookup
    pub resolved: usize,
    /// Distinct (id_cat, id_grupo) pairs with no mapping, in input order
    pub unresolved_pairs: Vec<(i64, i64)>,
    /// Rows lacking a numeric pair entirely
    pub unkeyed_rows: usize,
}

/// Make sure every row that can carry an idTipo does.
///
/// No-op when the sheet already has the identifier column. Otherwise both
/// pair columns must be present with at least one numeric value each;
/// unresolved rows keep `id_tipo = None` and are reported, never dropped.
pub async fn ensure_id_tipo(pool: &SqlitePool, table: &mut SheetTable) -> Result<ResolveOutcome> {
    if table.has_id_tipo {
        return Ok(ResolveOutcome::default());
    }

    if !(table.has_id_cat && table.has_id_grupo) {
        return Err(Error::Config(
            "Input must carry 'id_tipo' or both 'id_cat' and 'id_grupo'".to_string(),
        ));
    }

    let categories: BTreeSet<i64> = table.rows.iter().filter_map(|r| r.id_cat).collect();
    let groups: BTreeSet<i64> = table.rows.iter().filter_map(|r| r.id_grupo).collect();
    if categories.is_empty() || groups.is_empty() {
        return Err(Error::Config(
            "Columns 'id_cat' and 'id_grupo' have no numeric values to resolve id_tipo".to_string(),
        ));
    }

    let categories: Vec<i64> = categories.into_iter().collect();
    let groups: Vec<i64> = groups.into_iter().collect();
    let map = fetch_category_group_map(pool, &categories, &groups).await?;

    let mut outcome = ResolveOutcome::default();
    let mut seen: HashSet<(i64, i64)> = HashSet::new();
    for row in &mut table.rows {
        match (row.id_cat, row.id_grupo) {
            (Some(cat), Some(group)) => match map.get(&(cat, group)) {
                Some(&id_tipo) => {
                    row.id_tipo = Some(id_tipo);
                    outcome.resolved += 1;
                }
                None => {
                    if seen.insert((cat, group)) {
                        outcome.unresolved_pairs.push((cat, group));
                    }
                }
            },
            _ => outcome.unkeyed_rows += 1,
        }
    }

    if !outcome.unresolved_pairs.is_empty() {
        let shown = &outcome.unresolved_pairs[..outcome.unresolved_pairs.len().min(REPORT_LIMIT)];
        warn!(
            unresolved = outcome.unresolved_pairs.len(),
            "id_cat/id_grupo pairs without idTipo (showing up to {}): {:?}",
            REPORT_LIMIT,
            shown
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::InputRow;
    use pmptex_common::db::create_target_tables;

    async fn pool_with_schema() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_target_tables(&pool).await.unwrap();
        pool
    }

    fn pair_row(source_row: usize, cat: Option<i64>, group: Option<i64>) -> InputRow {
        InputRow {
            source_row,
            id_cat: cat,
            id_grupo: group,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn resolves_pairs_and_reports_unresolved() {
        let pool = pool_with_schema().await;
        sqlx::query(
            "INSERT INTO PROCESSADO_BUSCA_TIPOS (idCategoria, idGrupo, idTipo) VALUES (1, 2, 100)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let mut table = SheetTable {
            rows: vec![
                pair_row(1, Some(1), Some(2)),
                pair_row(2, Some(9), Some(9)),
                pair_row(3, Some(9), Some(9)),
                pair_row(4, None, Some(2)),
            ],
            has_id_cat: true,
            has_id_grupo: true,
            ..Default::default()
        };

        let outcome = ensure_id_tipo(&pool, &mut table).await.unwrap();
        assert_eq!(outcome.resolved, 1);
        assert_eq!(outcome.unresolved_pairs, vec![(9, 9)]);
        assert_eq!(outcome.unkeyed_rows, 1);

        assert_eq!(table.rows[0].id_tipo, Some(100));
        assert_eq!(table.rows[1].id_tipo, None);
        assert_eq!(table.rows[3].id_tipo, None);
    }

    #[tokio::test]
    async fn no_op_when_identifier_column_present() {
        let pool = pool_with_schema().await;
        let mut table = SheetTable {
            rows: vec![InputRow {
                source_row: 1,
                id_tipo: Some(7),
                ..Default::default()
            }],
            has_id_tipo: true,
            ..Default::default()
        };

        let outcome = ensure_id_tipo(&pool, &mut table).await.unwrap();
        assert_eq!(outcome.resolved, 0);
        assert_eq!(table.rows[0].id_tipo, Some(7));
    }

    #[tokio::test]
    async fn missing_pair_columns_is_a_configuration_error() {
        let pool = pool_with_schema().await;
        let mut table = SheetTable {
            rows: vec![pair_row(1, Some(1), None)],
            has_id_cat: true,
            has_id_grupo: false,
            ..Default::default()
        };

        let err = ensure_id_tipo(&pool, &mut table).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn pair_columns_without_numeric_values_are_rejected() {
        let pool = pool_with_schema().await;
        let mut table = SheetTable {
            rows: vec![pair_row(1, None, None)],
            has_id_cat: true,
            has_id_grupo: true,
            ..Default::default()
        };

        let err = ensure_id_tipo(&pool, &mut table).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
