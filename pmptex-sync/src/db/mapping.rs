//! Read-only mapping lookups
//!
//! Two lookups feed the run: (idCategoria, idGrupo) -> idTipo when the sheet
//! has no identifier column, and idTipo -> IdConteudo when seeding. The
//! content mapping's table and column names come from configuration, so they
//! are validated as bare identifiers before being interpolated — sqlx can
//! bind values, not identifiers.

use pmptex_common::db::batch::{batched, placeholders, LOOKUP_CHUNK};
use pmptex_common::db::CATEGORY_GROUP_TABLE;
use pmptex_common::{Error, Result};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};

/// Tie-break when one idTipo maps to several content ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickPolicy {
    Min,
    Max,
}

impl PickPolicy {
    fn aggregate(self) -> &'static str {
        match self {
            PickPolicy::Min => "MIN",
            PickPolicy::Max => "MAX",
        }
    }
}

/// Where and how to resolve idTipo -> IdConteudo
#[derive(Debug, Clone)]
pub struct ContentMapConfig {
    pub table: String,
    pub tipo_col: String,
    pub conteudo_col: String,
    pub pick: PickPolicy,
}

impl ContentMapConfig {
    /// Reject table/column names that are not bare SQL identifiers.
    pub fn validate(&self) -> Result<()> {
        for name in [&self.table, &self.tipo_col, &self.conteudo_col] {
            if !is_bare_identifier(name) {
                return Err(Error::Config(format!(
                    "Invalid mapping identifier: '{}'",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Exact-pair lookup table for (idCategoria, idGrupo) -> idTipo, restricted
/// to the category/group sets appearing in the input. Both IN lists are
/// chunked.
pub async fn fetch_category_group_map(
    pool: &SqlitePool,
    categories: &[i64],
    groups: &[i64],
) -> Result<HashMap<(i64, i64), i64>> {
    let mut map = HashMap::new();
    if categories.is_empty() || groups.is_empty() {
        return Ok(map);
    }

    for cat_chunk in categories.chunks(LOOKUP_CHUNK) {
        for group_chunk in groups.chunks(LOOKUP_CHUNK) {
            let sql = format!(
                "SELECT DISTINCT idCategoria, idGrupo, idTipo FROM {} \
                 WHERE idCategoria IN ({}) AND idGrupo IN ({})",
                CATEGORY_GROUP_TABLE,
                placeholders(cat_chunk.len()),
                placeholders(group_chunk.len())
            );

            let mut query = sqlx::query_as::<_, (i64, i64, i64)>(&sql);
            for cat in cat_chunk {
                query = query.bind(cat);
            }
            for group in group_chunk {
                query = query.bind(group);
            }

            for (cat, group, id_tipo) in query.fetch_all(pool).await? {
                map.insert((cat, group), id_tipo);
            }
        }
    }

    Ok(map)
}

/// Resolve idTipo -> IdConteudo for the given identifiers.
///
/// Aggregates with MIN or MAX over the mapping rows sharing an identifier,
/// ignoring null content ids. Identifiers with no mapping row are simply
/// absent from the result.
pub async fn resolve_id_conteudo(
    pool: &SqlitePool,
    config: &ContentMapConfig,
    ids: &[i64],
) -> Result<BTreeMap<i64, i64>> {
    config.validate()?;

    let mut sorted: Vec<i64> = ids.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let sql_template = format!(
        "SELECT {tipo}, {agg}({conteudo}) FROM {table} \
         WHERE {tipo} IN ({{placeholders}}) AND {conteudo} IS NOT NULL \
         GROUP BY {tipo}",
        tipo = config.tipo_col,
        agg = config.pick.aggregate(),
        conteudo = config.conteudo_col,
        table = config.table,
    );

    let pairs = batched(&sorted, LOOKUP_CHUNK, |chunk| {
        let pool = pool.clone();
        let sql = sql_template.replace("{placeholders}", &placeholders(chunk.len()));
        async move {
            let mut query = sqlx::query_as::<_, (i64, i64)>(&sql);
            for id in &chunk {
                query = query.bind(id);
            }
            Ok(query.fetch_all(&pool).await?)
        }
    })
    .await?;

    Ok(pairs.into_iter().collect())
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

    fn default_config(pick: PickPolicy) -> ContentMapConfig {
        ContentMapConfig {
            table: "TEMATICOS_CONTEUDO_ITEM".to_string(),
            tipo_col: "IDTIPO".to_string(),
            conteudo_col: "ID".to_string(),
            pick,
        }
    }

    #[test]
    fn rejects_non_identifier_names() {
        let mut config = default_config(PickPolicy::Min);
        config.table = "bad name; DROP TABLE x".to_string();
        assert!(config.validate().is_err());

        let mut config = default_config(PickPolicy::Min);
        config.conteudo_col = "1ID".to_string();
        assert!(config.validate().is_err());

        assert!(default_config(PickPolicy::Min).validate().is_ok());
    }

    #[tokio::test]
    async fn tie_break_is_deterministic() {
        let pool = pool_with_schema().await;
        for content in [3, 7, 1] {
            sqlx::query("INSERT INTO TEMATICOS_CONTEUDO_ITEM (IDTIPO, ID) VALUES (10, ?)")
                .bind(content)
                .execute(&pool)
                .await
                .unwrap();
        }

        let min = resolve_id_conteudo(&pool, &default_config(PickPolicy::Min), &[10])
            .await
            .unwrap();
        assert_eq!(min.get(&10), Some(&1));

        let max = resolve_id_conteudo(&pool, &default_config(PickPolicy::Max), &[10])
            .await
            .unwrap();
        assert_eq!(max.get(&10), Some(&7));
    }

    #[tokio::test]
    async fn null_content_ids_are_ignored() {
        let pool = pool_with_schema().await;
        sqlx::query("INSERT INTO TEMATICOS_CONTEUDO_ITEM (IDTIPO, ID) VALUES (20, NULL)")
            .execute(&pool)
            .await
            .unwrap();

        let map = resolve_id_conteudo(&pool, &default_config(PickPolicy::Min), &[20])
            .await
            .unwrap();
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn unmatched_ids_are_absent() {
        let pool = pool_with_schema().await;
        sqlx::query("INSERT INTO TEMATICOS_CONTEUDO_ITEM (IDTIPO, ID) VALUES (1, 5)")
            .execute(&pool)
            .await
            .unwrap();

        let map = resolve_id_conteudo(&pool, &default_config(PickPolicy::Min), &[1, 2])
            .await
            .unwrap();
        assert_eq!(map.get(&1), Some(&5));
        assert!(!map.contains_key(&2));
    }

    #[tokio::test]
    async fn category_group_pairs_are_exact() {
        let pool = pool_with_schema().await;
        sqlx::query(
            "INSERT INTO PROCESSADO_BUSCA_TIPOS (idCategoria, idGrupo, idTipo) VALUES (1, 2, 100), (1, 3, 101)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let map = fetch_category_group_map(&pool, &[1], &[2, 3]).await.unwrap();
        assert_eq!(map.get(&(1, 2)), Some(&100));
        assert_eq!(map.get(&(1, 3)), Some(&101));
        assert!(!map.contains_key(&(1, 4)));
    }

    #[tokio::test]
    async fn empty_key_sets_short_circuit() {
        let pool = pool_with_schema().await;
        let map = fetch_category_group_map(&pool, &[], &[1]).await.unwrap();
        assert!(map.is_empty());
    }
}
