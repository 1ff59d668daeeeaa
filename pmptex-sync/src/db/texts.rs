//! PUB_TIPOS_TEXTOS operations: existence partition and text updates

use pmptex_common::db::batch::{batched, placeholders, LOOKUP_CHUNK};
use pmptex_common::db::TEXTS_TABLE;
use pmptex_common::Result;
use sqlx::SqlitePool;
use std::collections::HashSet;

use crate::rows::TextRow;

/// Which of `ids` already have a canonical record.
///
/// Chunked IN-list lookup; an empty input returns an empty set without
/// touching the store. Read-only.
pub async fn fetch_existing_id_tipos(pool: &SqlitePool, ids: &[i64]) -> Result<HashSet<i64>> {
    let found = batched(ids, LOOKUP_CHUNK, |chunk| {
        let pool = pool.clone();
        let sql = format!(
            "SELECT idTipo FROM {} WHERE idTipo IN ({})",
            TEXTS_TABLE,
            placeholders(chunk.len())
        );
        async move {
            let mut query = sqlx::query_scalar::<_, i64>(&sql);
            for id in &chunk {
                query = query.bind(id);
            }
            Ok(query.fetch_all(&pool).await?)
        }
    })
    .await?;

    Ok(found.into_iter().collect())
}

/// Apply the text frame: one UPDATE per row, forcing Ativo=1.
///
/// Null input text maps to SQL NULL (updates may legitimately clear a
/// field). Returns the summed affected-row count; an identifier matching
/// zero rows just contributes 0. Fail-fast: the first store error aborts
/// the remaining updates.
pub async fn update_texts(pool: &SqlitePool, rows: &[TextRow]) -> Result<u64> {
    let sql = format!(
        "UPDATE {} SET TextoPrimario = ?, TextoSecundario = ?, Ativo = 1 WHERE idTipo = ?",
        TEXTS_TABLE
    );

    let mut updated = 0u64;
    for row in rows {
        let result = sqlx::query(&sql)
            .bind(row.texto_primario.as_deref())
            .bind(row.texto_secundario.as_deref())
            .bind(row.id_tipo)
            .execute(pool)
            .await?;
        updated += result.rows_affected();
    }

    Ok(updated)
}
