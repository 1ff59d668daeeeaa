//! PUB_TIPOS_TEXTOS_TITULOS operations: title/meta updates

use pmptex_common::db::TITLES_TABLE;
use pmptex_common::Result;
use sqlx::SqlitePool;

use crate::rows::TitleRow;

/// Apply the title frame: one UPDATE per row, forcing Ativo=1.
///
/// Same contract as the texts pass: nulls pass through, affected rows are
/// summed, the first store error aborts the remaining updates of this table
/// (and only this table).
pub async fn update_titles(pool: &SqlitePool, rows: &[TitleRow]) -> Result<u64> {
    let sql = format!(
        "UPDATE {} SET TextoTitle = ?, TextoMetaDescription = ?, Ativo = 1 WHERE idTipo = ?",
        TITLES_TABLE
    );

    let mut updated = 0u64;
    for row in rows {
        let result = sqlx::query(&sql)
            .bind(row.texto_title.as_deref())
            .bind(row.texto_meta_description.as_deref())
            .bind(row.id_tipo)
            .execute(pool)
            .await?;
        updated += result.rows_affected();
    }

    Ok(updated)
}
