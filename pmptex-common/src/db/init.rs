//! Database initialization
//!
//! Opens (or creates) the SQLite store and bootstraps the target tables.
//! All DDL is `CREATE TABLE IF NOT EXISTS`, safe to run on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open the store and make sure the target schema exists.
///
/// The pool is capped at one connection: every statement of a run goes over
/// the same connection, in sequence.
pub async fn init_store(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    create_target_tables(&pool).await?;

    Ok(pool)
}

/// Create the target and mapping tables if they don't exist.
///
/// Text columns default to empty strings so newly seeded records are never
/// null; the columns stay nullable because updates may legitimately clear a
/// field back to NULL.
pub async fn create_target_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS PUB_TIPOS_TEXTOS (
            idTipo INTEGER PRIMARY KEY,
            TextoPrimario TEXT DEFAULT '',
            TextoSecundario TEXT DEFAULT '',
            Ativo INTEGER NOT NULL DEFAULT 1,
            IdConteudo INTEGER,
            Header TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS PUB_TIPOS_TEXTOS_TITULOS (
            idTipo INTEGER PRIMARY KEY,
            TextoTitle TEXT DEFAULT '',
            TextoMetaDescription TEXT DEFAULT '',
            Ativo INTEGER NOT NULL DEFAULT 1,
            IdConteudo INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS PROCESSADO_BUSCA_TIPOS (
            idCategoria INTEGER NOT NULL,
            idGrupo INTEGER NOT NULL,
            idTipo INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS TEMATICOS_CONTEUDO_ITEM (
            IDTIPO INTEGER NOT NULL,
            ID INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
