//! Database access shared by the pmptex binaries
//!
//! One SQLite pool capped at a single connection: a reconciliation run issues
//! every statement sequentially over the same connection, so a larger pool
//! would only hide ordering bugs.

pub mod batch;
pub mod init;

pub use init::{create_target_tables, init_store};

/// Target table: canonical text records, keyed by idTipo
pub const TEXTS_TABLE: &str = "PUB_TIPOS_TEXTOS";

/// Target table: title/meta-description records, keyed by idTipo
pub const TITLES_TABLE: &str = "PUB_TIPOS_TEXTOS_TITULOS";

/// Read-only mapping (idCategoria, idGrupo) -> idTipo
pub const CATEGORY_GROUP_TABLE: &str = "PROCESSADO_BUSCA_TIPOS";

/// Default read-only mapping idTipo -> IdConteudo (name is configurable)
pub const DEFAULT_CONTENT_MAP_TABLE: &str = "TEMATICOS_CONTEUDO_ITEM";
