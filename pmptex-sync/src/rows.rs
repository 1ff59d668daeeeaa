//! Input rows and per-table update frames

use crate::sheet::SheetTable;

/// One spreadsheet row after header normalization.
///
/// `source_row` is the 1-based position in the sheet (header excluded),
/// used only for diagnostics. Rows are never persisted as-is.
#[derive(Debug, Clone, Default)]
pub struct InputRow {
    pub source_row: usize,
    pub id_tipo: Option<i64>,
    pub id_cat: Option<i64>,
    pub id_grupo: Option<i64>,
    pub texto_principal: Option<String>,
    pub texto_secundario: Option<String>,
    pub texto_title: Option<String>,
    pub texto_meta_description: Option<String>,
}

/// Update frame for PUB_TIPOS_TEXTOS
#[derive(Debug, Clone, PartialEq)]
pub struct TextRow {
    pub id_tipo: i64,
    pub texto_primario: Option<String>,
    pub texto_secundario: Option<String>,
}

/// Update frame for PUB_TIPOS_TEXTOS_TITULOS
#[derive(Debug, Clone, PartialEq)]
pub struct TitleRow {
    pub id_tipo: i64,
    pub texto_title: Option<String>,
    pub texto_meta_description: Option<String>,
}

/// Build the two per-table update frames from the normalized sheet.
///
/// Rows without a numeric identifier are excluded from both frames (they are
/// reported upstream by the resolver, never written). The title frame is
/// built only when the sheet carries at least one of the title columns.
pub fn build_frames(table: &SheetTable) -> (Vec<TextRow>, Vec<TitleRow>) {
    let texts: Vec<TextRow> = table
        .rows
        .iter()
        .filter_map(|row| {
            row.id_tipo.map(|id_tipo| TextRow {
                id_tipo,
                texto_primario: row.texto_principal.clone(),
                texto_secundario: row.texto_secundario.clone(),
            })
        })
        .collect();

    let titles: Vec<TitleRow> = if table.has_title || table.has_meta_description {
        table
            .rows
            .iter()
            .filter_map(|row| {
                row.id_tipo.map(|id_tipo| TitleRow {
                    id_tipo,
                    texto_title: row.texto_title.clone(),
                    texto_meta_description: row.texto_meta_description.clone(),
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    (texts, titles)
}
