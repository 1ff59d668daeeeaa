//! Spreadsheet reading and header normalization
//!
//! Accepts the column-name variations the upstream workflow produces:
//! matching is case-insensitive and diacritic-insensitive, so
//! `Texto Secundario` and `Texto Secundário` land in the same column.
//! Unknown columns are ignored.

use calamine::{open_workbook, Data, Reader, Xlsx};
use pmptex_common::{Error, Result};
use std::path::Path;

use crate::rows::InputRow;

/// Truncation limit for `Texto Title`
pub const TITLE_MAX_CHARS: usize = 80;

/// Truncation limit for `Texto Meta Description`
pub const META_MAX_CHARS: usize = 320;

/// Normalized spreadsheet contents plus which known columns were present
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    pub rows: Vec<InputRow>,
    pub has_id_tipo: bool,
    pub has_id_cat: bool,
    pub has_id_grupo: bool,
    pub has_title: bool,
    pub has_meta_description: bool,
}

/// Known input columns after normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    IdTipo,
    IdCat,
    IdGrupo,
    TextoPrincipal,
    TextoSecundario,
    TextoTitle,
    TextoMetaDescription,
}

/// Read and normalize one worksheet.
pub fn read_sheet(path: &Path, sheet_name: &str) -> Result<SheetTable> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| Error::InvalidInput(format!("Failed to open {}: {}", path.display(), e)))?;

    let range = workbook.worksheet_range(sheet_name).map_err(|e| {
        Error::InvalidInput(format!("Failed to read sheet '{}': {}", sheet_name, e))
    })?;

    let cells: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
    table_from_cells(&cells)
}

/// Build a normalized table from raw cells; the first row is the header.
fn table_from_cells(cells: &[Vec<Data>]) -> Result<SheetTable> {
    let Some(header) = cells.first() else {
        return Ok(SheetTable::default());
    };

    // Map column index -> known column; unknown headers are skipped
    let columns: Vec<(usize, Column)> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, cell)| {
            let name = cell_string(Some(cell))?;
            recognize_header(&name).map(|col| (idx, col))
        })
        .collect();

    let mut table = SheetTable::default();
    for &(_, col) in &columns {
        match col {
            Column::IdTipo => table.has_id_tipo = true,
            Column::IdCat => table.has_id_cat = true,
            Column::IdGrupo => table.has_id_grupo = true,
            Column::TextoTitle => table.has_title = true,
            Column::TextoMetaDescription => table.has_meta_description = true,
            _ => {}
        }
    }

    for (row_idx, row) in cells.iter().enumerate().skip(1) {
        // Skip fully empty rows
        if row
            .iter()
            .all(|c| cell_string(Some(c)).map_or(true, |s| s.trim().is_empty()))
        {
            continue;
        }

        let mut input = InputRow {
            source_row: row_idx, // 1-based data row (header is row 0)
            ..Default::default()
        };

        for &(idx, col) in &columns {
            let cell = row.get(idx);
            match col {
                Column::IdTipo => input.id_tipo = cell_int(cell),
                Column::IdCat => input.id_cat = cell_int(cell),
                Column::IdGrupo => input.id_grupo = cell_int(cell),
                Column::TextoPrincipal => input.texto_principal = cell_string(cell),
                Column::TextoSecundario => input.texto_secundario = cell_string(cell),
                Column::TextoTitle => {
                    input.texto_title =
                        cell_string(cell).map(|s| truncate_chars(&s, TITLE_MAX_CHARS));
                }
                Column::TextoMetaDescription => {
                    input.texto_meta_description =
                        cell_string(cell).map(|s| truncate_chars(&s, META_MAX_CHARS));
                }
            }
        }

        table.rows.push(input);
    }

    Ok(table)
}

/// Match a raw header against the known column set.
fn recognize_header(raw: &str) -> Option<Column> {
    match normalize_header(raw).as_str() {
        "id_tipo" => Some(Column::IdTipo),
        "id_cat" => Some(Column::IdCat),
        "id_grupo" => Some(Column::IdGrupo),
        "texto principal" => Some(Column::TextoPrincipal),
        "texto secundario" => Some(Column::TextoSecundario),
        "texto title" => Some(Column::TextoTitle),
        "texto meta description" => Some(Column::TextoMetaDescription),
        _ => None,
    }
}

/// Lowercase, strip diacritics and collapse whitespace for header matching.
fn normalize_header(raw: &str) -> String {
    let lowered: String = raw
        .chars()
        .flat_map(char::to_lowercase)
        .map(strip_diacritic)
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fold the accented characters the upstream sheets actually contain.
fn strip_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        other => other,
    }
}

/// Truncate to at most `max` characters (not bytes).
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Text content of a cell; empty cells and errors yield None.
fn cell_string(cell: Option<&Data>) -> Option<String> {
    match cell? {
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                Some((*f as i64).to_string())
            } else {
                Some(f.to_string())
            }
        }
        Data::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Integer content of a cell, accepting whole floats and numeric strings.
fn cell_int(cell: Option<&Data>) -> Option<i64> {
    match cell? {
        Data::Int(i) => Some(*i),
        Data::Float(f) if f.fract() == 0.0 => Some(*f as i64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn header_matching_ignores_case_and_accents() {
        assert_eq!(recognize_header("Texto Secundário"), Some(Column::TextoSecundario));
        assert_eq!(recognize_header("Texto Secundario"), Some(Column::TextoSecundario));
        assert_eq!(recognize_header("TEXTO  PRINCIPAL"), Some(Column::TextoPrincipal));
        assert_eq!(recognize_header("id_tipo "), Some(Column::IdTipo));
        assert_eq!(recognize_header("Coluna Desconhecida"), None);
    }

    #[test]
    fn parses_rows_and_flags_columns() {
        let cells = vec![
            vec![s("id_tipo"), s("Texto Principal"), s("Texto Secundário")],
            vec![Data::Int(42), s("A"), s("B")],
            vec![Data::Float(7.0), s("C"), Data::Empty],
        ];

        let table = table_from_cells(&cells).unwrap();
        assert!(table.has_id_tipo);
        assert!(!table.has_id_cat);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].id_tipo, Some(42));
        assert_eq!(table.rows[0].texto_principal.as_deref(), Some("A"));
        assert_eq!(table.rows[1].id_tipo, Some(7));
        assert_eq!(table.rows[1].texto_secundario, None);
    }

    #[test]
    fn skips_fully_empty_rows() {
        let cells = vec![
            vec![s("id_tipo"), s("Texto Principal")],
            vec![Data::Empty, Data::Empty],
            vec![s(" "), s("")],
            vec![Data::Int(1), s("A")],
        ];

        let table = table_from_cells(&cells).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].id_tipo, Some(1));
    }

    #[test]
    fn non_numeric_identifier_stays_unset() {
        let cells = vec![
            vec![s("id_tipo"), s("Texto Principal")],
            vec![s("abc"), s("A")],
        ];

        let table = table_from_cells(&cells).unwrap();
        assert_eq!(table.rows[0].id_tipo, None);
    }

    #[test]
    fn truncates_title_and_meta() {
        let long_title = "x".repeat(100);
        let long_meta = "y".repeat(400);
        let cells = vec![
            vec![s("id_tipo"), s("Texto Title"), s("Texto Meta Description")],
            vec![Data::Int(1), s(&long_title), s(&long_meta)],
        ];

        let table = table_from_cells(&cells).unwrap();
        assert!(table.has_title);
        assert!(table.has_meta_description);
        let row = &table.rows[0];
        assert_eq!(row.texto_title.as_ref().unwrap().chars().count(), TITLE_MAX_CHARS);
        assert_eq!(
            row.texto_meta_description.as_ref().unwrap().chars().count(),
            META_MAX_CHARS
        );
    }

    #[test]
    fn empty_sheet_yields_empty_table() {
        let table = table_from_cells(&[]).unwrap();
        assert!(table.rows.is_empty());
        assert!(!table.has_id_tipo);
    }
}
