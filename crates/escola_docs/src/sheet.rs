use calamine::{Data, Reader, open_workbook_auto};
use escola_core::{EscolaError, Result};
use std::path::Path;
use tracing::debug;

/// A worksheet loaded as text: the first row of the used range is the header
/// row, every data row is padded to the header width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// Build a table from headers and rows, padding short rows.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Index of the column whose header is exactly `name` (after trimming).
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Rename the header at `idx`.
    pub fn rename_column(&mut self, idx: usize, name: impl Into<String>) {
        if let Some(header) = self.headers.get_mut(idx) {
            *header = name.into();
        }
    }

    /// All values of one column, in row order.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(idx).map(String::as_str).unwrap_or(""))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Sheet names of a workbook, in workbook order. A CSV file has a single
/// sheet named after its file stem.
pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(EscolaError::SpreadsheetNotFound(path.to_path_buf()));
    }
    if is_csv(path) {
        return Ok(vec![csv_sheet_name(path)]);
    }
    let workbook = open_workbook_auto(path)
        .map_err(|e| EscolaError::Spreadsheet(format!("{}: {e}", path.display())))?;
    Ok(workbook.sheet_names())
}

/// Load `sheet_name` from an `.xlsx`/`.xlsm`/`.xls`/`.ods` workbook or a `.csv`
/// file.
pub fn read_sheet(path: &Path, sheet_name: &str) -> Result<SheetTable> {
    if !path.exists() {
        return Err(EscolaError::SpreadsheetNotFound(path.to_path_buf()));
    }
    if is_csv(path) {
        return read_csv(path, sheet_name);
    }

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| EscolaError::Spreadsheet(format!("{}: {e}", path.display())))?;

    let available = workbook.sheet_names();
    if !available.iter().any(|s| s == sheet_name) {
        return Err(EscolaError::SheetNotFound {
            sheet: sheet_name.to_string(),
            available,
        });
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| EscolaError::Spreadsheet(format!("aba '{sheet_name}': {e}")))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());

    let headers = rows.next().unwrap_or_default();
    let rows: Vec<Vec<String>> = rows.collect();
    debug!(
        sheet = sheet_name,
        columns = headers.len(),
        rows = rows.len(),
        "loaded worksheet"
    );

    Ok(SheetTable::new(sheet_name, headers, rows))
}

fn read_csv(path: &Path, sheet_name: &str) -> Result<SheetTable> {
    let name = csv_sheet_name(path);
    if name != sheet_name {
        return Err(EscolaError::SheetNotFound {
            sheet: sheet_name.to_string(),
            available: vec![name],
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| EscolaError::Spreadsheet(format!("{}: {e}", path.display())))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| EscolaError::Spreadsheet(format!("cabeçalho CSV: {e}")))?
        .iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| EscolaError::Spreadsheet(format!("linha CSV: {e}")))?;
        rows.push(record.iter().map(String::from).collect());
    }

    Ok(SheetTable::new(name, headers, rows))
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn csv_sheet_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Text of a single cell. Integral floats drop the `.0` so that a grade
/// typed as the number 6 reads as `"6"`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn write_workbook(path: &Path) {
        let mut workbook = Workbook::new();

        let sheet = workbook.add_worksheet();
        sheet.set_name("Matemática").unwrap();
        sheet.write_string(0, 0, "ANO/SÉRIE").unwrap();
        sheet.write_string(0, 1, "BIMESTRE").unwrap();
        sheet.write_string(0, 2, "TÍTULO DA AULA").unwrap();
        sheet.write_number(1, 0, 6.0).unwrap();
        sheet.write_number(1, 1, 1.5).unwrap();
        sheet.write_string(1, 2, "Frações").unwrap();
        sheet.write_string(2, 0, "7º ano").unwrap();

        let other = workbook.add_worksheet();
        other.set_name("Física").unwrap();
        other.write_string(0, 0, "X").unwrap();

        workbook.save(path).unwrap();
    }

    #[test]
    fn test_read_xlsx_sheet() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("escopo.xlsx");
        write_workbook(&path);

        let table = read_sheet(&path, "Matemática").unwrap();
        assert_eq!(table.headers, vec!["ANO/SÉRIE", "BIMESTRE", "TÍTULO DA AULA"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["6", "1.5", "Frações"]);
        // Short row padded to header width
        assert_eq!(table.rows[1], vec!["7º ano", "", ""]);
    }

    #[test]
    fn test_sheet_names_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("escopo.xlsx");
        write_workbook(&path);

        assert_eq!(sheet_names(&path).unwrap(), vec!["Matemática", "Física"]);
    }

    #[test]
    fn test_unknown_sheet_lists_available() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("escopo.xlsx");
        write_workbook(&path);

        match read_sheet(&path, "Química") {
            Err(EscolaError::SheetNotFound { sheet, available }) => {
                assert_eq!(sheet, "Química");
                assert_eq!(available, vec!["Matemática", "Física"]);
            }
            other => panic!("expected SheetNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = read_sheet(Path::new("/nonexistent/escopo.xlsx"), "A").unwrap_err();
        assert!(matches!(err, EscolaError::SpreadsheetNotFound(_)));
    }

    #[test]
    fn test_read_csv_as_single_sheet() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Geografia.csv");
        std::fs::write(&path, "Ano,Bimestre,Titulo\n6,1,\"Relevo, clima\"\n7\n").unwrap();

        let table = read_sheet(&path, "Geografia").unwrap();
        assert_eq!(table.headers, vec!["Ano", "Bimestre", "Titulo"]);
        assert_eq!(table.rows[0][2], "Relevo, clima");
        assert_eq!(table.rows[1], vec!["7", "", ""]);

        assert!(matches!(
            read_sheet(&path, "História"),
            Err(EscolaError::SheetNotFound { .. })
        ));
    }

    #[test]
    fn test_table_column_helpers() {
        let mut table = SheetTable::new(
            "t",
            vec!["A".into(), " B ".into()],
            vec![vec!["1".into(), "x".into()], vec!["2".into()]],
        );
        assert_eq!(table.column("B"), Some(1));
        table.rename_column(1, "Bimestre");
        assert_eq!(table.column("Bimestre"), Some(1));
        let values: Vec<&str> = table.column_values(1).collect();
        assert_eq!(values, vec!["x", ""]);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_cell_text_formats_numbers() {
        assert_eq!(cell_text(&Data::Float(6.0)), "6");
        assert_eq!(cell_text(&Data::Float(2.25)), "2.25");
        assert_eq!(cell_text(&Data::Int(3)), "3");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
