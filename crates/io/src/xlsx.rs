// Excel workbook adapters
//
// Read: any workbook calamine opens (xlsx, xlsm, xls, xlsb, ods).
// Write: a new xlsx built with rust_xlsxwriter. Macros, formatting and
//        sheets the run did not produce are not carried over.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use emendas_engine::{CellValue, EmendasError, Result, Table, TableSink, TableSource};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet};

/// Worksheet that receives the last status message. The macro-enabled
/// workbooks this tool replaces kept their status cell there.
pub const STATUS_SHEET: &str = "Sheet1";

/// Maximum worksheet name length accepted by Excel.
const MAX_SHEET_NAME: usize = 31;

pub struct XlsxSource {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl XlsxSource {
    pub fn open(path: &Path) -> Result<Self> {
        let workbook = open_workbook_auto(path)
            .map_err(|e| EmendasError::Io(format!("failed to open {}: {}", path.display(), e)))?;
        log::debug!("opened {} ({} sheet(s))", path.display(), workbook.sheet_names().len());
        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }
}

impl TableSource for XlsxSource {
    /// The worksheet's used range; its first row is the header.
    fn read_table(&mut self, name: &str) -> Result<Table> {
        if !self.workbook.sheet_names().iter().any(|s| s == name) {
            return Err(EmendasError::Io(format!(
                "{}: no worksheet named '{}'",
                self.path.display(),
                name
            )));
        }

        let range = self
            .workbook
            .worksheet_range(name)
            .map_err(|e| EmendasError::Io(format!("failed to read sheet '{}': {}", name, e)))?;

        let mut rows = range.rows();
        let header = rows.next().ok_or_else(|| EmendasError::MalformedTable {
            table: name.to_string(),
            reason: "worksheet is empty".into(),
        })?;

        let mut table = Table::new(header.iter().map(|d| cell_from_data(d).raw_display()).collect());
        for row in rows {
            table.push_row(row.iter().map(cell_from_data).collect());
        }

        log::debug!("{}: read {} row(s) x {} column(s)", name, table.len(), table.width());
        Ok(table)
    }
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.into()),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
        // Serial number, as the sheet's formulas would see it
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Collects written tables and saves them as one xlsx on [`XlsxSink::finish`].
/// Dropping the sink without finishing writes nothing.
pub struct XlsxSink {
    path: PathBuf,
    tables: Vec<(String, Table)>,
    status: Option<String>,
}

impl XlsxSink {
    pub fn create(path: &Path) -> Result<Self> {
        let is_xlsx = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
        if !is_xlsx {
            return Err(EmendasError::Io(format!(
                "{}: workbook output must be an .xlsx file",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            tables: Vec::new(),
            status: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save the buffered tables, in write order, followed by the status sheet.
    pub fn finish(self) -> Result<()> {
        if self.tables.is_empty() {
            log::warn!("{}: nothing to save", self.path.display());
            return Ok(());
        }

        let mut workbook = XlsxWorkbook::new();
        let header_format = Format::new().set_bold();

        for (name, table) in &self.tables {
            let worksheet = workbook
                .add_worksheet()
                .set_name(name)
                .map_err(|e| EmendasError::Io(format!("failed to create sheet '{}': {}", name, e)))?;
            write_sheet(worksheet, table, &header_format)
                .map_err(|e| EmendasError::Io(format!("failed to write sheet '{}': {}", name, e)))?;
        }

        if let Some(status) = &self.status {
            if self.tables.iter().any(|(name, _)| name == STATUS_SHEET) {
                log::warn!("status sheet '{STATUS_SHEET}' collides with a table; status not saved");
            } else {
                workbook
                    .add_worksheet()
                    .set_name(STATUS_SHEET)
                    .and_then(|ws| ws.write_string(0, 0, status))
                    .map_err(|e| EmendasError::Io(format!("failed to write status: {}", e)))?;
            }
        }

        workbook
            .save(&self.path)
            .map_err(|e| EmendasError::Io(format!("failed to save {}: {}", self.path.display(), e)))?;
        log::info!("saved {} sheet(s) to {}", self.tables.len(), self.path.display());
        Ok(())
    }
}

impl TableSink for XlsxSink {
    fn write_table(&mut self, name: &str, table: &Table) -> Result<()> {
        if name.is_empty() || name.chars().count() > MAX_SHEET_NAME {
            return Err(EmendasError::Io(format!(
                "'{name}' is not a valid worksheet name (1 to {MAX_SHEET_NAME} characters)"
            )));
        }
        match self.tables.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = table.clone(),
            None => self.tables.push((name.to_string(), table.clone())),
        }
        Ok(())
    }

    fn notify(&mut self, message: &str) -> Result<()> {
        log::info!("status: {message}");
        self.status = Some(message.to_string());
        Ok(())
    }
}

fn write_sheet(
    worksheet: &mut Worksheet,
    table: &Table,
    header_format: &Format,
) -> std::result::Result<(), rust_xlsxwriter::XlsxError> {
    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, header_format)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row32 = (row_idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col16 = col as u16;
            match cell {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    worksheet.write_string(row32, col16, s)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(row32, col16, *n)?;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Table {
        Table::from_rows(
            vec!["Emenda".into(), "Funcional".into(), "Tem parcela impositiva?".into()],
            vec![
                vec![CellValue::Number(101.0), CellValue::Text("10.302.5018.7001".into()), CellValue::Text("-".into())],
                vec![CellValue::Empty, CellValue::Empty, CellValue::Number(50.25)],
            ],
        )
    }

    #[test]
    fn test_sink_saves_and_source_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("resultado.xlsx");

        let mut sink = XlsxSink::create(&path).unwrap();
        sink.write_table("Relator", &sample()).unwrap();
        sink.notify("processing started").unwrap();
        sink.notify("completed successfully").unwrap();
        sink.finish().unwrap();

        let mut source = XlsxSource::open(&path).unwrap();
        assert_eq!(source.sheet_names(), vec!["Relator", STATUS_SHEET]);

        let table = source.read_table("Relator").unwrap();
        assert_eq!(table.columns, sample().columns);
        assert_eq!(table.rows[0][0], CellValue::Number(101.0));
        assert_eq!(table.rows[0][2], CellValue::Text("-".into()));
        assert_eq!(table.rows[1][2], CellValue::Number(50.25));

        let status = source.read_table(STATUS_SHEET).unwrap();
        assert_eq!(status.columns, vec!["completed successfully"]);
    }

    #[test]
    fn test_rewrite_replaces_buffered_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let mut sink = XlsxSink::create(&path).unwrap();
        sink.write_table("Relator", &Table::new(vec!["old".into()])).unwrap();
        sink.write_table("Relator", &sample()).unwrap();
        assert_eq!(sink.tables.len(), 1);
        assert_eq!(sink.tables[0].1.columns[0], "Emenda");
    }

    #[test]
    fn test_unfinished_sink_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let mut sink = XlsxSink::create(&path).unwrap();
        sink.write_table("Relator", &sample()).unwrap();
        drop(sink);
        assert!(!path.exists());
    }

    #[test]
    fn test_finish_without_tables_saves_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let mut sink = XlsxSink::create(&path).unwrap();
        sink.notify("processing failed").unwrap();
        sink.finish().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_output_must_be_xlsx() {
        let err = XlsxSink::create(Path::new("out.xlsm")).err().unwrap();
        assert!(matches!(err, EmendasError::Io(_)));
    }

    #[test]
    fn test_sheet_name_too_long() {
        let mut sink = XlsxSink::create(Path::new("out.xlsx")).unwrap();
        let err = sink.write_table(&"x".repeat(32), &sample()).unwrap_err();
        assert!(matches!(err, EmendasError::Io(_)));
        // Excel's limit is in characters, not bytes.
        sink.write_table("Relator - Coletivas Apropriação", &sample()).unwrap();
    }

    #[test]
    fn test_missing_worksheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.xlsx");
        let mut sink = XlsxSink::create(&path).unwrap();
        sink.write_table("Relator", &sample()).unwrap();
        sink.finish().unwrap();

        let err = XlsxSource::open(&path).unwrap().read_table("Bancada").unwrap_err();
        assert!(err.to_string().contains("no worksheet named 'Bancada'"));
    }

    #[test]
    fn test_data_conversion() {
        assert_eq!(cell_from_data(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(cell_from_data(&Data::String("  ".into())), CellValue::Empty);
        assert_eq!(cell_from_data(&Data::Bool(true)), CellValue::Text("TRUE".into()));
    }
}
