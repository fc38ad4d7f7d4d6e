// Table adapters for the emendas engine

pub mod csv;
pub mod xlsx;

use std::path::Path;

use emendas_engine::{Result, Table, TableSink, TableSource};

pub use crate::csv::CsvDir;
pub use crate::xlsx::{XlsxSink, XlsxSource};

/// Extensions opened as workbooks; anything else is a CSV directory.
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| WORKBOOK_EXTENSIONS.iter().any(|w| w.eq_ignore_ascii_case(ext)))
}

/// Open `path` as a table source: a workbook file or a directory of CSVs.
pub fn open_source(path: &Path) -> Result<Box<dyn TableSource>> {
    if is_workbook(path) {
        Ok(Box::new(XlsxSource::open(path)?))
    } else {
        Ok(Box::new(CsvDir::new(path)))
    }
}

/// Destination of a run. Workbook output is only saved by [`Output::finish`].
pub enum Output {
    Csv(CsvDir),
    Xlsx(XlsxSink),
}

impl Output {
    pub fn create(path: &Path) -> Result<Self> {
        if is_workbook(path) {
            Ok(Output::Xlsx(XlsxSink::create(path)?))
        } else {
            Ok(Output::Csv(CsvDir::new(path)))
        }
    }

    pub fn finish(self) -> Result<()> {
        match self {
            Output::Csv(_) => Ok(()),
            Output::Xlsx(sink) => sink.finish(),
        }
    }
}

impl TableSink for Output {
    fn write_table(&mut self, name: &str, table: &Table) -> Result<()> {
        match self {
            Output::Csv(dir) => dir.write_table(name, table),
            Output::Xlsx(sink) => sink.write_table(name, table),
        }
    }

    fn notify(&mut self, message: &str) -> Result<()> {
        match self {
            Output::Csv(dir) => dir.notify(message),
            Output::Xlsx(sink) => sink.notify(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_workbook_detection() {
        assert!(is_workbook(Path::new("processaemendas.xlsm")));
        assert!(is_workbook(Path::new("LOA.XLSX")));
        assert!(is_workbook(Path::new("dados.ods")));
        assert!(!is_workbook(Path::new("entrada")));
        assert!(!is_workbook(Path::new("entrada/relator.csv")));
    }

    #[test]
    fn test_output_kind() {
        assert!(matches!(Output::create(&PathBuf::from("saida")), Ok(Output::Csv(_))));
        assert!(matches!(Output::create(&PathBuf::from("saida.xlsx")), Ok(Output::Xlsx(_))));
        assert!(Output::create(&PathBuf::from("saida.xls")).is_err());
    }
}
