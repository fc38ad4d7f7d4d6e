// CSV directory adapter: one `<name>.csv` file per table

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use emendas_engine::{CellValue, EmendasError, Result, Table, TableSink, TableSource};

/// Delimiter used when writing. Commas are the decimal separator in pt-BR
/// exports, so the semicolon is what spreadsheets there expect.
pub const WRITE_DELIMITER: u8 = b';';

/// A directory of CSV files, one per table. Works as source and as sink.
#[derive(Debug, Clone)]
pub struct CsvDir {
    dir: PathBuf,
    /// Status messages received through `notify`, in order.
    pub notifications: Vec<String>,
}

impl CsvDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            notifications: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn table_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }
}

impl TableSource for CsvDir {
    fn read_table(&mut self, name: &str) -> Result<Table> {
        let path = self.table_path(name);
        let content = read_file_as_utf8(&path)?;
        let delimiter = sniff_delimiter(&content);
        log::debug!("{}: delimiter '{}'", path.display(), delimiter as char);
        parse_table(name, &content, delimiter)
    }
}

impl TableSink for CsvDir {
    fn write_table(&mut self, name: &str, table: &Table) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| EmendasError::Io(format!("{}: {}", self.dir.display(), e)))?;
        let path = self.table_path(name);
        export(table, &path, WRITE_DELIMITER)?;
        log::info!("wrote {} row(s) to {}", table.len(), path.display());
        Ok(())
    }

    fn notify(&mut self, message: &str) -> Result<()> {
        log::info!("status: {message}");
        self.notifications.push(message.to_string());
        Ok(())
    }
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b','];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    let mut best = b';';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the header line to be viable
        let target = match counts.first() {
            Some(&c) if c > 1 => c,
            _ => continue,
        };

        // Ties go to the earlier candidate; pt-BR amounts like "1.500,50"
        // inflate comma counts on data lines but not on the header.
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (Excel on Windows saves CSV as Windows-1252)
pub fn read_file_as_utf8(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path).map_err(|e| EmendasError::Io(format!("{}: {}", path.display(), e)))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| EmendasError::Io(format!("{}: {}", path.display(), e)))?;

    match String::from_utf8(bytes) {
        Ok(s) if s.starts_with('\u{feff}') => Ok(s['\u{feff}'.len_utf8()..].to_string()),
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn parse_table(name: &str, content: &str, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(|e| EmendasError::Io(format!("{name}.csv: {e}")))?,
        None => {
            return Err(EmendasError::MalformedTable {
                table: name.to_string(),
                reason: "file has no header row".into(),
            })
        }
    };

    let mut table = Table::new(header.iter().map(str::to_string).collect());
    for result in records {
        let record = result.map_err(|e| EmendasError::Io(format!("{name}.csv: {e}")))?;
        table.push_row(record.iter().map(CellValue::from_text).collect());
    }

    Ok(table)
}

fn export(table: &Table, path: &Path, delimiter: u8) -> Result<()> {
    let io_err = |e: csv::Error| EmendasError::Io(format!("{}: {}", path.display(), e));

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(io_err)?;

    writer.write_record(&table.columns).map_err(io_err)?;
    for row in &table.rows {
        let record: Vec<String> = row.iter().map(CellValue::raw_display).collect();
        writer.write_record(&record).map_err(io_err)?;
    }

    writer
        .flush()
        .map_err(|e| EmendasError::Io(format!("{}: {}", path.display(), e)))?;
    Ok(())
}
