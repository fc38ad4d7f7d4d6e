use std::fmt;

use serde::Serialize;

use crate::config::ColumnNames;
use crate::error::{EmendasError, Result};
use crate::table::{CellValue, Table};

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Amendment code. Repeats across the tranches of one amendment; every group
/// sum is keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AmendmentCode(String);

impl AmendmentCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_string())
    }

    /// `7001.0` and `"7001"` yield the same code.
    pub fn from_cell(cell: &CellValue) -> Option<Self> {
        if cell.is_missing() {
            None
        } else {
            Some(Self(cell.raw_display()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AmendmentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One line item of the primary ledger.
#[derive(Debug, Clone)]
pub struct AmendmentRecord {
    pub code: AmendmentCode,
    pub unit: i64,
    pub program: String,
    pub sectoral_cents: i64,
    pub requested_cents: i64,
}

/// One row of the mandatory-allocation (bancada impositiva) table.
#[derive(Debug, Clone)]
pub struct MandatoryAllocationRecord {
    pub code: AmendmentCode,
    pub unit: i64,
    pub program: String,
    pub requested_cents: i64,
    /// Amount from the configured value column, if one is configured.
    pub value_cents: Option<i64>,
}

/// One row of the usage criteria table. Blank cells never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriteriaRecord {
    pub unit: Option<i64>,
    pub action: Option<String>,
}

impl CriteriaRecord {
    pub fn new(unit: i64, action: &str) -> Self {
        Self {
            unit: Some(unit),
            action: Some(action.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Reads typed fields out of one table row, reporting failures with the
/// table name, spreadsheet row and header.
struct RowReader<'a> {
    table_name: &'a str,
    table: &'a Table,
    index: usize,
}

impl<'a> RowReader<'a> {
    fn cell(&self, col: usize) -> &'a CellValue {
        &self.table.rows[self.index][col]
    }

    fn error(&self, col: usize, expected: &'static str) -> EmendasError {
        EmendasError::DataType {
            table: self.table_name.into(),
            row: self.index + 2,
            column: self.table.columns[col].clone(),
            expected,
            value: self.cell(col).raw_display(),
        }
    }

    fn code(&self, col: usize) -> Result<AmendmentCode> {
        AmendmentCode::from_cell(self.cell(col)).ok_or_else(|| self.error(col, "an amendment code"))
    }

    fn integer(&self, col: usize) -> Result<i64> {
        self.cell(col).as_integer().ok_or_else(|| self.error(col, "an integer"))
    }

    fn cents(&self, col: usize) -> Result<i64> {
        self.cell(col).as_cents().ok_or_else(|| self.error(col, "a numeric amount"))
    }

    fn text(&self, col: usize) -> Result<String> {
        let cell = self.cell(col);
        if cell.is_missing() {
            Err(self.error(col, "text"))
        } else {
            Ok(cell.raw_display())
        }
    }
}

fn rows<'a>(table_name: &'a str, table: &'a Table) -> impl Iterator<Item = RowReader<'a>> {
    (0..table.len()).map(move |index| RowReader {
        table_name,
        table,
        index,
    })
}

/// Convert a normalized ledger table into typed records.
pub fn load_ledger(table: &Table, table_name: &str, cols: &ColumnNames) -> Result<Vec<AmendmentRecord>> {
    let code = table.require_column(table_name, &cols.code)?;
    let unit = table.require_column(table_name, &cols.unit)?;
    let program = table.require_column(table_name, &cols.program)?;
    let sectoral = table.require_column(table_name, &cols.sectoral)?;
    let requested = table.require_column(table_name, &cols.requested)?;

    rows(table_name, table)
        .map(|r| {
            Ok(AmendmentRecord {
                code: r.code(code)?,
                unit: r.integer(unit)?,
                program: r.text(program)?,
                sectoral_cents: r.cents(sectoral)?,
                requested_cents: r.cents(requested)?,
            })
        })
        .collect()
}

/// Convert a normalized mandatory-allocation table into typed records.
pub fn load_mandatory(
    table: &Table,
    table_name: &str,
    cols: &ColumnNames,
    value_column: Option<&str>,
) -> Result<Vec<MandatoryAllocationRecord>> {
    let code = table.require_column(table_name, &cols.code)?;
    let unit = table.require_column(table_name, &cols.unit)?;
    let program = table.require_column(table_name, &cols.program)?;
    let requested = table.require_column(table_name, &cols.requested)?;
    let value = value_column
        .map(|name| table.require_column(table_name, name))
        .transpose()?;

    rows(table_name, table)
        .map(|r| {
            Ok(MandatoryAllocationRecord {
                code: r.code(code)?,
                unit: r.integer(unit)?,
                program: r.text(program)?,
                requested_cents: r.cents(requested)?,
                value_cents: value.map(|col| r.cents(col)).transpose()?,
            })
        })
        .collect()
}

/// Convert the criteria table. Not normalized: blank cells stay blank and
/// match nothing, but a populated unit must be an integer.
pub fn load_criteria(table: &Table, table_name: &str, cols: &ColumnNames) -> Result<Vec<CriteriaRecord>> {
    let unit = table.require_column(table_name, &cols.unit)?;
    let action = table.require_column(table_name, &cols.action)?;

    rows(table_name, table)
        .map(|r| {
            let unit = if r.cell(unit).is_missing() {
                None
            } else {
                Some(r.integer(unit)?)
            };
            Ok(CriteriaRecord {
                unit,
                action: action_code(r.cell(action)),
            })
        })
        .collect()
}

/// Action codes are four characters. A numeric cell, or a short run of digits
/// from a text export, lost its leading zeros and is padded back.
fn action_code(cell: &CellValue) -> Option<String> {
    if cell.is_missing() {
        return None;
    }
    let raw = cell.raw_display();
    let digits = !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit());
    if matches!(cell, CellValue::Number(_)) || digits {
        Some(format!("{raw:0>4}"))
    } else {
        Some(raw)
    }
}
