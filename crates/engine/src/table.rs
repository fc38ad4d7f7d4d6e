//! Rectangular tables with a named header row, as handed over by a
//! [`TableSource`](crate::source::TableSource).

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{EmendasError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// A field from a text source: blank → Empty, anything else Text. Numbers
    /// are read later by the column that asks for one, so `10302.7010` in a
    /// program column keeps its trailing zero.
    pub fn from_text(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    /// A gap left by merged-cell presentation: empty, or whitespace-only text.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Whether the cell holds, or parses as, a number.
    pub fn is_numeric(&self) -> bool {
        self.as_number().is_some()
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Number(_) | CellValue::Empty => None,
            CellValue::Text(s) => parse_number(s),
        }
    }

    /// Integral value, e.g. an organizational-unit code. `36101.0` is accepted,
    /// `36101.5` is not.
    pub fn as_integer(&self) -> Option<i64> {
        let n = self.as_number()?;
        if n.fract() == 0.0 && n.abs() < 1e15 {
            Some(n as i64)
        } else {
            None
        }
    }

    /// Monetary amount in cents. `None` when the amount does not fit.
    pub fn as_cents(&self) -> Option<i64> {
        self.as_number().and_then(to_cents)
    }

    /// Text rendering used for keys and codes. Integral numbers lose their
    /// fractional part, so `7001.0` and `"7001"` render the same.
    pub fn raw_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }

    /// Accepts per-row amounts and group sums alike.
    pub fn from_cents(cents: impl Into<i128>) -> Self {
        CellValue::Number(cents.into() as f64 / 100.0)
    }
}

/// Parse a numeric string. Plain decimals (`1500.50`) are tried first, then
/// pt-BR formatting (`1.500,50`, optional `R$` prefix).
pub fn parse_number(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix("R$").unwrap_or(trimmed).trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(n) = trimmed.parse::<f64>() {
        if looks_like_ptbr_thousands(trimmed) {
            log::warn!("amount '{trimmed}' read as {n}; write '{trimmed},00' if thousands were meant");
        }
        return n.is_finite().then_some(n);
    }

    if trimmed.contains(',') {
        let normalized = trimmed.replace('.', "").replace(',', ".");
        if let Ok(n) = normalized.parse::<f64>() {
            return n.is_finite().then_some(n);
        }
    }

    None
}

/// `1.500` or `12.345.678`: dot-grouped digits with no decimal comma. Parsed
/// as a plain decimal, though a pt-BR export means thousands.
pub fn looks_like_ptbr_thousands(text: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d{1,3}(\.\d{3})+$").expect("literal pattern"))
        .is_match(text)
}

/// Round to cents, or `None` when the result falls outside `i64`.
pub fn to_cents(value: f64) -> Option<i64> {
    let cents = (value * 100.0).round();
    // i64::MAX as f64 rounds up to 2^63, which itself does not fit.
    (cents.is_finite() && cents >= i64::MIN as f64 && cents < i64::MAX as f64).then(|| cents as i64)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from a header and ragged rows. Header names are trimmed;
    /// rows are padded with `Empty` (or cut) to the header width.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(|c| c.trim().to_string()).collect();
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Column index, or `MissingColumn` naming the table.
    pub fn require_column(&self, table: &str, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| EmendasError::MissingColumn {
            table: table.into(),
            column: name.into(),
        })
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.width(), CellValue::Empty);
        self.rows.push(row);
    }

    /// Overwrite the column named `name`, or append it when absent.
    /// `values` must have one entry per row.
    pub fn set_column(&mut self, name: &str, values: Vec<CellValue>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Remove the named column if present. Returns whether it existed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }
}
