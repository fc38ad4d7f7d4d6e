//! Trim a raw sheet to its data extent and undo merged-cell gaps.
//!
//! Spreadsheets exported by the budget system end with a totals row and a few
//! blank rows, and repeat nothing inside merged cells: only the first row of a
//! merged block carries the value. Both have to be fixed before any group sum
//! is taken.

use crate::error::{EmendasError, Result};
use crate::table::{CellValue, Table};

/// Truncate `table` after the last row whose `presence_column` is numeric,
/// then forward-fill every column.
pub fn normalize(table: &Table, table_name: &str, presence_column: &str) -> Result<Table> {
    let presence = table.require_column(table_name, presence_column)?;

    let last = last_data_row(table, presence).ok_or_else(|| EmendasError::MalformedTable {
        table: table_name.into(),
        reason: format!("no row has a numeric value in column '{presence_column}'"),
    })?;

    let mut rows = table.rows[..=last].to_vec();
    forward_fill(&mut rows);

    let dropped = table.len() - rows.len();
    if dropped > 0 {
        log::debug!("{table_name}: dropped {dropped} trailing non-data row(s)");
    }

    Ok(Table {
        columns: table.columns.clone(),
        rows,
    })
}

/// Index of the last row whose `column` cell parses as a number.
pub fn last_data_row(table: &Table, column: usize) -> Option<usize> {
    table
        .rows
        .iter()
        .rposition(|row| row.get(column).is_some_and(CellValue::is_numeric))
}

/// Replace each missing cell with the nearest non-missing cell above it in the
/// same column. Populated cells are never touched; gaps with nothing above
/// them stay as they are.
pub fn forward_fill(rows: &mut [Vec<CellValue>]) {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut last_seen: Vec<Option<CellValue>> = vec![None; width];

    for row in rows.iter_mut() {
        for (col, cell) in row.iter_mut().enumerate() {
            if cell.is_missing() {
                if let Some(prev) = &last_seen[col] {
                    *cell = prev.clone();
                }
            } else {
                last_seen[col] = Some(cell.clone());
            }
        }
    }
}
