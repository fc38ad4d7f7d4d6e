//! Table source/sink seam. The engine never touches files; adapters in
//! `emendas-io` (CSV directory, Excel workbook) implement these traits.

use std::collections::BTreeMap;

use crate::error::{EmendasError, Result};
use crate::table::Table;

pub trait TableSource {
    /// All populated rows and columns under `name`, header first.
    fn read_table(&mut self, name: &str) -> Result<Table>;
}

pub trait TableSink {
    /// Replace the destination `name` with `table`, keeping column order.
    fn write_table(&mut self, name: &str, table: &Table) -> Result<()>;

    /// Best-effort status message. Callers ignore failures.
    fn notify(&mut self, message: &str) -> Result<()>;
}

/// In-memory source and sink, keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub tables: BTreeMap<String, Table>,
    pub notifications: Vec<String>,
    /// Names passed to `write_table`, in call order.
    pub writes: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, table: Table) -> Self {
        self.tables.insert(name.to_string(), table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }
}

impl TableSource for MemoryStore {
    fn read_table(&mut self, name: &str) -> Result<Table> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| EmendasError::Io(format!("no table named '{name}'")))
    }
}

impl TableSink for MemoryStore {
    fn write_table(&mut self, name: &str, table: &Table) -> Result<()> {
        self.tables.insert(name.to_string(), table.clone());
        self.writes.push(name.to_string());
        Ok(())
    }

    fn notify(&mut self, message: &str) -> Result<()> {
        self.notifications.push(message.to_string());
        Ok(())
    }
}
