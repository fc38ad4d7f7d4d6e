//! `emendas-engine`: budget amendment decision engine.
//!
//! Pure engine crate: receives tables from a [`TableSource`], returns
//! decisioned tables to a [`TableSink`]. No file or workbook dependencies.

pub mod aggregate;
pub mod config;
pub mod decision;
pub mod error;
pub mod lookup;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod source;
pub mod summary;
pub mod table;

pub use config::EmendasConfig;
pub use decision::{Decision, TableKind, Verdict};
pub use error::{EmendasError, Result};
pub use lookup::{MandatoryPortion, UsageId};
pub use pipeline::{Pipeline, ProcessedTables, RawInputs};
pub use source::{MemoryStore, TableSink, TableSource};
pub use summary::{RunReport, TableSummary};
pub use table::{CellValue, Table};
