use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmendasError>;

#[derive(Debug, Error)]
pub enum EmendasError {
    /// The table has no usable data extent (no numeric amendment code).
    #[error("table '{table}': {reason}")]
    MalformedTable { table: String, reason: String },

    /// A required header is absent.
    #[error("table '{table}': missing column '{column}'")]
    MissingColumn { table: String, column: String },

    /// A cell could not be coerced. `row` is the spreadsheet row (header = 1).
    #[error("table '{table}', row {row}, column '{column}': expected {expected}, found '{value}'")]
    DataType {
        table: String,
        row: usize,
        column: String,
        expected: &'static str,
        value: String,
    },

    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("config validation error: {0}")]
    ConfigValidation(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl EmendasError {
    /// True for errors caused by the shape of the input tables rather than
    /// individual cell values.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedTable { .. } | Self::MissingColumn { .. })
    }
}
