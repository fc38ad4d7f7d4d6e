//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract. Scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 60-69   | run              | Config and input table failures          |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into [`engine_exit_code`]

use emendas_engine::EmendasError;

// =============================================================================
// Universal (0, 2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Run (60-69)
// =============================================================================

/// Config file could not be read or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 60;

/// An input table has no data extent or lacks a required header.
pub const EXIT_MALFORMED_TABLE: u8 = 61;

/// A cell could not be read as the type its column requires.
pub const EXIT_DATA_TYPE: u8 = 62;

/// Reading the source or saving the output failed.
pub const EXIT_IO: u8 = 63;

/// Map an engine error to its exit code.
pub fn engine_exit_code(err: &EmendasError) -> u8 {
    match err {
        EmendasError::MalformedTable { .. } | EmendasError::MissingColumn { .. } => EXIT_MALFORMED_TABLE,
        EmendasError::DataType { .. } => EXIT_DATA_TYPE,
        EmendasError::ConfigParse(_) | EmendasError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        EmendasError::Io(_) => EXIT_IO,
    }
}
