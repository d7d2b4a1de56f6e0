use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions raised while loading the input tables.
///
/// These are wrapped in `anyhow::Error` at the call sites so that callers can
/// still `downcast_ref::<InputError>()` to tell a missing file apart from bad
/// data.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Required input table '{table}' not found at {path:?}")]
    MissingInput { table: String, path: PathBuf },

    #[error("Table '{table}' is missing required column '{column}'")]
    SchemaMismatch { table: String, column: String },

    #[error("Table '{table}' row {row}: cannot parse '{value}' in column '{column}'")]
    InvalidValue {
        table: String,
        row: usize,
        column: String,
        value: String,
    },
}
