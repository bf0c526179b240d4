//! Error types for the grid engine.
//!
//! Every error here is a programming or configuration defect. Nothing is
//! retried; callers fix their inputs.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("Invalid grid format: unexpected column count on row {row} (expected {expected}, found {found})")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid grid format: template has no cells")]
    EmptyTemplate,

    #[error("Invalid grid format: unknown cell tag {0:?}")]
    UnknownCellTag(char),

    #[error("Importance must be a non-negative integer, got {0}")]
    InvalidImportance(f64),

    #[error("Cell does not exist at column {col}, row {row}")]
    CellDoesNotExist { col: isize, row: isize },

    #[error("Cannot select a template from an empty set")]
    NoTemplates,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GridError>;
