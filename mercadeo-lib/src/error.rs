use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Directory {} does not exist", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("No .xlsx file starting with '{prefix}' was found in {}", .dir.display())]
    FileNotFound { dir: PathBuf, prefix: String },

    #[error("Required column not found in {sheet}: expected one of {candidates:?}")]
    ColumnNotFound {
        sheet: String,
        candidates: Vec<String>,
    },

    #[error("Error reading sheet '{sheet}': {message}")]
    SheetRead { sheet: String, message: String },

    #[error("Expected {expected} rows in the master, found {actual}")]
    RowCountMismatch { expected: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
