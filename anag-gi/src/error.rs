//! Error types for anag-gi
//!
//! Every error aborts the file being imported: errors raised inside the
//! import transaction roll it back, errors raised before it (missing file,
//! missing column) mean no transaction is opened at all.

use std::path::PathBuf;
use thiserror::Error;

/// Import error type
#[derive(Debug, Error)]
pub enum ImportError {
    /// A required source file does not exist
    #[error("{role} file not found: {}", path.display())]
    MissingInputFile { role: &'static str, path: PathBuf },

    /// A mapped header is absent from the source file
    #[error("{file}: missing column '{column}'")]
    MissingColumn { file: String, column: String },

    /// A row lacks a mandatory field
    #[error("line {line}: missing required field '{field}'")]
    MalformedRow { line: u64, field: &'static str },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Database error (constraint violations included)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// anag-common error
    #[error(transparent)]
    Common(#[from] anag_common::Error),
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;
