//! Error types for reading contingency analysis results.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while opening, resolving or summarizing a result container.
#[derive(Debug, Error)]
pub enum Error {
    /// The file is absent or unreadable.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file was readable but could not be decoded as a container.
    #[error("cannot decode {}: {message}", path.display())]
    Format { path: PathBuf, message: String },

    /// An addressed path does not exist. Carries every valid path so the
    /// caller can offer them instead.
    #[error("'{path}' not found")]
    NotFound {
        path: String,
        available: Vec<String>,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Structural violations of the result file layout. Always fatal.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("missing required path '{0}'")]
    MissingPath(String),

    #[error("missing attribute '{name}' on '{path}'")]
    MissingAttr { path: String, name: String },

    #[error("'{0}' is a group, expected a dataset")]
    NotADataset(String),

    #[error("'{0}' is a dataset, expected a group")]
    NotAGroup(String),

    #[error("attribute '{name}' on '{path}' must be {expected}")]
    BadAttr {
        path: String,
        name: String,
        expected: &'static str,
    },

    #[error("'{path}' {message}")]
    BadShape { path: String, message: String },

    #[error("'{path}' has {found} entries, expected {expected}")]
    LengthMismatch {
        path: String,
        expected: usize,
        found: usize,
    },

    #[error("'{path}' has {found} rows, expected {expected} to match '{reference}'")]
    RowMismatch {
        path: String,
        reference: String,
        expected: usize,
        found: usize,
    },

    #[error("contingency {index} has unknown type code {code}")]
    UnknownContingencyType { index: usize, code: i64 },

    #[error("contingency {index} does not exist (count = {count})")]
    NoSuchContingency { index: usize, count: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
