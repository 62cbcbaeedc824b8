/// Data layer: core types, loading, transforms and export.
///
/// Architecture:
/// ```text
///  dataset/*.txt | *.tsv | *.csv | *.parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Series (name from header)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ IndexCatalog │  name → Series
///   └──────────────┘
///        │
///        ├──► alias        display label → dataset key
///        ├──► transform    sign split, latest value, window
///        ├──► export       Series → csv / tsv
///        └──► methodology  static per-index metadata
/// ```

pub mod alias;
pub mod export;
pub mod loader;
pub mod methodology;
pub mod model;
pub mod time;
pub mod transform;

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing index series.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("{path}: missing header row")]
    MissingHeader { path: String },

    #[error("{path}: {reason}")]
    Schema { path: String, reason: String },

    #[error("I/O error on {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("parquet error in {path}")]
    Parquet {
        path: String,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("arrow error in {path}")]
    Arrow {
        path: String,
        #[source]
        source: arrow::error::ArrowError,
    },
}

impl DataError {
    /// Whether this error means the input simply does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            DataError::NotFound(_) => true,
            DataError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
