use std::path::PathBuf;

use thiserror::Error;

/// Failures outside the statistics themselves.
#[derive(Debug, Error)]
pub enum BatteryError {
    /// Labeled sample file could not be opened.
    #[error("failed to open labeled occupations {path}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Labeled sample file is not valid CSV or lacks its columns.
    #[error("failed to read labeled occupations {path}")]
    Labels {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },
    /// A label names no known category.
    #[error("labeled occupations {path} record {record}: unknown category {value:?}")]
    UnknownCategory {
        /// File that failed.
        path: PathBuf,
        /// 1-based data record.
        record: usize,
        /// Offending text.
        value: String,
    },
}
