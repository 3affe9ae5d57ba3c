use std::path::PathBuf;

use thiserror::Error;

/// Failures producing or reading an insights document.
#[derive(Debug, Error)]
pub enum InsightsError {
    /// The document could not be encoded.
    #[error("failed to encode insights document")]
    Encode(#[source] serde_json::Error),
    /// The temporary file next to the destination could not be written.
    #[error("failed to write insights document to {path}")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The finished temporary file could not replace the destination.
    #[error("failed to move insights document into place at {path}")]
    Persist {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: tempfile::PersistError,
    },
    /// An existing document could not be read.
    #[error("failed to read insights document {path}")]
    Read {
        /// Source path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// An existing document is not valid against the schema.
    #[error("invalid insights document {path}")]
    Decode {
        /// Source path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}
