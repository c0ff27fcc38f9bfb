//! Dataset Error Types

use signal_model::SignalError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors while listing or loading recordings
#[derive(Debug, Error)]
pub enum DatasetError {
    /// File system access failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV content could not be parsed
    #[error("Malformed CSV {path} at line {line}: {reason}")]
    MalformedCsv {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Expected signal column not present
    #[error("Missing column {column} in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// Handle does not belong to this source
    #[error("Unknown recording: {0}")]
    UnknownRecording(String),

    /// Invalid bearing parameters
    #[error(transparent)]
    Signal(#[from] SignalError),
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<DatasetError> for SignalError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::Signal(inner) => inner,
            other => SignalError::Source(other.to_string()),
        }
    }
}
