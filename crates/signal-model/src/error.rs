//! Signal Processing Error Types

use crate::fault::FaultKind;
use thiserror::Error;

/// Errors raised by feature extraction and fault-frequency analysis
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    /// Signal is empty, too short or contains non-finite samples
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Parameter outside its valid domain (negative ratio, bad sample rate, filter order...)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No spectrum bin falls inside the search window of a fault frequency
    #[error("No spectrum bins within {bandwidth_hz} Hz of {kind} frequency {expected_hz:.3} Hz")]
    EmptySearchBand {
        kind: FaultKind,
        expected_hz: f64,
        bandwidth_hz: f64,
    },

    /// Recording could not be loaded by its source
    #[error("Source error: {0}")]
    Source(String),

    /// Per-recording failure during a batch run
    #[error("Recording {recording} [{channel}] failed: {source}")]
    ItemFailure {
        recording: String,
        channel: String,
        #[source]
        source: Box<SignalError>,
    },
}

impl SignalError {
    /// Attach recording identity to an error
    pub fn for_item(self, recording: impl Into<String>, channel: impl Into<String>) -> Self {
        match self {
            // Already carries an identity
            err @ SignalError::ItemFailure { .. } => err,
            other => SignalError::ItemFailure {
                recording: recording.into(),
                channel: channel.into(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error kind, unwrapping `ItemFailure`
    pub fn root(&self) -> &SignalError {
        match self {
            SignalError::ItemFailure { source, .. } => source.root(),
            other => other,
        }
    }
}
