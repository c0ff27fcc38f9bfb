//! Signal Model
//!
//! Shared value types for vibration feature extraction: recordings, bearing
//! fault kinds, the fault-frequency model and the common error type.

mod error;
mod fault;
mod recording;

pub use error::SignalError;
pub use fault::{FaultFrequencyModel, FaultKind, FaultSet};
pub use recording::{DataSource, Recording};
