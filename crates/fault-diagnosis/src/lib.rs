//! Bearing Fault Diagnosis
//!
//! Locates the characteristic defect frequencies of a rolling-element bearing
//! in the envelope spectrum of its vibration signal.

mod config;
mod diagnosis;
mod locator;

pub use config::DiagnosisConfig;
pub use diagnosis::FaultDiagnosis;
pub use locator::{
    locate_fault_frequencies, DiagnosisResult, FaultFrequencyLocator, FaultIndication,
    DEFAULT_POWER_RATIO, DEFAULT_SEARCH_BANDWIDTH_HZ,
};
