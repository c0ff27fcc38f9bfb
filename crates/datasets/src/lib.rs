//! Bearing Datasets
//!
//! Recording sources for the XJTU-SY and CWRU bearing datasets plus an
//! in-memory source for callers that already hold their waveforms.

mod bearings;
mod csv;
mod cwru;
mod error;
mod source;
mod xjtu;

pub use bearings::{cwru_drive_end, cwru_drive_end_48k, cwru_fan_end, xjtu_ldk_uer204};
pub use csv::CsvTable;
pub use cwru::{CwruFolder, CwruLabel, CwruSource};
pub use error::DatasetError;
pub use source::{MemorySource, RecordingHandle, RecordingSource};
pub use xjtu::{XjtuBearing, XjtuSource, XJTU_BEARINGS, XJTU_SAMPLE_RATE};
