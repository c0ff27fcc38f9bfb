//! Recording Metadata and Samples

use crate::fault::{FaultFrequencyModel, FaultSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dataset a recording came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSource {
    /// XJTU-SY run-to-failure dataset
    Xjtu,
    /// Case Western Reserve University bearing dataset
    Cwru,
    /// Anything supplied directly by a caller
    Custom,
}

impl DataSource {
    /// Numeric code used by the feature store
    pub const fn code(self) -> i64 {
        match self {
            DataSource::Xjtu => 0,
            DataSource::Cwru => 1,
            DataSource::Custom => 2,
        }
    }

    /// Inverse of [`DataSource::code`]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(DataSource::Xjtu),
            1 => Some(DataSource::Cwru),
            2 => Some(DataSource::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Xjtu => f.write_str("xjtu"),
            DataSource::Cwru => f.write_str("cwru"),
            DataSource::Custom => f.write_str("custom"),
        }
    }
}

/// One channel of a vibration recording plus the metadata needed to analyse it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    /// Dataset of origin
    pub source: DataSource,
    /// File name relative to the dataset root
    pub recording_id: String,
    /// Channel name, e.g. `H`, `V`, `DE`
    pub channel: String,
    /// Raw samples in acquisition order
    pub samples: Vec<f64>,
    /// Sampling frequency (Hz)
    pub sample_rate: f64,
    /// Shaft speed (revolutions per second)
    pub rotation_rate: f64,
    /// Defect-frequency ratios of the bearing under test
    pub fault_model: Option<FaultFrequencyModel>,
    /// Bearing identifier, e.g. `Bearing1_1`
    pub bearing_name: Option<String>,
    /// Position in a run-to-failure sequence
    pub file_idx: Option<u32>,
    /// Faults the dataset labels this recording with
    pub labelled_faults: FaultSet,
    /// Seeded defect size (mils) for CWRU recordings
    pub fault_size: Option<u32>,
    /// Outer race defect position (clock direction) for CWRU recordings
    pub load_direction: Option<u8>,
}

impl Recording {
    /// Create a recording with the required fields; optional metadata starts empty
    pub fn new(
        source: DataSource,
        recording_id: impl Into<String>,
        channel: impl Into<String>,
        samples: Vec<f64>,
        sample_rate: f64,
        rotation_rate: f64,
    ) -> Self {
        Self {
            source,
            recording_id: recording_id.into(),
            channel: channel.into(),
            samples,
            sample_rate,
            rotation_rate,
            fault_model: None,
            bearing_name: None,
            file_idx: None,
            labelled_faults: FaultSet::EMPTY,
            fault_size: None,
            load_direction: None,
        }
    }

    /// Attach the bearing's fault-frequency ratios
    pub fn with_fault_model(mut self, model: FaultFrequencyModel) -> Self {
        self.fault_model = Some(model);
        self
    }

    /// Attach the bearing identifier
    pub fn with_bearing_name(mut self, name: impl Into<String>) -> Self {
        self.bearing_name = Some(name.into());
        self
    }

    /// Attach the run-to-failure index
    pub fn with_file_idx(mut self, idx: u32) -> Self {
        self.file_idx = Some(idx);
        self
    }

    /// Attach the dataset's fault labels
    pub fn with_labelled_faults(mut self, faults: FaultSet) -> Self {
        self.labelled_faults = faults;
        self
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.samples.len() as f64 / self.sample_rate
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::FaultKind;

    #[test]
    fn test_recording_builder() {
        let rec = Recording::new(DataSource::Xjtu, "35Hz12kN/Bearing1_1/1.csv", "H", vec![0.0; 32768], 25600.0, 35.0)
            .with_bearing_name("Bearing1_1")
            .with_file_idx(1)
            .with_labelled_faults(FaultSet::of(&[FaultKind::Outer]));

        assert_eq!(rec.bearing_name.as_deref(), Some("Bearing1_1"));
        assert_eq!(rec.file_idx, Some(1));
        assert!(rec.labelled_faults.contains(FaultKind::Outer));
        assert!((rec.duration_secs() - 1.28).abs() < 1e-9);
    }

    #[test]
    fn test_deserialize_rejects_invalid_fault_model() {
        let model = FaultFrequencyModel::new(3.5848, 5.4152, 0.3983, 4.7135).unwrap();
        let rec = Recording::new(DataSource::Cwru, "IR007_1.csv", "DE", vec![0.1, -0.1], 12000.0, 29.0)
            .with_fault_model(model);

        let mut value = serde_json::to_value(&rec).unwrap();
        assert!(serde_json::from_value::<Recording>(value.clone()).is_ok());

        value["fault_model"]["bpfo_ratio"] = serde_json::json!(-3.5);
        assert!(serde_json::from_value::<Recording>(value).is_err());
    }

    #[test]
    fn test_source_codes_roundtrip() {
        for source in [DataSource::Xjtu, DataSource::Cwru, DataSource::Custom] {
            assert_eq!(DataSource::from_code(source.code()), Some(source));
        }
        assert_eq!(DataSource::from_code(9), None);
    }
}
