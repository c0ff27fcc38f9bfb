//! Stored feature record

use chrono::{DateTime, Utc};
use feature_engine::FeatureVector;
use serde::{Deserialize, Serialize};
use signal_model::{DataSource, Recording};

/// Features of one channel of one file, as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub source: DataSource,
    /// Recording file relative to the dataset root
    pub filename: String,
    pub channel: String,
    pub bearing_name: Option<String>,
    pub file_idx: Option<u32>,
    pub features: FeatureVector,
    pub computed_at: DateTime<Utc>,
}

impl FeatureRecord {
    /// Record for `features` computed from `recording`, stamped now
    pub fn from_recording(recording: &Recording, features: FeatureVector) -> Self {
        Self {
            source: recording.source,
            filename: recording.recording_id.clone(),
            channel: recording.channel.clone(),
            bearing_name: recording.bearing_name.clone(),
            file_idx: recording.file_idx,
            features,
            computed_at: Utc::now(),
        }
    }
}
