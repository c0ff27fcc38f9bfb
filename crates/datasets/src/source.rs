//! Recording sources

use crate::error::DatasetError;
use serde::{Deserialize, Serialize};
use signal_model::{DataSource, Recording};

/// Reference to one file of a dataset; loading it yields one recording per channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordingHandle {
    pub source: DataSource,
    /// Folder or bearing the file belongs to
    pub group: String,
    /// Path relative to the dataset root, `/`-separated
    pub relative_path: String,
    /// Position in a run-to-failure sequence
    pub file_idx: Option<u32>,
}

/// A dataset that can enumerate and load recordings
pub trait RecordingSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Enumerate every recording file in a stable order
    fn list(&self) -> Result<Vec<RecordingHandle>, DatasetError>;

    /// Load all channels of one file
    fn load(&self, handle: &RecordingHandle) -> Result<Vec<Recording>, DatasetError>;
}

/// Recordings held in memory, grouped into handles by recording id
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    recordings: Vec<Recording>,
}

impl MemorySource {
    pub fn new(recordings: Vec<Recording>) -> Self {
        Self { recordings }
    }

    pub fn push(&mut self, recording: Recording) {
        self.recordings.push(recording);
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }
}

impl RecordingSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn list(&self) -> Result<Vec<RecordingHandle>, DatasetError> {
        let mut handles: Vec<RecordingHandle> = Vec::new();
        for recording in &self.recordings {
            if handles.iter().any(|h| h.relative_path == recording.recording_id) {
                continue;
            }
            handles.push(RecordingHandle {
                source: recording.source,
                group: recording
                    .bearing_name
                    .clone()
                    .unwrap_or_else(|| self.name().to_string()),
                relative_path: recording.recording_id.clone(),
                file_idx: recording.file_idx,
            });
        }
        Ok(handles)
    }

    fn load(&self, handle: &RecordingHandle) -> Result<Vec<Recording>, DatasetError> {
        let channels: Vec<Recording> = self
            .recordings
            .iter()
            .filter(|r| r.recording_id == handle.relative_path)
            .cloned()
            .collect();
        if channels.is_empty() {
            return Err(DatasetError::UnknownRecording(handle.relative_path.clone()));
        }
        Ok(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(id: &str, channel: &str) -> Recording {
        Recording::new(DataSource::Custom, id, channel, vec![1.0, -1.0], 100.0, 10.0)
    }

    #[test]
    fn test_memory_source_groups_channels() {
        let source = MemorySource::new(vec![
            recording("a.csv", "H"),
            recording("b.csv", "H"),
            recording("a.csv", "V"),
        ]);

        let handles = source.list().unwrap();
        assert_eq!(handles.len(), 2);
        assert_eq!(handles[0].relative_path, "a.csv");
        assert_eq!(handles[1].relative_path, "b.csv");

        let channels = source.load(&handles[0]).unwrap();
        let names: Vec<&str> = channels.iter().map(|r| r.channel.as_str()).collect();
        assert_eq!(names, vec!["H", "V"]);
    }

    #[test]
    fn test_memory_source_unknown_handle() {
        let source = MemorySource::new(vec![recording("a.csv", "H")]);
        let handle = RecordingHandle {
            source: DataSource::Custom,
            group: "memory".into(),
            relative_path: "zzz.csv".into(),
            file_idx: None,
        };
        assert!(matches!(
            source.load(&handle),
            Err(DatasetError::UnknownRecording(_))
        ));
    }
}
