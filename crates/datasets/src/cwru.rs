//! Case Western Reserve University bearing dataset
//!
//! Expects CSV exports of the `.mat` records, one folder per test setup.
//! Signal columns keep the MATLAB variable names (`X097_DE_time`,
//! `X097_FE_time`, `X097_BA_time`, `X097RPM`); the seeded fault is encoded in
//! the file name, e.g. `IR007_1.csv`, `OR021@6_2.csv`, `B014_0.csv`.

use crate::bearings::{cwru_drive_end, cwru_drive_end_48k, cwru_fan_end};
use crate::csv::CsvTable;
use crate::error::DatasetError;
use crate::source::{RecordingHandle, RecordingSource};
use signal_model::{DataSource, FaultFrequencyModel, FaultKind, FaultSet, Recording};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CHANNELS: [(&str, &str); 3] = [("DE_time", "DE"), ("FE_time", "FE"), ("BA_time", "BA")];

/// One test setup folder
#[derive(Debug, Clone)]
pub struct CwruFolder {
    pub name: &'static str,
    pub sample_rate: f64,
    /// `None` for healthy baseline records
    pub model: Option<FaultFrequencyModel>,
}

/// Fault label parsed from a record file name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CwruLabel {
    pub faults: FaultSet,
    /// Defect diameter in mils
    pub size: Option<u32>,
    /// Outer race defect position (clock direction)
    pub direction: Option<u8>,
}

impl CwruLabel {
    /// Parse a file stem such as `OR021@6_2`.
    ///
    /// Names without a recognised fault prefix and size yield an empty label.
    pub fn parse(stem: &str) -> Self {
        let (kind, rest) = if let Some(rest) = stem.strip_prefix("IR") {
            (FaultKind::Inner, rest)
        } else if let Some(rest) = stem.strip_prefix("OR") {
            (FaultKind::Outer, rest)
        } else if let Some(rest) = stem.strip_prefix('B') {
            (FaultKind::Ball, rest)
        } else {
            return Self::default();
        };

        let code = rest.split('_').next().unwrap_or_default();
        let (size, direction) = match code.split_once('@') {
            Some((size, dir)) => (size, dir.parse::<u8>().ok()),
            None => (code, None),
        };

        match size.parse::<u32>() {
            Ok(size) => Self {
                faults: FaultSet::EMPTY.with(kind),
                size: Some(size),
                direction,
            },
            Err(_) => Self::default(),
        }
    }
}

/// Reads CSV exports of the CWRU dataset from a local directory
#[derive(Debug)]
pub struct CwruSource {
    root: PathBuf,
    folders: Vec<CwruFolder>,
}

impl CwruSource {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        let root = root.into();
        let folders = vec![
            CwruFolder {
                name: "12KDriveEnd",
                sample_rate: 12_000.0,
                model: Some(cwru_drive_end()?),
            },
            CwruFolder {
                name: "48KDriveEnd",
                sample_rate: 48_000.0,
                model: Some(cwru_drive_end_48k()?),
            },
            CwruFolder {
                name: "FanEnd",
                sample_rate: 12_000.0,
                model: Some(cwru_fan_end()?),
            },
            CwruFolder {
                name: "normal",
                sample_rate: 12_000.0,
                model: None,
            },
        ];
        info!("CWRU source at {}", root.display());
        Ok(Self { root, folders })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn folders(&self) -> &[CwruFolder] {
        &self.folders
    }

    fn folder(&self, name: &str) -> Option<&CwruFolder> {
        self.folders.iter().find(|f| f.name == name)
    }
}

impl RecordingSource for CwruSource {
    fn name(&self) -> &str {
        "cwru"
    }

    fn list(&self) -> Result<Vec<RecordingHandle>, DatasetError> {
        let mut handles = Vec::new();

        for folder in &self.folders {
            let dir = self.root.join(folder.name);
            if !dir.is_dir() {
                debug!("Skipping missing folder {}", dir.display());
                continue;
            }

            let mut names = Vec::new();
            for entry in fs::read_dir(&dir).map_err(|e| DatasetError::io(&dir, e))? {
                let entry = entry.map_err(|e| DatasetError::io(&dir, e))?;
                let path = entry.path();
                if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("csv") {
                    continue;
                }
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
            names.sort();

            debug!("{}: {} files", folder.name, names.len());
            handles.extend(names.into_iter().map(|name| RecordingHandle {
                source: DataSource::Cwru,
                group: folder.name.to_string(),
                relative_path: format!("{}/{name}", folder.name),
                file_idx: None,
            }));
        }

        info!("CWRU: {} recordings listed", handles.len());
        Ok(handles)
    }

    fn load(&self, handle: &RecordingHandle) -> Result<Vec<Recording>, DatasetError> {
        let folder = self
            .folder(&handle.group)
            .ok_or_else(|| DatasetError::UnknownRecording(handle.relative_path.clone()))?;

        let path = self.root.join(&handle.relative_path);
        let mut table = CsvTable::read(&path)?;

        let rotation_rate = match table.column_ending_with("RPM").and_then(|c| c.first()) {
            Some(rpm) => rpm / 60.0,
            None => {
                warn!("{}: no RPM column, rotation rate left at 0", handle.relative_path);
                0.0
            }
        };

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let label = CwruLabel::parse(stem);

        let mut recordings = Vec::new();
        for (suffix, channel) in CHANNELS {
            let samples = match table.take_column_ending_with(suffix) {
                Some(samples) if !samples.is_empty() => samples,
                _ => continue,
            };

            let mut recording = Recording::new(
                DataSource::Cwru,
                handle.relative_path.clone(),
                channel,
                samples,
                folder.sample_rate,
                rotation_rate,
            )
            .with_bearing_name(folder.name)
            .with_labelled_faults(label.faults);
            if let Some(model) = &folder.model {
                recording = recording.with_fault_model(model.clone());
            }
            recording.fault_size = label.size;
            recording.load_direction = label.direction;
            recordings.push(recording);
        }

        if recordings.is_empty() {
            return Err(DatasetError::MissingColumn {
                path,
                column: "DE_time|FE_time|BA_time".into(),
            });
        }
        Ok(recordings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        let ir = CwruLabel::parse("IR007_1");
        assert_eq!(ir.faults, FaultSet::of(&[FaultKind::Inner]));
        assert_eq!(ir.size, Some(7));
        assert_eq!(ir.direction, None);

        let or = CwruLabel::parse("OR021@6_2");
        assert_eq!(or.faults, FaultSet::of(&[FaultKind::Outer]));
        assert_eq!(or.size, Some(21));
        assert_eq!(or.direction, Some(6));

        let ball = CwruLabel::parse("B014_0");
        assert!(ball.faults.contains(FaultKind::Ball));
        assert_eq!(ball.size, Some(14));
    }

    #[test]
    fn test_parse_baseline() {
        assert_eq!(CwruLabel::parse("Normal_0"), CwruLabel::default());
        assert_eq!(CwruLabel::parse("Baseline_1"), CwruLabel::default());
    }

    #[test]
    fn test_list_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("12KDriveEnd");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("OR007@6_0.csv"),
            "X130_DE_time,X130_FE_time,X130RPM\n0.1,0.01,1797\n-0.1,0.02,\n0.2,0.03,\n",
        )
        .unwrap();
        fs::write(dir.join("IR007_0.csv"), "X105_DE_time\n0.5\n-0.5\n").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let source = CwruSource::new(tmp.path()).unwrap();
        let handles = source.list().unwrap();
        assert_eq!(handles.len(), 2);
        assert_eq!(handles[0].relative_path, "12KDriveEnd/IR007_0.csv");

        let recordings = source.load(&handles[1]).unwrap();
        assert_eq!(recordings.len(), 2);
        let de = &recordings[0];
        assert_eq!(de.channel, "DE");
        assert_eq!(de.samples, vec![0.1, -0.1, 0.2]);
        assert_eq!(de.sample_rate, 12_000.0);
        assert!((de.rotation_rate - 1797.0 / 60.0).abs() < 1e-12);
        assert_eq!(de.fault_size, Some(7));
        assert_eq!(de.load_direction, Some(6));
        assert!(de.labelled_faults.contains(FaultKind::Outer));
        assert!(de.fault_model.is_some());
        assert_eq!(recordings[1].channel, "FE");

        let inner = source.load(&handles[0]).unwrap();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].rotation_rate, 0.0);
    }

    #[test]
    fn test_normal_records_have_no_model() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("normal");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Normal_0.csv"), "X097_DE_time,X097RPM\n0.1,1796\n0.2,\n").unwrap();

        let source = CwruSource::new(tmp.path()).unwrap();
        let handle = &source.list().unwrap()[0];
        let recordings = source.load(handle).unwrap();
        assert!(recordings[0].fault_model.is_none());
        assert!(recordings[0].labelled_faults.is_empty());
    }

    #[test]
    fn test_no_signal_columns() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("FanEnd");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("B007_0.csv"), "X279RPM\n1797\n").unwrap();

        let source = CwruSource::new(tmp.path()).unwrap();
        let handle = &source.list().unwrap()[0];
        assert!(matches!(
            source.load(handle),
            Err(DatasetError::MissingColumn { .. })
        ));
    }
}
