//! XJTU-SY run-to-failure dataset
//!
//! Layout: `<root>/<condition>/<BearingX_Y>/<n>.csv` with `n` counting up
//! from 1. Each file holds 1.28 s of horizontal and vertical acceleration
//! sampled at 25.6 kHz.

use crate::bearings::xjtu_ldk_uer204;
use crate::csv::CsvTable;
use crate::error::DatasetError;
use crate::source::{RecordingHandle, RecordingSource};
use signal_model::{DataSource, FaultFrequencyModel, FaultKind, FaultSet, Recording};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Sampling frequency of every XJTU-SY file (Hz)
pub const XJTU_SAMPLE_RATE: f64 = 25_600.0;

const HORIZONTAL_COLUMN: &str = "Horizontal_vibration_signals";
const VERTICAL_COLUMN: &str = "Vertical_vibration_signals";

/// Operating condition and failure labels of one test bearing
#[derive(Debug, Clone, Copy)]
pub struct XjtuBearing {
    /// Folder relative to the dataset root
    pub folder: &'static str,
    /// Shaft speed (Hz)
    pub rotation_hz: f64,
    /// Failed components reported for the bearing
    pub faults: FaultSet,
}

impl XjtuBearing {
    /// Bearing name, e.g. `Bearing1_1`
    pub fn name(&self) -> &'static str {
        self.folder.rsplit('/').next().unwrap_or(self.folder)
    }
}

const OUTER: FaultSet = FaultSet::EMPTY.with(FaultKind::Outer);
const INNER: FaultSet = FaultSet::EMPTY.with(FaultKind::Inner);
const CAGE: FaultSet = FaultSet::EMPTY.with(FaultKind::Cage);

/// The fifteen bearings of the dataset
pub const XJTU_BEARINGS: [XjtuBearing; 15] = [
    XjtuBearing { folder: "35Hz12kN/Bearing1_1", rotation_hz: 35.0, faults: OUTER },
    XjtuBearing { folder: "35Hz12kN/Bearing1_2", rotation_hz: 35.0, faults: OUTER },
    XjtuBearing { folder: "35Hz12kN/Bearing1_3", rotation_hz: 35.0, faults: OUTER },
    XjtuBearing { folder: "35Hz12kN/Bearing1_4", rotation_hz: 35.0, faults: CAGE },
    XjtuBearing { folder: "35Hz12kN/Bearing1_5", rotation_hz: 35.0, faults: OUTER.with(FaultKind::Inner) },
    XjtuBearing { folder: "37.5Hz11Kn/Bearing2_1", rotation_hz: 37.5, faults: INNER },
    XjtuBearing { folder: "37.5Hz11Kn/Bearing2_2", rotation_hz: 37.5, faults: OUTER },
    XjtuBearing { folder: "37.5Hz11Kn/Bearing2_3", rotation_hz: 37.5, faults: CAGE },
    XjtuBearing { folder: "37.5Hz11Kn/Bearing2_4", rotation_hz: 37.5, faults: OUTER },
    XjtuBearing { folder: "37.5Hz11Kn/Bearing2_5", rotation_hz: 37.5, faults: OUTER },
    XjtuBearing { folder: "40Hz10Kn/Bearing3_1", rotation_hz: 40.0, faults: OUTER },
    XjtuBearing {
        folder: "40Hz10Kn/Bearing3_2",
        rotation_hz: 40.0,
        faults: FaultSet::from_bits(0x0F),
    },
    XjtuBearing { folder: "40Hz10Kn/Bearing3_3", rotation_hz: 40.0, faults: INNER },
    XjtuBearing { folder: "40Hz10Kn/Bearing3_4", rotation_hz: 40.0, faults: INNER },
    XjtuBearing { folder: "40Hz10Kn/Bearing3_5", rotation_hz: 40.0, faults: OUTER },
];

/// Reads the XJTU-SY dataset from a local directory
#[derive(Debug)]
pub struct XjtuSource {
    root: PathBuf,
    model: FaultFrequencyModel,
}

impl XjtuSource {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        let root = root.into();
        info!("XJTU-SY source at {}", root.display());
        Ok(Self {
            root,
            model: xjtu_ldk_uer204()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bearing(folder: &str) -> Option<&'static XjtuBearing> {
        XJTU_BEARINGS.iter().find(|b| b.folder == folder)
    }
}

impl RecordingSource for XjtuSource {
    fn name(&self) -> &str {
        "xjtu"
    }

    fn list(&self) -> Result<Vec<RecordingHandle>, DatasetError> {
        let mut handles = Vec::new();

        for bearing in &XJTU_BEARINGS {
            let dir = self.root.join(bearing.folder);
            if !dir.is_dir() {
                debug!("Skipping missing bearing folder {}", dir.display());
                continue;
            }

            let mut idx: u32 = 1;
            while dir.join(format!("{idx}.csv")).is_file() {
                handles.push(RecordingHandle {
                    source: DataSource::Xjtu,
                    group: bearing.folder.to_string(),
                    relative_path: format!("{}/{idx}.csv", bearing.folder),
                    file_idx: Some(idx),
                });
                idx += 1;
            }
            debug!("{}: {} files", bearing.name(), idx - 1);
        }

        info!("XJTU-SY: {} recordings listed", handles.len());
        Ok(handles)
    }

    fn load(&self, handle: &RecordingHandle) -> Result<Vec<Recording>, DatasetError> {
        let bearing = Self::bearing(&handle.group)
            .ok_or_else(|| DatasetError::UnknownRecording(handle.relative_path.clone()))?;

        let path = self.root.join(&handle.relative_path);
        let mut table = CsvTable::read(&path)?;

        let mut recordings = Vec::with_capacity(2);
        for (column, channel) in [(HORIZONTAL_COLUMN, "H"), (VERTICAL_COLUMN, "V")] {
            let samples = table
                .take_column(column)
                .ok_or_else(|| DatasetError::MissingColumn {
                    path: path.clone(),
                    column: column.to_string(),
                })?;

            let mut recording = Recording::new(
                DataSource::Xjtu,
                handle.relative_path.clone(),
                channel,
                samples,
                XJTU_SAMPLE_RATE,
                bearing.rotation_hz,
            )
            .with_fault_model(self.model.clone())
            .with_bearing_name(bearing.name())
            .with_labelled_faults(bearing.faults);
            if let Some(idx) = handle.file_idx {
                recording = recording.with_file_idx(idx);
            }
            recordings.push(recording);
        }

        Ok(recordings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_file(root: &Path, folder: &str, idx: u32, rows: usize) {
        let dir = root.join(folder);
        fs::create_dir_all(&dir).unwrap();
        let mut text = format!("{HORIZONTAL_COLUMN},{VERTICAL_COLUMN}\n");
        for i in 0..rows {
            text.push_str(&format!("{},{}\n", i as f64 * 0.1, -(i as f64) * 0.2));
        }
        fs::write(dir.join(format!("{idx}.csv")), text).unwrap();
    }

    #[test]
    fn test_bearing_table() {
        assert_eq!(XJTU_BEARINGS.len(), 15);
        assert_eq!(XJTU_BEARINGS[0].name(), "Bearing1_1");
        assert!(XJTU_BEARINGS[4].faults.contains(FaultKind::Inner));
        assert!(XJTU_BEARINGS[4].faults.contains(FaultKind::Outer));
        assert_eq!(XJTU_BEARINGS[11].faults.bits(), 0x0F);
        assert_eq!(XJTU_BEARINGS[7].faults, FaultSet::of(&[FaultKind::Cage]));
    }

    #[test]
    fn test_list_stops_at_first_gap() {
        let tmp = tempfile::tempdir().unwrap();
        for idx in [1, 2, 3, 5] {
            write_file(tmp.path(), "35Hz12kN/Bearing1_1", idx, 4);
        }
        write_file(tmp.path(), "40Hz10Kn/Bearing3_5", 1, 4);

        let source = XjtuSource::new(tmp.path()).unwrap();
        let handles = source.list().unwrap();
        assert_eq!(handles.len(), 4);
        assert_eq!(handles[2].relative_path, "35Hz12kN/Bearing1_1/3.csv");
        assert_eq!(handles[3].group, "40Hz10Kn/Bearing3_5");
    }

    #[test]
    fn test_load_channels() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "37.5Hz11Kn/Bearing2_1", 1, 8);

        let source = XjtuSource::new(tmp.path()).unwrap();
        let handle = &source.list().unwrap()[0];
        let recordings = source.load(handle).unwrap();

        assert_eq!(recordings.len(), 2);
        let h = &recordings[0];
        assert_eq!(h.channel, "H");
        assert_eq!(h.samples.len(), 8);
        assert_eq!(h.sample_rate, XJTU_SAMPLE_RATE);
        assert_eq!(h.rotation_rate, 37.5);
        assert_eq!(h.bearing_name.as_deref(), Some("Bearing2_1"));
        assert_eq!(h.file_idx, Some(1));
        assert!(h.labelled_faults.contains(FaultKind::Inner));
        assert_eq!(h.fault_model.as_ref().unwrap().rotation_rate(), 0.0);
        assert_eq!(recordings[1].channel, "V");
        assert_eq!(recordings[1].samples[1], -0.2);
    }

    #[test]
    fn test_missing_column() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("35Hz12kN/Bearing1_2");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("1.csv"), format!("{HORIZONTAL_COLUMN}\n0.1\n0.2\n")).unwrap();

        let source = XjtuSource::new(tmp.path()).unwrap();
        let handle = &source.list().unwrap()[0];
        assert!(matches!(
            source.load(handle),
            Err(DatasetError::MissingColumn { .. })
        ));
    }
}
