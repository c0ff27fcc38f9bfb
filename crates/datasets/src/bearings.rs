//! Fault-frequency ratios of the dataset test bearings

use signal_model::{FaultFrequencyModel, SignalError};

/// LDK UER204 deep-groove bearing used in the XJTU-SY run-to-failure rig
pub fn xjtu_ldk_uer204() -> Result<FaultFrequencyModel, SignalError> {
    FaultFrequencyModel::from_geometry(8, 7.92, 34.55, 0.0)
}

/// SKF 6205-2RS JEM drive-end bearing of the CWRU rig (12 kHz records)
pub fn cwru_drive_end() -> Result<FaultFrequencyModel, SignalError> {
    FaultFrequencyModel::new(3.5848, 5.4152, 0.39828, 4.7135)
}

/// Drive-end bearing ratios as published for the 48 kHz records
pub fn cwru_drive_end_48k() -> Result<FaultFrequencyModel, SignalError> {
    FaultFrequencyModel::new(3.5848, 5.4152, 0.39828, 4.713)
}

/// SKF 6203-2RS JEM fan-end bearing of the CWRU rig
pub fn cwru_fan_end() -> Result<FaultFrequencyModel, SignalError> {
    FaultFrequencyModel::new(3.0530, 4.9469, 0.3817, 3.9874)
}
