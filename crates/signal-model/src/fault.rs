//! Bearing Fault Kinds and Characteristic Frequencies

use crate::SignalError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bearing component a defect can sit on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultKind {
    /// Inner race (ball-pass frequency inner)
    Inner,
    /// Outer race (ball-pass frequency outer)
    Outer,
    /// Rolling element (ball-spin frequency)
    Ball,
    /// Cage (fundamental train frequency)
    Cage,
}

impl FaultKind {
    /// All kinds in diagnosis order
    pub const ALL: [FaultKind; 4] = [
        FaultKind::Inner,
        FaultKind::Outer,
        FaultKind::Ball,
        FaultKind::Cage,
    ];

    /// Bit used in [`FaultSet`]
    pub const fn bit(self) -> u8 {
        match self {
            FaultKind::Inner => 1,
            FaultKind::Outer => 2,
            FaultKind::Ball => 4,
            FaultKind::Cage => 8,
        }
    }

    /// Name of the characteristic frequency for this kind
    pub const fn frequency_label(self) -> &'static str {
        match self {
            FaultKind::Inner => "BPFI",
            FaultKind::Outer => "BPFO",
            FaultKind::Ball => "BSF",
            FaultKind::Cage => "FTF",
        }
    }

    /// Lowercase component name
    pub const fn name(self) -> &'static str {
        match self {
            FaultKind::Inner => "inner",
            FaultKind::Outer => "outer",
            FaultKind::Ball => "ball",
            FaultKind::Cage => "cage",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.frequency_label())
    }
}

/// Set of fault kinds, stored as bit flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaultSet(u8);

impl FaultSet {
    /// No faults
    pub const EMPTY: FaultSet = FaultSet(0);

    /// Build a set from kinds
    pub fn of(kinds: &[FaultKind]) -> Self {
        kinds.iter().fold(Self::EMPTY, |set, &k| set.with(k))
    }

    /// Raw bit representation
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Build from raw bits, ignoring unknown bits
    pub const fn from_bits(bits: u8) -> Self {
        FaultSet(bits & 0x0F)
    }

    /// Return a copy with `kind` added
    pub const fn with(self, kind: FaultKind) -> Self {
        FaultSet(self.0 | kind.bit())
    }

    /// Add a kind in place
    pub fn insert(&mut self, kind: FaultKind) {
        self.0 |= kind.bit();
    }

    /// Whether `kind` is in the set
    pub const fn contains(self, kind: FaultKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Whether the set is empty
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate kinds in diagnosis order
    pub fn iter(self) -> impl Iterator<Item = FaultKind> {
        FaultKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl fmt::Display for FaultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.iter().map(FaultKind::name).collect();
        f.write_str(&names.join("|"))
    }
}

/// Characteristic defect-frequency ratios of a bearing, scaled by shaft speed.
///
/// The four ratios are multiples of the shaft rotational frequency and are
/// fixed at construction. `rotation_rate` (revolutions per second) is the only
/// value that changes per recording; every derived frequency reads as `0.0`
/// until a rate has been assigned with [`FaultFrequencyModel::with_rotation_rate`].
///
/// `Clone` copies the ratios but resets the rotation rate, so each recording
/// starts from a clean instance:
///
/// ```
/// use signal_model::FaultFrequencyModel;
///
/// let model = FaultFrequencyModel::new(3.5848, 5.4152, 0.3983, 4.7135)
///     .unwrap()
///     .with_rotation_rate(1730.0 / 60.0)
///     .unwrap();
/// assert!((model.bpfo() - 103.36).abs() < 1e-2);
/// assert_eq!(model.clone().rotation_rate(), 0.0);
/// ```
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFaultFrequencyModel")]
pub struct FaultFrequencyModel {
    bpfo_ratio: f64,
    bpfi_ratio: f64,
    ftf_ratio: f64,
    bsf_ratio: f64,
    rotation_rate: f64,
}

/// Unchecked wire form, validated through the constructors
#[derive(Deserialize)]
struct RawFaultFrequencyModel {
    bpfo_ratio: f64,
    bpfi_ratio: f64,
    ftf_ratio: f64,
    bsf_ratio: f64,
    #[serde(default)]
    rotation_rate: f64,
}

impl TryFrom<RawFaultFrequencyModel> for FaultFrequencyModel {
    type Error = SignalError;

    fn try_from(raw: RawFaultFrequencyModel) -> Result<Self, Self::Error> {
        Self::new(raw.bpfo_ratio, raw.bpfi_ratio, raw.ftf_ratio, raw.bsf_ratio)?
            .with_rotation_rate(raw.rotation_rate)
    }
}

impl FaultFrequencyModel {
    /// Create a model from the four defect-frequency ratios
    pub fn new(
        bpfo_ratio: f64,
        bpfi_ratio: f64,
        ftf_ratio: f64,
        bsf_ratio: f64,
    ) -> Result<Self, SignalError> {
        for (name, value) in [
            ("bpfo_ratio", bpfo_ratio),
            ("bpfi_ratio", bpfi_ratio),
            ("ftf_ratio", ftf_ratio),
            ("bsf_ratio", bsf_ratio),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SignalError::InvalidParameter(format!(
                    "{name} must be a non-negative finite number, got {value}"
                )));
            }
        }

        Ok(Self {
            bpfo_ratio,
            bpfi_ratio,
            ftf_ratio,
            bsf_ratio,
            rotation_rate: 0.0,
        })
    }

    /// Derive ratios from rolling-element bearing geometry.
    ///
    /// * `ball_count` - number of rolling elements
    /// * `ball_diameter` / `pitch_diameter` - in the same length unit
    /// * `contact_angle_deg` - contact angle in degrees
    pub fn from_geometry(
        ball_count: u32,
        ball_diameter: f64,
        pitch_diameter: f64,
        contact_angle_deg: f64,
    ) -> Result<Self, SignalError> {
        if ball_count == 0 {
            return Err(SignalError::InvalidParameter(
                "ball_count must be at least 1".into(),
            ));
        }
        if !(ball_diameter > 0.0 && pitch_diameter > ball_diameter) {
            return Err(SignalError::InvalidParameter(format!(
                "expected 0 < ball_diameter < pitch_diameter, got {ball_diameter} / {pitch_diameter}"
            )));
        }

        let n = ball_count as f64;
        let ratio = ball_diameter / pitch_diameter * contact_angle_deg.to_radians().cos();

        Self::new(
            n / 2.0 * (1.0 - ratio),
            n / 2.0 * (1.0 + ratio),
            0.5 * (1.0 - ratio),
            pitch_diameter / ball_diameter * (1.0 - ratio * ratio),
        )
    }

    /// Return this model with the shaft speed set (revolutions per second)
    pub fn with_rotation_rate(mut self, rate: f64) -> Result<Self, SignalError> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(SignalError::InvalidParameter(format!(
                "rotation rate must be a non-negative finite number, got {rate}"
            )));
        }
        self.rotation_rate = rate;
        Ok(self)
    }

    /// Shaft speed in revolutions per second
    pub fn rotation_rate(&self) -> f64 {
        self.rotation_rate
    }

    pub fn bpfo_ratio(&self) -> f64 {
        self.bpfo_ratio
    }

    pub fn bpfi_ratio(&self) -> f64 {
        self.bpfi_ratio
    }

    pub fn ftf_ratio(&self) -> f64 {
        self.ftf_ratio
    }

    pub fn bsf_ratio(&self) -> f64 {
        self.bsf_ratio
    }

    /// Ball-pass frequency, outer race (Hz)
    pub fn bpfo(&self) -> f64 {
        self.bpfo_ratio * self.rotation_rate
    }

    /// Ball-pass frequency, inner race (Hz)
    pub fn bpfi(&self) -> f64 {
        self.bpfi_ratio * self.rotation_rate
    }

    /// Fundamental train (cage) frequency (Hz)
    pub fn ftf(&self) -> f64 {
        self.ftf_ratio * self.rotation_rate
    }

    /// Ball-spin frequency (Hz)
    pub fn bsf(&self) -> f64 {
        self.bsf_ratio * self.rotation_rate
    }

    /// Characteristic frequency for a fault kind (Hz)
    pub fn frequency(&self, kind: FaultKind) -> f64 {
        match kind {
            FaultKind::Inner => self.bpfi(),
            FaultKind::Outer => self.bpfo(),
            FaultKind::Ball => self.bsf(),
            FaultKind::Cage => self.ftf(),
        }
    }
}

impl Clone for FaultFrequencyModel {
    /// Copies the ratios; the clone starts with a rotation rate of zero.
    fn clone(&self) -> Self {
        Self {
            bpfo_ratio: self.bpfo_ratio,
            bpfi_ratio: self.bpfi_ratio,
            ftf_ratio: self.ftf_ratio,
            bsf_ratio: self.bsf_ratio,
            rotation_rate: 0.0,
        }
    }
}

impl fmt::Display for FaultFrequencyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bpfi:{:.3} bpfo:{:.3} ftf:{:.3} bsf:{:.3} rps:{:.3}",
            self.bpfi(),
            self.bpfo(),
            self.ftf(),
            self.bsf(),
            self.rotation_rate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cwru_drive_end() -> FaultFrequencyModel {
        FaultFrequencyModel::new(3.5848, 5.4152, 0.3983, 4.7135).unwrap()
    }

    #[test]
    fn test_bpfo_at_1730_rpm() {
        let model = cwru_drive_end().with_rotation_rate(1730.0 / 60.0).unwrap();
        assert!((model.bpfo() - 103.36).abs() < 1e-2);
        assert!((model.bpfi() - 5.4152 * 1730.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_frequencies_zero_before_rate_set() {
        let model = cwru_drive_end();
        assert_eq!(model.rotation_rate(), 0.0);
        for kind in FaultKind::ALL {
            assert_eq!(model.frequency(kind), 0.0);
        }
    }

    #[test]
    fn test_negative_ratio_rejected() {
        let err = FaultFrequencyModel::new(3.5, -1.0, 0.4, 4.7).unwrap_err();
        assert!(matches!(err, SignalError::InvalidParameter(_)));
        assert!(FaultFrequencyModel::new(f64::NAN, 1.0, 0.4, 4.7).is_err());
    }

    #[test]
    fn test_negative_rate_rejected() {
        let err = cwru_drive_end().with_rotation_rate(-1.0).unwrap_err();
        assert!(matches!(err, SignalError::InvalidParameter(_)));
    }

    #[test]
    fn test_deserialize_validates() {
        let model: FaultFrequencyModel = serde_json::from_str(
            r#"{"bpfo_ratio":3.5848,"bpfi_ratio":5.4152,"ftf_ratio":0.3983,"bsf_ratio":4.7135,"rotation_rate":29.0}"#,
        )
        .unwrap();
        assert_eq!(model.rotation_rate(), 29.0);
        assert_eq!(model.bpfo_ratio(), 3.5848);

        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(serde_json::from_str::<FaultFrequencyModel>(&json).unwrap(), model);

        let without_rate: FaultFrequencyModel = serde_json::from_str(
            r#"{"bpfo_ratio":3.5,"bpfi_ratio":5.4,"ftf_ratio":0.4,"bsf_ratio":4.7}"#,
        )
        .unwrap();
        assert_eq!(without_rate.rotation_rate(), 0.0);

        assert!(serde_json::from_str::<FaultFrequencyModel>(
            r#"{"bpfo_ratio":-3.5,"bpfi_ratio":5.4,"ftf_ratio":0.4,"bsf_ratio":4.7}"#
        )
        .is_err());
        assert!(serde_json::from_str::<FaultFrequencyModel>(
            r#"{"bpfo_ratio":3.5,"bpfi_ratio":5.4,"ftf_ratio":0.4,"bsf_ratio":4.7,"rotation_rate":-10.0}"#
        )
        .is_err());
    }

    #[test]
    fn test_clone_resets_rate_and_is_independent() {
        let original = cwru_drive_end().with_rotation_rate(30.0).unwrap();
        let clone = original.clone();

        assert_eq!(clone.rotation_rate(), 0.0);
        assert_eq!(clone.bpfo_ratio(), original.bpfo_ratio());
        assert_eq!(clone.bpfi_ratio(), original.bpfi_ratio());
        assert_eq!(clone.ftf_ratio(), original.ftf_ratio());
        assert_eq!(clone.bsf_ratio(), original.bsf_ratio());

        let clone = clone.with_rotation_rate(10.0).unwrap();
        assert_eq!(clone.rotation_rate(), 10.0);
        assert_eq!(original.rotation_rate(), 30.0);
    }

    #[test]
    fn test_from_geometry_matches_xjtu_ratios() {
        // LDK UER204: 8 balls, 7.92 mm ball, 34.55 mm pitch
        let model = FaultFrequencyModel::from_geometry(8, 7.92, 34.55, 0.0).unwrap();
        let r = 7.92 / 34.55;
        assert!((model.bpfo_ratio() - 4.0 * (1.0 - r)).abs() < 1e-12);
        assert!((model.bpfi_ratio() - 4.0 * (1.0 + r)).abs() < 1e-12);
        assert!((model.ftf_ratio() - 0.5 * (1.0 - r)).abs() < 1e-12);
        assert!((model.bsf_ratio() - 34.55 / 7.92 * (1.0 - r * r)).abs() < 1e-12);
    }

    #[test]
    fn test_from_geometry_rejects_bad_dimensions() {
        assert!(FaultFrequencyModel::from_geometry(0, 7.9, 34.5, 0.0).is_err());
        assert!(FaultFrequencyModel::from_geometry(8, 40.0, 34.5, 0.0).is_err());
    }

    #[test]
    fn test_fault_set_bits() {
        let set = FaultSet::of(&[FaultKind::Outer, FaultKind::Inner]);
        assert_eq!(set.bits(), 3);
        assert!(set.contains(FaultKind::Inner));
        assert!(!set.contains(FaultKind::Cage));
        assert_eq!(set.to_string(), "inner|outer");
        assert_eq!(FaultSet::EMPTY.to_string(), "none");
        assert_eq!(FaultSet::from_bits(0xFF).bits(), 0x0F);
    }

    proptest! {
        #[test]
        fn prop_derived_frequencies_scale_linearly(rate in 0.0f64..200.0) {
            let model = cwru_drive_end().with_rotation_rate(rate).unwrap();
            prop_assert!((model.bpfo() - 3.5848 * rate).abs() < 1e-9);
            prop_assert!((model.bsf() - 4.7135 * rate).abs() < 1e-9);
            prop_assert_eq!(model.clone().rotation_rate(), 0.0);
        }
    }
}
