use super::DescriptorError;

/// Width of one distance bucket in Angstrom.
pub const DISTANCE_BIN_WIDTH: f64 = 1.0;
/// Exclusive upper bound of the encodable distance domain in Angstrom.
pub const DISTANCE_MAX: f64 = 64.0;
/// Number of distance buckets; bucket `i` covers `[i, i + 1)` Angstrom.
pub const DISTANCE_BIN_COUNT: u8 = 64;

/// Width of one angle bucket in degrees.
pub const ANGLE_BIN_WIDTH: f64 = 20.0;
/// Inclusive upper bound of the angle domain in degrees.
pub const ANGLE_MAX: f64 = 180.0;
/// Number of angle buckets; bucket `i` covers `[20i, 20(i + 1))` degrees,
/// with the closing value 180 falling into the last bucket.
pub const ANGLE_BIN_COUNT: u8 = 9;

/// Discretized inter-anchor distance, monotonic in the real value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DistanceBin(u8);

impl DistanceBin {
    pub fn from_value(distance: f64) -> Result<Self, DescriptorError> {
        if !distance.is_finite() || distance < 0.0 || distance >= DISTANCE_MAX {
            return Err(DescriptorError::OutOfDomain {
                kind: "distance",
                value: distance,
            });
        }
        Ok(Self((distance / DISTANCE_BIN_WIDTH) as u8))
    }

    pub fn from_index(index: u8) -> Option<Self> {
        (index < DISTANCE_BIN_COUNT).then_some(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn lower_bound(self) -> f64 {
        self.0 as f64 * DISTANCE_BIN_WIDTH
    }

    pub fn upper_bound(self) -> f64 {
        (self.0 + 1) as f64 * DISTANCE_BIN_WIDTH
    }

    /// Neighboring bucket at a signed offset; `None` past either end of the
    /// domain (no representable geometry there).
    pub fn offset(self, delta: i16) -> Option<Self> {
        let shifted = self.0 as i16 + delta;
        (0..DISTANCE_BIN_COUNT as i16)
            .contains(&shifted)
            .then_some(Self(shifted as u8))
    }
}

/// Discretized inter-residue angle in `[0, 180]` degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AngleBin(u8);

impl AngleBin {
    pub fn from_value(angle_degrees: f64) -> Result<Self, DescriptorError> {
        if !angle_degrees.is_finite() || !(0.0..=ANGLE_MAX).contains(&angle_degrees) {
            return Err(DescriptorError::OutOfDomain {
                kind: "angle",
                value: angle_degrees,
            });
        }
        let index = ((angle_degrees / ANGLE_BIN_WIDTH) as u8).min(ANGLE_BIN_COUNT - 1);
        Ok(Self(index))
    }

    pub fn from_index(index: u8) -> Option<Self> {
        (index < ANGLE_BIN_COUNT).then_some(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn lower_bound(self) -> f64 {
        self.0 as f64 * ANGLE_BIN_WIDTH
    }

    pub fn offset(self, delta: i16) -> Option<Self> {
        let shifted = self.0 as i16 + delta;
        (0..ANGLE_BIN_COUNT as i16)
            .contains(&shifted)
            .then_some(Self(shifted as u8))
    }
}
