use serde::{Deserialize, Serialize};

use crate::error::{OverlapError, Result};

/// Default opening distance, in CRS units
pub const DEFAULT_OPENING_DISTANCE: f64 = 10.0;

/// Default minimum intersection area (about one hectare in metric CRS)
pub const DEFAULT_MIN_AREA: f64 = 10_000.0;

/// What to do when the two collections carry different CRS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CrsPolicy {
    /// Fail with a CRS mismatch error
    #[default]
    Reject,
    /// Relabel the right collection with the left CRS without moving coordinates
    Override,
    /// Transform the right collection's coordinates into the left CRS
    Reproject,
}

/// Geometry validation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ValidityMode {
    /// Reject collections containing invalid geometries
    Strict,
    /// Log invalid geometries and keep going
    #[default]
    Lenient,
}

/// Parameters of an intersection check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckParams {
    /// Erosion/dilation distance `d` of the morphological opening
    pub opening_distance: f64,

    /// Minimum intersection area for a valid overlap
    pub min_area: f64,

    pub crs_policy: CrsPolicy,

    pub validity_mode: ValidityMode,
}

impl Default for CheckParams {
    fn default() -> Self {
        Self {
            opening_distance: DEFAULT_OPENING_DISTANCE,
            min_area: DEFAULT_MIN_AREA,
            crs_policy: CrsPolicy::default(),
            validity_mode: ValidityMode::default(),
        }
    }
}

impl CheckParams {
    pub fn new(opening_distance: f64, min_area: f64) -> Self {
        Self { opening_distance, min_area, ..Default::default() }
    }

    pub fn crs_policy(mut self, policy: CrsPolicy) -> Self {
        self.crs_policy = policy;
        self
    }

    pub fn validity_mode(mut self, mode: ValidityMode) -> Self {
        self.validity_mode = mode;
        self
    }

    /// Reject values the engine cannot compute with.
    ///
    /// A non-positive opening distance is accepted: the opening then
    /// degenerates toward the identity.
    pub fn validate(&self) -> Result<()> {
        if !self.opening_distance.is_finite() {
            return Err(OverlapError::InvalidParameter {
                name: "opening_distance".to_string(),
                reason: format!("must be finite, got {}", self.opening_distance),
            });
        }
        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return Err(OverlapError::InvalidParameter {
                name: "min_area".to_string(),
                reason: format!("must be a finite non-negative area, got {}", self.min_area),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = CheckParams::default();
        assert_eq!(params.opening_distance, 10.0);
        assert_eq!(params.min_area, 10_000.0);
        assert_eq!(params.crs_policy, CrsPolicy::Reject);
        assert_eq!(params.validity_mode, ValidityMode::Lenient);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        assert!(CheckParams::new(f64::NAN, 1.0).validate().is_err());
        assert!(CheckParams::new(1.0, f64::INFINITY).validate().is_err());
        assert!(CheckParams::new(1.0, -5.0).validate().is_err());
    }

    #[test]
    fn test_validate_accepts_non_positive_distance() {
        assert!(CheckParams::new(0.0, 0.0).validate().is_ok());
        assert!(CheckParams::new(-3.0, 100.0).validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let params = CheckParams::new(5.0, 250.0)
            .crs_policy(CrsPolicy::Override)
            .validity_mode(ValidityMode::Strict);
        assert_eq!(params.crs_policy, CrsPolicy::Override);
        assert_eq!(params.validity_mode, ValidityMode::Strict);
    }
}
