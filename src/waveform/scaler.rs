//! Piecewise level-to-amplitude scaling.
//!
//! Raw levels from different capture sources differ in magnitude and noise
//! floor, so each source class gets its own breakpoint table. Silence must stay
//! visible and speech must not clip.

use serde::{Deserialize, Serialize};

use super::error::ProfileError;

/// Slack allowed when checking that consecutive intervals do not step down.
const MONOTONIC_TOLERANCE: f32 = 1e-4;

/// One interval `[threshold_low, threshold_high)` of a scaling profile.
///
/// Inside the interval the output is `offset + (level - threshold_low) * slope`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub threshold_low: f32,
    pub threshold_high: f32,
    pub offset: f32,
    pub slope: f32,
}

impl Breakpoint {
    pub const fn new(threshold_low: f32, threshold_high: f32, offset: f32, slope: f32) -> Self {
        Self {
            threshold_low,
            threshold_high,
            offset,
            slope,
        }
    }

    /// Output value at the top of the interval.
    fn end_value(&self) -> f32 {
        self.offset + (self.threshold_high - self.threshold_low) * self.slope
    }

    fn apply(&self, level: f32) -> f32 {
        self.offset + (level - self.threshold_low) * self.slope
    }
}

/// Capture source class used to pick a built-in profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScalingProfileId {
    /// Browser-style capture: quiet levels, low noise floor
    Web,
    /// Native driver capture: hotter levels, higher noise floor
    #[default]
    Native,
}

impl std::fmt::Display for ScalingProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Web => write!(f, "web"),
            Self::Native => write!(f, "native"),
        }
    }
}

const WEB_BREAKPOINTS: [Breakpoint; 3] = [
    Breakpoint::new(0.0, 0.05, 0.05, 2.0),
    Breakpoint::new(0.05, 0.2, 0.15, 2.666_666_7),
    Breakpoint::new(0.2, 1.0, 0.55, 0.5625),
];

const NATIVE_BREAKPOINTS: [Breakpoint; 3] = [
    Breakpoint::new(0.0, 0.1, 0.05, 1.0),
    Breakpoint::new(0.1, 0.4, 0.15, 1.0),
    Breakpoint::new(0.4, 1.0, 0.45, 0.916_666_7),
];

/// Immutable, validated piecewise-linear mapping from level to visual amplitude.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingProfile {
    breakpoints: Vec<Breakpoint>,
}

impl ScalingProfile {
    /// Builds a profile from user-supplied breakpoints.
    ///
    /// # Errors
    /// - If the table is empty, does not span `[0, 1]`, has gaps, or steps down
    pub fn new(breakpoints: Vec<Breakpoint>) -> Result<Self, ProfileError> {
        validate_breakpoints(&breakpoints)?;
        Ok(Self { breakpoints })
    }

    /// Returns the built-in profile for a source class.
    pub fn builtin(id: ScalingProfileId) -> Self {
        let table = match id {
            ScalingProfileId::Web => &WEB_BREAKPOINTS,
            ScalingProfileId::Native => &NATIVE_BREAKPOINTS,
        };
        Self {
            breakpoints: table.to_vec(),
        }
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Maps a normalized level to a visual amplitude in `[0, 1]`.
    ///
    /// Levels outside `[0, 1]` are clamped first; NaN is treated as silence.
    pub fn scale(&self, level: f32) -> f32 {
        let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };

        let interval = self
            .breakpoints
            .iter()
            .find(|bp| level < bp.threshold_high)
            .or_else(|| self.breakpoints.last());

        match interval {
            Some(bp) => bp.apply(level).clamp(0.0, 1.0),
            None => level,
        }
    }
}

/// Scales `level` under `profile`.
pub fn scale(level: f32, profile: &ScalingProfile) -> f32 {
    profile.scale(level)
}

fn validate_breakpoints(breakpoints: &[Breakpoint]) -> Result<(), ProfileError> {
    let (first, last) = match (breakpoints.first(), breakpoints.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ProfileError::Empty),
    };

    for (index, bp) in breakpoints.iter().enumerate() {
        let values = [bp.threshold_low, bp.threshold_high, bp.offset, bp.slope];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ProfileError::NonFinite { index });
        }
        if bp.threshold_high <= bp.threshold_low {
            return Err(ProfileError::Inverted { index });
        }
        if bp.slope < 0.0 {
            return Err(ProfileError::NegativeSlope {
                index,
                slope: bp.slope,
            });
        }
    }

    if first.threshold_low != 0.0 {
        return Err(ProfileError::BadStart(first.threshold_low));
    }
    if last.threshold_high != 1.0 {
        return Err(ProfileError::BadEnd(last.threshold_high));
    }

    for (index, pair) in breakpoints.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        let index = index + 1;
        if (next.threshold_low - prev.threshold_high).abs() > f32::EPSILON {
            return Err(ProfileError::Gap { index });
        }
        if next.offset + MONOTONIC_TOLERANCE < prev.end_value() {
            return Err(ProfileError::NotMonotonic { index });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_builtin_profiles_are_valid() {
        for id in [ScalingProfileId::Web, ScalingProfileId::Native] {
            let profile = ScalingProfile::builtin(id);
            assert!(
                ScalingProfile::new(profile.breakpoints().to_vec()).is_ok(),
                "built-in profile {id} should validate"
            );
        }
    }

    #[test]
    fn test_scale_inside_intervals() {
        let native = ScalingProfile::builtin(ScalingProfileId::Native);
        assert_relative_eq!(native.scale(0.0), 0.05);
        assert_relative_eq!(native.scale(0.3), 0.35, epsilon = 1e-6);
        assert_relative_eq!(native.scale(1.0), 1.0, epsilon = 1e-6);

        let web = ScalingProfile::builtin(ScalingProfileId::Web);
        assert_relative_eq!(web.scale(0.3), 0.60625, epsilon = 1e-6);
    }

    #[test]
    fn test_scale_clamps_out_of_range_input() {
        let profile = ScalingProfile::builtin(ScalingProfileId::Web);
        assert_relative_eq!(profile.scale(-3.0), profile.scale(0.0));
        assert_relative_eq!(profile.scale(7.0), profile.scale(1.0));
        assert_relative_eq!(profile.scale(f32::NAN), profile.scale(0.0));
    }

    #[test]
    fn test_scale_is_monotonic() {
        for id in [ScalingProfileId::Web, ScalingProfileId::Native] {
            let profile = ScalingProfile::builtin(id);
            let mut previous = profile.scale(0.0);
            for step in 1..=1000 {
                let value = profile.scale(step as f32 / 1000.0);
                assert!(
                    value + 1e-5 >= previous,
                    "{id} profile decreased at level {}",
                    step as f32 / 1000.0
                );
                previous = value;
            }
        }
    }

    #[test]
    fn test_rejects_empty_profile() {
        assert_eq!(ScalingProfile::new(vec![]), Err(ProfileError::Empty));
    }

    #[test]
    fn test_rejects_gap_between_intervals() {
        let result = ScalingProfile::new(vec![
            Breakpoint::new(0.0, 0.3, 0.0, 1.0),
            Breakpoint::new(0.4, 1.0, 0.4, 1.0),
        ]);
        assert_eq!(result, Err(ProfileError::Gap { index: 1 }));
    }

    #[test]
    fn test_rejects_bad_bounds() {
        let result = ScalingProfile::new(vec![Breakpoint::new(0.1, 1.0, 0.0, 1.0)]);
        assert_eq!(result, Err(ProfileError::BadStart(0.1)));

        let result = ScalingProfile::new(vec![Breakpoint::new(0.0, 0.9, 0.0, 1.0)]);
        assert_eq!(result, Err(ProfileError::BadEnd(0.9)));
    }

    #[test]
    fn test_rejects_step_down() {
        let result = ScalingProfile::new(vec![
            Breakpoint::new(0.0, 0.5, 0.0, 1.0),
            Breakpoint::new(0.5, 1.0, 0.2, 1.0),
        ]);
        assert_eq!(result, Err(ProfileError::NotMonotonic { index: 1 }));
    }

    #[test]
    fn test_rejects_negative_slope() {
        let result = ScalingProfile::new(vec![Breakpoint::new(0.0, 1.0, 1.0, -0.5)]);
        assert_eq!(
            result,
            Err(ProfileError::NegativeSlope {
                index: 0,
                slope: -0.5
            })
        );
    }
}
