//! Conversion of heterogeneous producer payloads into fixed-width band vectors.
//!
//! Capture sources hand over either a single level or a band vector of whatever
//! width their analysis produced. Nothing downstream of this module ever sees
//! the original shape.

use std::f64::consts::TAU;

/// Period of the phase that drives per-band jitter for scalar input.
const JITTER_PERIOD_MS: f64 = 900.0;

/// Phase step between neighbouring bands, in radians.
const JITTER_BAND_STEP: f64 = 1.7;

/// Payload delivered by a capture source.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleInput {
    /// A single overall level in `[0, 1]`
    Level(f32),
    /// Per-band levels of arbitrary non-zero width
    Bands(Vec<f32>),
}

impl SampleInput {
    /// Builds an input from the loose callback shape `(level?, bands?)`.
    ///
    /// A non-empty band vector wins over a scalar. With neither present the
    /// result is a NaN level, which the normalizer repairs to the floor.
    pub fn from_parts(level: Option<f32>, bands: Option<Vec<f32>>) -> Self {
        match (level, bands) {
            (_, Some(bands)) if !bands.is_empty() => Self::Bands(bands),
            (Some(level), _) => Self::Level(level),
            (None, Some(bands)) => Self::Bands(bands),
            (None, None) => Self::Level(f32::NAN),
        }
    }
}

/// An ordered vector of exactly `B` band levels, each in `[floor, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BandVector(Vec<f32>);

impl BandVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reduces the vector to the single level retained in history.
    pub fn mean(&self) -> f32 {
        if self.0.is_empty() {
            return 0.0;
        }
        self.0.iter().sum::<f32>() / self.0.len() as f32
    }

    /// Multiplies every band by `factor`.
    pub fn attenuate(&mut self, factor: f32) {
        for band in &mut self.0 {
            *band *= factor;
        }
    }
}

impl From<Vec<f32>> for BandVector {
    fn from(bands: Vec<f32>) -> Self {
        Self(bands)
    }
}

/// Result of normalizing one payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub bands: BandVector,
    /// True when NaN, infinite or empty input had to be replaced by the floor
    pub repaired: bool,
}

/// Stateless converter from [`SampleInput`] to [`BandVector`].
#[derive(Debug, Clone)]
pub struct SampleNormalizer {
    band_count: usize,
    floor: f32,
    jitter: f32,
}

impl SampleNormalizer {
    /// Creates a normalizer producing `band_count` bands clamped to `[floor, 1]`.
    ///
    /// `jitter` is the relative amplitude of the deterministic per-band ripple
    /// applied to scalar input; 0 disables it.
    pub fn new(band_count: usize, floor: f32, jitter: f32) -> Self {
        Self {
            band_count,
            floor,
            jitter,
        }
    }

    /// Normalizes a payload observed at `now_ms`.
    ///
    /// Pure: the same input and time always give the same output.
    pub fn normalize(&self, input: &SampleInput, now_ms: f64) -> Normalized {
        match input {
            SampleInput::Level(level) => self.broadcast(*level, now_ms),
            SampleInput::Bands(raw) => self.resample(raw),
        }
    }

    fn broadcast(&self, level: f32, now_ms: f64) -> Normalized {
        if !level.is_finite() {
            return self.floor_vector();
        }

        let phase = (now_ms / JITTER_PERIOD_MS) * TAU;
        let bands = (0..self.band_count)
            .map(|i| {
                let ripple = (phase + i as f64 * JITTER_BAND_STEP).sin() as f32;
                self.clamp(level * (1.0 + self.jitter * ripple))
            })
            .collect();

        Normalized {
            bands: BandVector(bands),
            repaired: false,
        }
    }

    fn resample(&self, raw: &[f32]) -> Normalized {
        if raw.is_empty() {
            return self.floor_vector();
        }

        let len = raw.len();
        let mut repaired = false;
        let bands = (0..self.band_count)
            .map(|i| {
                // floor(i / B * L) without going through floats
                let value = raw[i * len / self.band_count];
                if value.is_finite() {
                    self.clamp(value)
                } else {
                    repaired = true;
                    self.floor
                }
            })
            .collect();

        Normalized {
            bands: BandVector(bands),
            repaired,
        }
    }

    fn floor_vector(&self) -> Normalized {
        Normalized {
            bands: BandVector(vec![self.floor; self.band_count]),
            repaired: true,
        }
    }

    fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.floor, 1.0)
    }
}
