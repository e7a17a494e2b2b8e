//! Projection of the rolling window onto a fixed number of display slots.

use super::buffer::{Sample, Snapshot};
use super::scaler::ScalingProfile;

/// Every `BASELINE_STRIDE`-th slot carries the idle baseline.
const BASELINE_STRIDE: usize = 4;

/// Maps buffer snapshots onto `slot_count` scaled bar amplitudes.
///
/// Slot 0 is the oldest shown sample, slot `N - 1` the newest.
#[derive(Debug, Clone)]
pub struct BarProjector {
    slot_count: usize,
    baseline_level: f32,
}

impl BarProjector {
    pub fn new(slot_count: usize, baseline_level: f32) -> Self {
        Self {
            slot_count,
            baseline_level,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn set_slot_count(&mut self, slot_count: usize) {
        self.slot_count = slot_count;
    }

    /// Resolves every slot for the current render tick.
    ///
    /// Deterministic: the same snapshot and slot count give the same bars.
    pub fn project(&self, snapshot: &Snapshot<'_>, profile: &ScalingProfile) -> Vec<f32> {
        let n = self.slot_count;
        let len = snapshot.len();

        if len == 0 {
            return self.baseline();
        }

        let resolve = |index: usize| -> f32 {
            snapshot
                .get(index)
                .map_or(0.0, |sample: &Sample| profile.scale(sample.level))
        };

        if len >= n {
            // Tail-sample: the newest N samples, oldest on the left.
            let start = len - n;
            (0..n).map(|i| resolve(start + i)).collect()
        } else {
            // Stretch-sample: nearest neighbour, floor(i / N * len).
            (0..n).map(|i| resolve(i * len / n)).collect()
        }
    }

    /// Sparse low frame shown while there is nothing to draw.
    pub fn baseline(&self) -> Vec<f32> {
        (0..self.slot_count)
            .map(|i| {
                if i % BASELINE_STRIDE == BASELINE_STRIDE - 1 {
                    self.baseline_level
                } else {
                    0.0
                }
            })
            .collect()
    }
}

/// Scales the newest sample's retained band vector, if there is one.
pub fn project_bands(snapshot: &Snapshot<'_>, profile: &ScalingProfile) -> Option<Vec<f32>> {
    snapshot
        .newest()
        .and_then(|sample| sample.bands.as_ref())
        .map(|bands| bands.as_slice().iter().map(|&b| profile.scale(b)).collect())
}
