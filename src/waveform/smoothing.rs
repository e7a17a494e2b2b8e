//! Short moving-average filters that take the jitter out of incoming samples.

use std::collections::VecDeque;

use super::normalizer::BandVector;

/// Moving average over the last `window` values of a single band.
#[derive(Debug, Clone)]
pub struct SmoothingFilter {
    window: usize,
    history: VecDeque<f32>,
}

impl SmoothingFilter {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            history: VecDeque::with_capacity(window),
        }
    }

    /// Pushes a raw value and returns the mean of the retained values.
    pub fn push(&mut self, value: f32) -> f32 {
        self.history.push_back(value);
        while self.history.len() > self.window {
            self.history.pop_front();
        }
        self.history.iter().sum::<f32>() / self.history.len() as f32
    }

    /// Forgets all retained values.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// One [`SmoothingFilter`] per band. Memory is `O(bands * window)`.
#[derive(Debug, Clone)]
pub struct BandSmoother {
    filters: Vec<SmoothingFilter>,
}

impl BandSmoother {
    pub fn new(band_count: usize, window: usize) -> Self {
        Self {
            filters: (0..band_count).map(|_| SmoothingFilter::new(window)).collect(),
        }
    }

    /// Smooths every band of `bands` against its own history.
    pub fn smooth(&mut self, bands: &BandVector) -> BandVector {
        self.filters
            .iter_mut()
            .zip(bands.as_slice())
            .map(|(filter, &value)| filter.push(value))
            .collect::<Vec<_>>()
            .into()
    }

    /// Clears every band's history so a new session starts clean.
    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.iter().all(SmoothingFilter::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_filter_averages_last_k_values() {
        let mut filter = SmoothingFilter::new(3);
        assert_relative_eq!(filter.push(0.3), 0.3);
        assert_relative_eq!(filter.push(0.6), 0.45);
        assert_relative_eq!(filter.push(0.9), 0.6, epsilon = 1e-6);
        // 0.3 falls out of the window
        assert_relative_eq!(filter.push(0.0), 0.5, epsilon = 1e-6);
        assert_eq!(filter.len(), 3);
    }

    #[test]
    fn test_filter_reset_drops_history() {
        let mut filter = SmoothingFilter::new(3);
        filter.push(1.0);
        filter.push(1.0);
        filter.reset();
        assert!(filter.is_empty());
        assert_relative_eq!(filter.push(0.2), 0.2);
    }

    #[test]
    fn test_zero_window_behaves_as_passthrough() {
        let mut filter = SmoothingFilter::new(0);
        assert_relative_eq!(filter.push(0.7), 0.7);
        assert_relative_eq!(filter.push(0.1), 0.1);
    }

    #[test]
    fn test_band_smoother_is_per_band() {
        let mut smoother = BandSmoother::new(2, 2);
        smoother.smooth(&BandVector::from(vec![0.2, 1.0]));
        let out = smoother.smooth(&BandVector::from(vec![0.4, 0.0]));

        assert_relative_eq!(out.as_slice()[0], 0.3, epsilon = 1e-6);
        assert_relative_eq!(out.as_slice()[1], 0.5, epsilon = 1e-6);

        smoother.reset();
        assert!(smoother.is_empty());
    }
}
