//! Time-bounded history of smoothed samples.
//!
//! Samples are appended at the tail and evicted from the head, both by age and
//! by count. The count bound caps memory when a producer runs faster than the
//! configured rate.

use std::collections::VecDeque;

use super::normalizer::BandVector;

/// One retained level observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Smoothed level in `[0, 1]`
    pub level: f32,
    /// Producer timestamp in milliseconds on a monotonic session clock
    pub timestamp_ms: f64,
    /// Smoothed band vector, kept only when band retention is enabled
    pub bands: Option<BandVector>,
}

impl Sample {
    pub fn new(level: f32, timestamp_ms: f64) -> Self {
        Self {
            level,
            timestamp_ms,
            bands: None,
        }
    }

    pub fn with_bands(mut self, bands: BandVector) -> Self {
        self.bands = Some(bands);
        self
    }

    fn attenuate(&mut self, factor: f32) {
        self.level *= factor;
        if let Some(bands) = self.bands.as_mut() {
            bands.attenuate(factor);
        }
    }
}

/// Read-only view of the buffer handed to the projector.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    samples: &'a VecDeque<Sample>,
}

impl<'a> Snapshot<'a> {
    pub fn new(samples: &'a VecDeque<Sample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a Sample> {
        self.samples.get(index)
    }

    pub fn newest(&self) -> Option<&'a Sample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Sample> + 'a {
        self.samples.iter()
    }

    /// Copies the levels out, oldest first.
    pub fn levels(&self) -> Vec<f32> {
        self.samples.iter().map(|s| s.level).collect()
    }
}

/// Append-only rolling window of [`Sample`]s, ordered by insertion.
#[derive(Debug, Clone)]
pub struct RollingWindowBuffer {
    samples: VecDeque<Sample>,
    window_duration_ms: f64,
    capacity: usize,
    last_timestamp_ms: Option<f64>,
}

impl RollingWindowBuffer {
    /// Creates an empty buffer holding at most `capacity` samples no older
    /// than `window_duration_ms`.
    pub fn new(window_duration_ms: f64, capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            window_duration_ms,
            capacity,
            last_timestamp_ms: None,
        }
    }

    /// Appends `sample`, then evicts expired and surplus samples from the head.
    ///
    /// Never fails. A timestamp older than the previous one is logged and the
    /// sample is still appended at the tail.
    ///
    /// Returns the number of evicted samples.
    pub fn push(&mut self, sample: Sample, now_ms: f64) -> usize {
        if let Some(last) = self.last_timestamp_ms {
            if sample.timestamp_ms < last {
                tracing::warn!(
                    "Sample timestamp went backwards: {:.1}ms after {:.1}ms",
                    sample.timestamp_ms,
                    last
                );
            }
        }
        self.last_timestamp_ms = Some(sample.timestamp_ms);
        self.samples.push_back(sample);

        let before = self.samples.len();

        while self
            .samples
            .front()
            .is_some_and(|oldest| now_ms - oldest.timestamp_ms > self.window_duration_ms)
        {
            self.samples.pop_front();
        }

        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }

        before - self.samples.len()
    }

    /// Returns a read-only view of the retained samples, oldest first.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::new(&self.samples)
    }

    /// Multiplies every retained level by `factor` and drops samples whose
    /// level falls below `visibility_floor`.
    ///
    /// Returns the number of dropped samples.
    pub fn attenuate(&mut self, factor: f32, visibility_floor: f32) -> usize {
        let before = self.samples.len();
        for sample in &mut self.samples {
            sample.attenuate(factor);
        }
        self.samples.retain(|s| s.level >= visibility_floor);
        before - self.samples.len()
    }

    /// Drops every sample and releases the backing storage.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.samples.shrink_to_fit();
        self.last_timestamp_ms = None;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn window_duration_ms(&self) -> f64 {
        self.window_duration_ms
    }

    /// Highest retained level, or 0 when empty.
    pub fn max_level(&self) -> f32 {
        self.samples.iter().map(|s| s.level).fold(0.0, f32::max)
    }

    /// Time between the oldest and newest retained sample.
    pub fn span_ms(&self) -> f64 {
        match (self.samples.front(), self.samples.back()) {
            (Some(oldest), Some(newest)) => newest.timestamp_ms - oldest.timestamp_ms,
            _ => 0.0,
        }
    }
}
