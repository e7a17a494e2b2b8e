//! PCM analysis for the microphone producer.
//!
//! Converts short chunks of i16 PCM into the overall level and the
//! voice-range band vector the pipeline ingests.

use rustfft::{num_complex::Complex, Fft, FftPlanner, Length};
use std::sync::Arc;

use crate::waveform::SampleInput;

/// Decibel span between the noise floor and the reference level.
const LEVEL_RANGE_DB: f32 = 40.0;

/// Voice fundamentals and low harmonics.
const VOICE_MIN_HZ: f32 = 100.0;
const VOICE_MAX_HZ: f32 = 1500.0;

/// Averages interleaved frames down to mono.
pub fn to_mono(data: &[i16], channels: usize) -> Vec<i16> {
    match channels {
        0 => Vec::new(),
        1 => data.to_vec(),
        _ => data
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect(),
    }
}

/// RMS level of `samples` in `[0, 1]`.
///
/// The RMS is converted to dBFS and mapped linearly so that
/// `reference_level_db - 40` reads 0 and `reference_level_db` reads 1.
pub fn pcm_level(samples: &[i16], reference_level_db: i8) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_of_squares: i64 = samples.iter().map(|&x| (x as i64).pow(2)).sum();
    let mean_square = sum_of_squares as f64 / samples.len() as f64;
    let rms = mean_square.sqrt() as f32;

    let db_fs = if rms > 0.0 {
        20.0 * (rms / 32767.0).log10()
    } else {
        -160.0
    };

    let min_db = reference_level_db as f32 - LEVEL_RANGE_DB;
    ((db_fs - min_db) / LEVEL_RANGE_DB).clamp(0.0, 1.0)
}

/// Voice-range band magnitudes from a Hann-windowed FFT.
///
/// Caches the plan for the last FFT size; chunk sizes are fixed per stream.
pub struct BandAnalyzer {
    fft: Option<Arc<dyn Fft<f32>>>,
    band_count: usize,
}

impl BandAnalyzer {
    pub fn new(band_count: usize) -> Self {
        Self {
            fft: None,
            band_count,
        }
    }

    fn plan(&mut self, fft_size: usize) -> Arc<dyn Fft<f32>> {
        if let Some(fft) = self.fft.as_ref().filter(|fft| fft.len() == fft_size) {
            return Arc::clone(fft);
        }
        let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_size);
        self.fft = Some(Arc::clone(&fft));
        fft
    }

    /// Returns `band_count` magnitudes in `[0, 1]` over 100-1500 Hz.
    ///
    /// Bands below `reference_level_db - 35` dB are gated to 0.
    pub fn analyze(&mut self, samples: &[i16], sample_rate: u32, reference_level_db: i8) -> Vec<f32> {
        let mut result = vec![0.0f32; self.band_count];
        if samples.is_empty() || sample_rate == 0 || self.band_count == 0 {
            return result;
        }

        let fft_size = samples.len().next_power_of_two().clamp(256, 2048);
        let sample_count = samples.len().min(fft_size);
        let recent = &samples[samples.len() - sample_count..];

        let mut buffer: Vec<Complex<f32>> = recent
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                let window = 0.5
                    * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / sample_count as f32).cos());
                Complex::new(s as f32 * window / 32768.0, 0.0)
            })
            .collect();
        buffer.resize(fft_size, Complex::new(0.0, 0.0));

        self.plan(fft_size).process(&mut buffer);

        let freq_resolution = sample_rate as f32 / fft_size as f32;
        let min_bin = (VOICE_MIN_HZ / freq_resolution) as usize;
        let max_bin = (VOICE_MAX_HZ / freq_resolution).min((fft_size / 2) as f32) as usize;
        if max_bin <= min_bin {
            return result;
        }

        let noise_gate_db = reference_level_db as f32 - 35.0;
        let db_range = reference_level_db as f32 - noise_gate_db;
        let useful_bins = max_bin - min_bin;

        for (band_idx, band) in result.iter_mut().enumerate() {
            let start_bin = min_bin + band_idx * useful_bins / self.band_count;
            let end_bin = (min_bin + (band_idx + 1) * useful_bins / self.band_count)
                .min(max_bin)
                .max(start_bin + 1);

            let bins = &buffer[start_bin..end_bin.min(fft_size / 2)];
            if bins.is_empty() {
                continue;
            }
            let avg_magnitude = bins.iter().map(|c| c.norm()).sum::<f32>() / bins.len() as f32;

            let db = if avg_magnitude > 1e-10 {
                20.0 * avg_magnitude.log10()
            } else {
                -100.0
            };

            // FFT energy concentrates more than RMS; pull it back in line.
            let adjusted_db = db - 20.0;
            if adjusted_db >= noise_gate_db {
                *band = ((adjusted_db - noise_gate_db) / db_range).clamp(0.0, 1.0);
            }
        }

        result
    }
}

/// Accumulates mono PCM and emits one payload per full chunk.
pub struct ChunkAnalyzer {
    pending: Vec<i16>,
    chunk_len: usize,
    sample_rate: u32,
    reference_level_db: i8,
    bands: BandAnalyzer,
}

impl ChunkAnalyzer {
    /// Creates an analyzer emitting one payload every `chunk_ms` of audio.
    pub fn new(sample_rate: u32, chunk_ms: u64, band_count: usize, reference_level_db: i8) -> Self {
        let chunk_len = ((sample_rate as u64 * chunk_ms) / 1000).max(1) as usize;
        Self {
            pending: Vec::with_capacity(chunk_len),
            chunk_len,
            sample_rate,
            reference_level_db,
            bands: BandAnalyzer::new(band_count),
        }
    }

    pub fn chunk_len(&self) -> usize {
        self.chunk_len
    }

    /// Feeds mono samples, calling `emit` for every completed chunk.
    ///
    /// Silent chunks (all bands gated) fall back to a scalar level payload so
    /// the pipeline still sees the quiet signal.
    pub fn feed(&mut self, mono: &[i16], mut emit: impl FnMut(SampleInput)) {
        let mut rest = mono;
        while !rest.is_empty() {
            let take = (self.chunk_len - self.pending.len()).min(rest.len());
            self.pending.extend_from_slice(&rest[..take]);
            rest = &rest[take..];

            if self.pending.len() == self.chunk_len {
                let level = pcm_level(&self.pending, self.reference_level_db);
                let bands = self
                    .bands
                    .analyze(&self.pending, self.sample_rate, self.reference_level_db);
                self.pending.clear();

                if bands.iter().any(|&b| b > 0.0) {
                    emit(SampleInput::Bands(bands));
                } else {
                    emit(SampleInput::Level(level));
                }
            }
        }
    }
}
