//! End-to-end behaviour of the waveform pipeline through its public API.

use approx::assert_relative_eq;
use wavetide::waveform::{
    decay_steps_to_silence, Ingest, RollingWindowBuffer, Sample, SampleInput, ScalingProfile,
    ScalingProfileId, ScrollPhase, WaveformConfig, WaveformPipeline,
};

/// Pipeline whose buffered levels equal the scalar inputs exactly.
fn transparent(slot_count: usize) -> WaveformPipeline {
    WaveformPipeline::new(WaveformConfig {
        slot_count,
        smoothing_window: 1,
        scalar_jitter: 0.0,
        ..WaveformConfig::default()
    })
    .expect("valid config")
}

#[test]
fn window_and_capacity_bounds_hold_while_streaming() {
    let mut pipeline = WaveformPipeline::new(WaveformConfig {
        window_duration_ms: 1000,
        samples_per_second: 25,
        ..WaveformConfig::default()
    })
    .expect("valid config");
    pipeline.start(0.0);

    for i in 0..200 {
        let t = i as f64 * 40.0;
        pipeline.on_sample(SampleInput::Level(0.4), t);

        let buffer = pipeline.buffer();
        assert!(buffer.len() <= 25);
        assert!(buffer.span_ms() <= 1000.0);

        let timestamps: Vec<f64> = buffer.snapshot().iter().map(|s| s.timestamp_ms).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
    }
}

#[test]
fn capacity_keeps_the_newest_samples_in_order() {
    let mut buffer = RollingWindowBuffer::new(1.0e9, 150);
    for i in 0..500 {
        let t = i as f64 * 40.0;
        buffer.push(Sample::new(i as f32 / 500.0, t), t);
    }

    assert_eq!(buffer.len(), 150);
    let timestamps: Vec<f64> = buffer.snapshot().iter().map(|s| s.timestamp_ms).collect();
    let expected: Vec<f64> = (350..500).map(|i| i as f64 * 40.0).collect();
    assert_eq!(timestamps, expected);
}

#[test]
fn cold_start_shows_only_the_sparse_baseline() {
    let mut pipeline = transparent(10);
    let frame = pipeline.on_render_tick(0.0);

    assert_eq!(frame.phase, ScrollPhase::Idle);
    let lit: Vec<usize> = (0..10).filter(|&i| frame.bars[i] > 0.0).collect();
    assert!(lit.len() <= 10 / 4);
    assert_eq!(lit, vec![3, 7]);
    assert!(frame.bars.iter().all(|&b| b < 0.02));
}

#[test]
fn underfull_buffer_is_stretched_across_all_slots() {
    let mut pipeline = transparent(9);
    pipeline.start(0.0);
    for (i, level) in [0.2, 0.5, 0.9].into_iter().enumerate() {
        assert_eq!(
            pipeline.on_sample(SampleInput::Level(level), i as f64 * 50.0),
            Ingest::Accepted
        );
    }

    let profile = ScalingProfile::builtin(ScalingProfileId::Native);
    let (a, b, c) = (profile.scale(0.2), profile.scale(0.5), profile.scale(0.9));
    let frame = pipeline.on_render_tick(200.0);

    let expected = [a, a, a, b, b, b, c, c, c];
    for (bar, want) in frame.bars.iter().zip(expected) {
        assert_relative_eq!(*bar, want, epsilon = 1e-6);
    }
}

#[test]
fn full_buffer_shows_the_newest_tail() {
    let mut pipeline = transparent(4);
    pipeline.start(0.0);
    for i in 0..10 {
        pipeline.on_sample(SampleInput::Level(i as f32 / 10.0), i as f64 * 40.0);
    }

    let frame = pipeline.on_render_tick(400.0);
    let profile = pipeline.profile().clone();
    let expected: Vec<f32> = [0.6, 0.7, 0.8, 0.9].iter().map(|&l| profile.scale(l)).collect();
    for (bar, want) in frame.bars.iter().zip(expected) {
        assert_relative_eq!(*bar, want, epsilon = 1e-6);
    }
}

#[test]
fn projection_is_deterministic_between_samples() {
    let mut pipeline = transparent(16);
    pipeline.start(0.0);
    for i in 0..7 {
        pipeline.on_sample(SampleInput::Level(0.1 * i as f32), i as f64 * 40.0);
    }

    let first = pipeline.on_render_tick(300.0);
    let second = pipeline.on_render_tick(300.0);
    assert_eq!(first, second);
}

#[test]
fn rate_limit_keeps_one_sample_per_interval() {
    let mut pipeline = transparent(10);
    pipeline.start(0.0);
    for i in 0..100 {
        pipeline.on_sample(SampleInput::Level(0.5), i as f64 * 10.0);
    }

    let stats = pipeline.stats();
    assert_eq!(stats.accepted, 25);
    assert_eq!(stats.dropped_overrun, 75);
}

#[test]
fn fade_out_converges_in_the_predicted_number_of_frames() {
    let mut pipeline = transparent(10);
    pipeline.start(0.0);
    pipeline.on_sample(SampleInput::Level(0.4), 0.0);
    pipeline.on_sample(SampleInput::Level(0.9), 40.0);

    let max = pipeline.buffer().max_level();
    let expected = decay_steps_to_silence(max, 0.95, 0.02);
    // ln(0.02 / 0.9) / ln(0.95) = 74.2...
    assert_eq!(expected, 75);

    pipeline.stop();
    let mut frames = 0;
    while pipeline.phase() == ScrollPhase::Decaying {
        frames += 1;
        let frame = pipeline.on_render_tick(100.0 + frames as f64 * 16.0);
        assert!(frames <= expected, "fade-out overran");
        if frame.is_idle() {
            assert_eq!(frame.scroll_offset, 0.0);
        }
    }

    assert_eq!(frames, expected);
    assert!(pipeline.buffer().is_empty());
}

#[test]
fn fade_out_of_a_full_buffer_matches_the_closed_form() {
    let mut pipeline = transparent(48);
    pipeline.start(0.0);
    for i in 0..200 {
        let level = 0.2 + 0.79 * (i % 10) as f32 / 9.0;
        pipeline.on_sample(SampleInput::Level(level), i as f64 * 40.0);
    }

    let buffer = pipeline.buffer();
    assert_eq!(buffer.capacity(), 150);
    assert_eq!(buffer.len(), buffer.capacity());
    let expected = decay_steps_to_silence(buffer.max_level(), 0.95, 0.02);
    // ln(0.02 / 0.99) / ln(0.95) = 76.07...
    assert_eq!(expected, 77);

    pipeline.stop();
    let mut frames = 0;
    while pipeline.phase() == ScrollPhase::Decaying {
        frames += 1;
        pipeline.on_render_tick(8000.0 + frames as f64 * 16.0);
        assert!(frames <= expected, "fade-out overran");
    }

    assert_eq!(frames, expected);
    assert!(pipeline.buffer().is_empty());
}

#[test]
fn invalid_timestamps_cannot_flood_the_buffer() {
    let mut pipeline = transparent(10);
    pipeline.start(0.0);
    pipeline.on_sample(SampleInput::Level(0.5), 100.0);
    for i in 0..500 {
        let timestamp = if i % 2 == 0 { f64::NAN } else { -5.0 };
        pipeline.on_sample(SampleInput::Level(0.5), timestamp);
    }

    let stats = pipeline.stats();
    assert_eq!(stats.accepted, 1);
    assert!(stats.dropped_overrun > 0);
    assert_eq!(pipeline.buffer().len(), 1);
}

#[test]
fn stop_is_idempotent_and_ends_idle() {
    let mut pipeline = transparent(10);
    pipeline.start(0.0);
    pipeline.on_sample(SampleInput::Level(0.3), 0.0);

    pipeline.stop();
    pipeline.stop();
    assert_eq!(pipeline.phase(), ScrollPhase::Decaying);

    for frame in 0..200 {
        pipeline.on_render_tick(frame as f64 * 16.0);
    }
    pipeline.stop();

    assert_eq!(pipeline.phase(), ScrollPhase::Idle);
    assert_eq!(pipeline.buffer().len(), 0);
}

#[test]
fn source_profiles_disagree_at_mid_level() {
    let mut frames = Vec::new();
    for id in [ScalingProfileId::Web, ScalingProfileId::Native] {
        let mut pipeline = WaveformPipeline::new(WaveformConfig {
            slot_count: 1,
            smoothing_window: 1,
            scalar_jitter: 0.0,
            scaling_profile: id,
            ..WaveformConfig::default()
        })
        .expect("valid config");
        pipeline.start(0.0);
        pipeline.on_sample(SampleInput::Level(0.3), 0.0);
        frames.push(pipeline.on_render_tick(10.0).bars[0]);
    }

    assert_relative_eq!(frames[0], 0.60625, epsilon = 1e-5);
    assert_relative_eq!(frames[1], 0.35, epsilon = 1e-5);
}

#[test]
fn shared_pipeline_accepts_samples_from_another_thread() {
    let pipeline = transparent(10).into_shared();
    pipeline.lock().expect("lock").start(0.0);

    let producer = {
        let pipeline = pipeline.clone();
        std::thread::spawn(move || {
            for i in 0..20 {
                let mut pipeline = pipeline.lock().expect("lock");
                pipeline.on_sample(SampleInput::Bands(vec![0.2, 0.4, 0.6]), i as f64 * 40.0);
            }
        })
    };
    for tick in 0..20 {
        let frame = pipeline.lock().expect("lock").on_render_tick(tick as f64 * 16.0);
        assert_eq!(frame.bars.len(), 10);
    }
    producer.join().expect("producer thread");

    assert_eq!(pipeline.lock().expect("lock").stats().accepted, 20);
}
