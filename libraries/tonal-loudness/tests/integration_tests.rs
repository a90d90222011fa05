//! Meter and limiter working together
//!
//! - Property-based tests with proptest
//! - Loudness shifts under gain
//! - Limited output re-measured by the meter

use proptest::prelude::*;
use tonal_loudness::{db_to_linear, LimiterSettings, LoudnessMeter, PeakLimiter};

// ========== Helper Functions ==========

fn generate_sine(
    sample_rate: u32,
    channels: usize,
    frequency: f32,
    amplitude: f32,
    duration_secs: f32,
) -> Vec<Vec<f32>> {
    let num_samples = (sample_rate as f32 * duration_secs) as usize;
    let plane: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect();
    vec![plane; channels]
}

fn measure(sample_rate: u32, planes: &[Vec<f32>]) -> (f64, f64) {
    let mut meter = LoudnessMeter::new(sample_rate, planes.len() as u32).unwrap();
    meter.add_planar(planes).unwrap();
    (
        meter.integrated_lufs().unwrap(),
        meter.true_peak_dbtp().unwrap(),
    )
}

fn limit(sample_rate: u32, settings: LimiterSettings, planes: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let mut limiter = PeakLimiter::new(sample_rate, planes.len(), settings).unwrap();
    let mut out = Vec::new();
    for start in (0..planes[0].len()).step_by(1024) {
        let end = (start + 1024).min(planes[0].len());
        let block: Vec<Vec<f32>> = planes.iter().map(|p| p[start..end].to_vec()).collect();
        let processed = limiter.process(&block);
        if out.is_empty() {
            out = processed;
        } else {
            for (o, p) in out.iter_mut().zip(processed) {
                o.extend(p);
            }
        }
    }
    for (o, p) in out.iter_mut().zip(limiter.flush()) {
        o.extend(p);
    }
    out
}

// ========== Property-Based Tests ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// The limiter never lets a sample past its ceiling
    #[test]
    fn limiter_respects_ceiling(
        ceiling_db in -12.0_f32..0.0_f32,
        gain_db in 0.0_f32..18.0_f32,
        attack_ms in 1.0_f32..20.0_f32,
    ) {
        let ceiling = 10.0_f32.powf(ceiling_db / 20.0);
        let gain = 10.0_f32.powf(gain_db / 20.0);
        let mut planes = generate_sine(44100, 2, 997.0, 0.5, 0.25);
        for s in planes.iter_mut().flatten() {
            *s *= gain;
        }

        let settings = LimiterSettings { ceiling_db, attack_ms, release_ms: 100.0 };
        let out = limit(44100, settings, &planes);

        prop_assert_eq!(out[0].len(), planes[0].len());
        for s in out.iter().flatten() {
            prop_assert!(s.abs() <= ceiling * 1.0001, "{} over ceiling {}", s, ceiling);
        }
    }

    /// Scaling by g dB shifts integrated loudness by g LU
    #[test]
    fn loudness_tracks_gain(gain_db in -12.0_f64..6.0_f64) {
        let planes = generate_sine(48000, 2, 1000.0, 0.1, 3.0);
        let (base, _) = measure(48000, &planes);

        let factor = db_to_linear(gain_db) as f32;
        let scaled: Vec<Vec<f32>> = planes
            .iter()
            .map(|p| p.iter().map(|s| s * factor).collect())
            .collect();
        let (shifted, _) = measure(48000, &scaled);

        prop_assert!((shifted - base - gain_db).abs() < 0.05);
    }
}

// ========== Cross-module Tests ==========

#[test]
fn limited_signal_measures_under_ceiling() {
    let planes = generate_sine(48000, 2, 1000.0, 1.8, 2.0);
    let settings = LimiterSettings {
        ceiling_db: -1.0,
        attack_ms: 12.0,
        release_ms: 200.0,
    };
    let out = limit(48000, settings, &planes);
    let (_, true_peak) = measure(48000, &out);
    // a 1 kHz tone has negligible inter-sample overshoot
    assert!(true_peak < -0.8, "true peak {:.2} dBTP", true_peak);
}

#[test]
fn untouched_when_below_ceiling() {
    let planes = generate_sine(48000, 1, 440.0, 0.25, 1.0);
    let out = limit(48000, LimiterSettings::default(), &planes);
    assert_eq!(out, planes);
}

#[test]
fn mono_and_stereo_loudness_relation() {
    // identical content in two channels sums to +3 LU over one channel
    let stereo = generate_sine(44100, 2, 1000.0, 0.2, 3.0);
    let mono = vec![stereo[0].clone()];
    let (l2, _) = measure(44100, &stereo);
    let (l1, _) = measure(44100, &mono);
    assert!((l2 - l1 - 3.01).abs() < 0.1);
}
