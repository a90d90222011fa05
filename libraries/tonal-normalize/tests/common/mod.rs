//! WAV fixtures shared by the integration tests

#![allow(dead_code)]

use std::f32::consts::PI;
use std::path::Path;

/// Burst amplitude relative to the base tone
pub const BURST_RATIO: f32 = 1.6;

/// Stereo 16-bit programme: a 1 kHz tone of `amplitude` with a 20 ms Hann
/// burst of the same tone at `BURST_RATIO * amplitude` every second, peaking
/// on a crest of the base tone. The peak is `(1 + BURST_RATIO) * amplitude`
/// while the loudness stays close to that of the plain tone.
pub fn write_programme(path: &Path, sample_rate: u32, seconds: f32, amplitude: f32) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let frames = (sample_rate as f32 * seconds) as usize;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let tone = (2.0 * PI * 1000.0 * t).sin();
        // bursts span [k + 0.25 ms, k + 20.25 ms)
        let local = t.fract() - 0.00025;
        let window = if (0.0..0.02).contains(&local) {
            0.5 - 0.5 * (2.0 * PI * local / 0.02).cos()
        } else {
            0.0
        };
        let sample = amplitude * tone * (1.0 + BURST_RATIO * window);
        let code = (sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16;
        writer.write_sample(code).unwrap();
        writer.write_sample(code).unwrap();
    }
    writer.finalize().unwrap();
}

/// Quiet 44.1 kHz source, around -26 LUFS, needing every transform
pub fn write_quiet_source(path: &Path) {
    write_programme(path, 44100, 6.0, 0.05);
}

/// 48 kHz stereo 16-bit source within every tolerance of the default target
pub fn write_compliant_source(path: &Path) {
    write_programme(path, 48000, 3.0, 0.37);
}

/// Samples per channel and spec of a WAV file
pub fn wav_info(path: &Path) -> (u32, hound::WavSpec) {
    let reader = hound::WavReader::open(path).unwrap();
    (reader.duration(), reader.spec())
}
