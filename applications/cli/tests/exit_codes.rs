//! Exit status of the `tonal` binary

use std::f32::consts::PI;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn tonal(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tonal"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

/// Stereo 16-bit 1 kHz tone with a 20 ms burst at 2.6x amplitude each second
fn write_programme(path: &Path, sample_rate: u32, seconds: f32, amplitude: f32) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..(sample_rate as f32 * seconds) as usize {
        let t = i as f32 / sample_rate as f32;
        let local = t.fract() - 0.00025;
        let window = if (0.0..0.02).contains(&local) {
            0.5 - 0.5 * (2.0 * PI * local / 0.02).cos()
        } else {
            0.0
        };
        let sample = amplitude * (2.0 * PI * 1000.0 * t).sin() * (1.0 + 1.6 * window);
        let code = (sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16;
        writer.write_sample(code).unwrap();
        writer.write_sample(code).unwrap();
    }
    writer.finalize().unwrap();
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn help_and_version_succeed() {
    let out = tonal(&["--help"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Usage"));
    assert_eq!(tonal(&["--version"]).status.code(), Some(0));
}

#[test]
fn usage_errors_exit_one() {
    let out = tonal(&["an", "-s", "in.wav"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!out.stderr.is_empty());
    assert_eq!(tonal(&["shout"]).status.code(), Some(1));
}

#[test]
fn normalize_exit_codes() {
    let dir = tempdir().unwrap();
    let quiet = dir.path().join("quiet.wav");
    let compliant = dir.path().join("compliant.wav");
    let out = dir.path().join("out.wav");
    let untouched = dir.path().join("untouched.wav");
    write_programme(&quiet, 44100, 2.0, 0.05);
    write_programme(&compliant, 48000, 3.0, 0.37);

    let written = tonal(&["an", "-s", path_str(&quiet), "-d", path_str(&out)]);
    assert_eq!(written.status.code(), Some(0));
    assert!(out.exists());

    let unchanged = tonal(&["an", "-s", path_str(&compliant), "-d", path_str(&untouched)]);
    assert_eq!(unchanged.status.code(), Some(2));
    assert!(!untouched.exists());

    let missing = dir.path().join("absent.wav");
    let failed = tonal(&["an", "-s", path_str(&missing), "-d", path_str(&out)]);
    assert_eq!(failed.status.code(), Some(1));
}

#[test]
fn validate_and_measure() {
    let dir = tempdir().unwrap();
    let wav = dir.path().join("tone.wav");
    let text = dir.path().join("notes.txt");
    write_programme(&wav, 48000, 1.0, 0.1);
    std::fs::write(&text, "not audio\n".repeat(64)).unwrap();

    assert_eq!(tonal(&["ai", "-s", path_str(&wav)]).status.code(), Some(0));
    assert_eq!(tonal(&["ai", "-s", path_str(&text)]).status.code(), Some(1));

    let measured = tonal(&["am", "-s", path_str(&wav)]);
    assert_eq!(measured.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_slice(&measured.stdout).unwrap();
    assert_eq!(report["sample_rate"], 48000);
    assert_eq!(report["codec"], "pcm_s16le");
}
