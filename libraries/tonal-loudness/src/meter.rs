//! EBU R128 loudness metering
//!
//! Integrated loudness (LUFS), true peak (dBTP, 4x oversampled) and sample
//! peak (dBFS) over planar `f32` blocks, accumulated across a whole stream.

use crate::error::{LoudnessError, Result};
use crate::linear_to_db;
use ebur128::{EbuR128, Mode};

/// Loudness reported for signals that never open the absolute gate
pub const SILENCE_FLOOR_LUFS: f64 = -70.0;

/// Streaming EBU R128 meter
///
/// # Example
///
/// ```
/// use tonal_loudness::LoudnessMeter;
///
/// let mut meter = LoudnessMeter::new(48000, 2).unwrap();
/// let tone: Vec<f32> = (0..48000 * 3)
///     .map(|i| 0.1 * (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 48000.0).sin())
///     .collect();
/// meter.add_planar(&[tone.clone(), tone]).unwrap();
/// let lufs = meter.integrated_lufs().unwrap();
/// assert!(lufs > -30.0 && lufs < -15.0);
/// ```
pub struct LoudnessMeter {
    ebur128: EbuR128,
    sample_rate: u32,
    channels: u32,
    frames_processed: u64,
}

impl LoudnessMeter {
    /// Create a new meter
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz (8000-384000)
    /// * `channels` - Number of channels (1-8)
    pub fn new(sample_rate: u32, channels: u32) -> Result<Self> {
        if !(8000..=384000).contains(&sample_rate) {
            return Err(LoudnessError::InvalidSampleRate(sample_rate));
        }
        if !(1..=8).contains(&channels) {
            return Err(LoudnessError::InvalidChannelCount(channels));
        }

        let ebur128 = EbuR128::new(channels, sample_rate, Self::mode())?;

        Ok(Self {
            ebur128,
            sample_rate,
            channels,
            frames_processed: 0,
        })
    }

    fn mode() -> Mode {
        Mode::I | Mode::SAMPLE_PEAK | Mode::TRUE_PEAK
    }

    /// Add one planar block (one slice per channel, equal lengths)
    pub fn add_planar(&mut self, planes: &[Vec<f32>]) -> Result<()> {
        if planes.len() != self.channels as usize {
            return Err(LoudnessError::AnalysisError(format!(
                "Block has {} channels, meter expects {}",
                planes.len(),
                self.channels
            )));
        }
        let frames = planes.first().map_or(0, Vec::len);
        if frames == 0 {
            return Ok(());
        }
        if planes.iter().any(|p| p.len() != frames) {
            return Err(LoudnessError::AnalysisError(
                "Channel planes differ in length".to_string(),
            ));
        }

        let refs: Vec<&[f32]> = planes.iter().map(Vec::as_slice).collect();
        self.ebur128.add_frames_planar_f32(&refs)?;
        self.frames_processed += frames as u64;
        Ok(())
    }

    /// Gated integrated loudness, floored at [`SILENCE_FLOOR_LUFS`]
    pub fn integrated_lufs(&self) -> Result<f64> {
        let lufs = self.ebur128.loudness_global()?;
        if lufs.is_nan() || lufs < SILENCE_FLOOR_LUFS {
            Ok(SILENCE_FLOOR_LUFS)
        } else {
            Ok(lufs)
        }
    }

    /// Maximum true peak across channels in dBTP (`-inf` for silence)
    pub fn true_peak_dbtp(&self) -> Result<f64> {
        let mut peak = 0.0_f64;
        for ch in 0..self.channels {
            peak = peak.max(self.ebur128.true_peak(ch)?);
        }
        Ok(linear_to_db(peak))
    }

    /// Maximum sample peak across channels in dBFS (`-inf` for silence)
    pub fn sample_peak_dbfs(&self) -> Result<f64> {
        let mut peak = 0.0_f64;
        for ch in 0..self.channels {
            peak = peak.max(self.ebur128.sample_peak(ch)?);
        }
        Ok(linear_to_db(peak))
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn duration_seconds(&self) -> f64 {
        self.frames_processed as f64 / f64::from(self.sample_rate)
    }
}
