//! Lookahead brick-wall peak limiter
//!
//! Each sample waits in a delay line for `attack` before it is output, while
//! the gain envelope ramps down in time to keep it under the ceiling. After a
//! peak the gain holds briefly and then recovers with a one-pole release.
//!
//! The delay is compensated internally: the first output sample corresponds
//! to the first input sample, and [`PeakLimiter::flush`] returns the tail so
//! the total output length equals the total input length.

use crate::error::{LoudnessError, Result};

/// Hold time after the last gain-reducing peak
const HOLD_MS: f32 = 10.0;

/// Limiter parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterSettings {
    /// Output ceiling in dBFS (0 dB = full scale)
    pub ceiling_db: f32,
    /// Lookahead / attack time in milliseconds
    pub attack_ms: f32,
    /// Release time in milliseconds
    pub release_ms: f32,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            ceiling_db: 0.0,
            attack_ms: 5.0,
            release_ms: 50.0,
        }
    }
}

impl LimiterSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.ceiling_db.is_finite() || self.ceiling_db > 0.0 {
            return Err(LoudnessError::InvalidParameter(format!(
                "ceiling {} dB must be finite and at most 0 dB",
                self.ceiling_db
            )));
        }
        if !(self.attack_ms > 0.0 && self.attack_ms.is_finite()) {
            return Err(LoudnessError::InvalidParameter(format!(
                "attack {} ms must be positive",
                self.attack_ms
            )));
        }
        if !(self.release_ms > 0.0 && self.release_ms.is_finite()) {
            return Err(LoudnessError::InvalidParameter(format!(
                "release {} ms must be positive",
                self.release_ms
            )));
        }
        Ok(())
    }
}

/// Lookahead peak limiter over planar blocks
///
/// # Example
///
/// ```
/// use tonal_loudness::{LimiterSettings, PeakLimiter};
///
/// let mut limiter = PeakLimiter::new(48000, 2, LimiterSettings::default()).unwrap();
/// let loud = vec![vec![1.5_f32; 4800], vec![-1.5_f32; 4800]];
/// let mut out = limiter.process(&loud);
/// for (plane, tail) in out.iter_mut().zip(limiter.flush()) {
///     plane.extend(tail);
/// }
/// assert_eq!(out[0].len(), 4800);
/// assert!(out.iter().flatten().all(|s| s.abs() <= 1.0 + 1e-6));
/// ```
pub struct PeakLimiter {
    /// Ceiling (linear, 1.0 = 0 dBFS)
    threshold: f32,
    /// Delay line length in samples
    lookahead_size: usize,
    /// Release time in samples
    release_samples: f64,
    /// Hold after the last registered peak, in samples
    hold_time: usize,
    lookahead_buffers: Vec<Vec<f32>>,
    write_pos: usize,
    /// Applied gain (linear, 0.0-1.0), kept in f64 so the release reaches unity
    gain: f64,
    /// Lowest gain the current attack ramp is heading for
    floor: f64,
    /// Attack ramp decrement per sample
    step: f64,
    hold_remaining: usize,
    /// Leading delay-line samples still to discard
    latency_remaining: usize,
    channels: usize,
}

impl PeakLimiter {
    pub fn new(sample_rate: u32, channels: usize, settings: LimiterSettings) -> Result<Self> {
        if sample_rate == 0 {
            return Err(LoudnessError::InvalidSampleRate(sample_rate));
        }
        if !(1..=8).contains(&channels) {
            return Err(LoudnessError::InvalidChannelCount(channels as u32));
        }
        settings.validate()?;

        let rate = sample_rate as f32;
        let lookahead_size = ((rate * settings.attack_ms / 1000.0).round() as usize).max(1);
        let release_samples = f64::from((rate * settings.release_ms / 1000.0).max(1.0));
        let hold_time = lookahead_size + (rate * HOLD_MS / 1000.0) as usize;

        tracing::trace!(
            "Limiter ceiling {} dB, lookahead {} samples, release {} samples",
            settings.ceiling_db,
            lookahead_size,
            release_samples
        );

        Ok(Self {
            threshold: 10.0_f32.powf(settings.ceiling_db / 20.0),
            lookahead_size,
            release_samples,
            hold_time,
            lookahead_buffers: vec![vec![0.0; lookahead_size]; channels],
            write_pos: 0,
            gain: 1.0,
            floor: 1.0,
            step: 0.0,
            hold_remaining: 0,
            latency_remaining: lookahead_size,
            channels,
        })
    }

    /// Ceiling as a linear amplitude
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Delay line length; output lags input by this much until flushed
    pub fn latency_samples(&self) -> usize {
        self.lookahead_size
    }

    /// Limit one planar block.
    ///
    /// Output is shorter than input by whatever part of the initial delay is
    /// still being filled; [`PeakLimiter::flush`] returns it at the end.
    pub fn process(&mut self, planes: &[Vec<f32>]) -> Vec<Vec<f32>> {
        let frames = planes.first().map_or(0, Vec::len);
        let mut output = vec![Vec::with_capacity(frames); self.channels];
        let mut frame = vec![0.0_f32; self.channels];

        for i in 0..frames {
            for (ch, sample) in frame.iter_mut().enumerate() {
                *sample = planes.get(ch).and_then(|p| p.get(i)).copied().unwrap_or(0.0);
            }
            self.push_frame(&frame, &mut output);
        }
        output
    }

    /// Push the delay line out through the envelope
    pub fn flush(&mut self) -> Vec<Vec<f32>> {
        let buffered = self.lookahead_size - self.latency_remaining;
        let mut output = vec![Vec::with_capacity(buffered); self.channels];
        if self.latency_remaining < self.lookahead_size {
            let silence = vec![0.0_f32; self.channels];
            for _ in 0..self.lookahead_size {
                self.push_frame(&silence, &mut output);
            }
        }
        self.clear();
        output
    }

    fn push_frame(&mut self, frame: &[f32], output: &mut [Vec<f32>]) {
        let peak = frame.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        if peak > self.threshold {
            let needed = f64::from(self.threshold) / f64::from(peak);
            let step = (self.gain - needed) / self.lookahead_size as f64;
            self.step = self.step.max(step);
            self.floor = self.floor.min(needed);
            self.hold_remaining = self.hold_time;
        }

        if self.gain > self.floor {
            // attack: ramp down towards the floor
            self.gain = (self.gain - self.step).max(self.floor);
        } else if self.hold_remaining > 0 {
            self.hold_remaining -= 1;
        } else {
            // release
            self.step = 0.0;
            self.gain += (1.0 - self.gain) / self.release_samples;
            if self.gain > 0.9999 {
                self.gain = 1.0;
            }
            self.floor = self.gain;
        }

        let emit = self.latency_remaining == 0;
        for (ch, &input) in frame.iter().enumerate() {
            let delayed = self.lookahead_buffers[ch][self.write_pos];
            self.lookahead_buffers[ch][self.write_pos] = input;
            if emit {
                output[ch].push((f64::from(delayed) * self.gain) as f32);
            }
        }
        self.write_pos = (self.write_pos + 1) % self.lookahead_size;
        if !emit {
            self.latency_remaining -= 1;
        }
    }

    fn clear(&mut self) {
        self.gain = 1.0;
        self.floor = 1.0;
        self.step = 0.0;
        self.hold_remaining = 0;
        self.write_pos = 0;
        self.latency_remaining = self.lookahead_size;
        for buffer in &mut self.lookahead_buffers {
            buffer.fill(0.0);
        }
    }
}
