//! Sample rate conversion
//!
//! Windowed-sinc conversion over planar `f32` blocks, backed by rubato. The
//! output is time-aligned with the input (an impulse at input frame `n` lands
//! at output frame `n * output_rate / input_rate`), and after
//! [`Resampler::flush`] the total output length is
//! `round(input_frames * output_rate / input_rate)`.
//!
//! ```rust
//! use tonal_media::resampling::{Resampler, ResamplingQuality};
//!
//! let mut resampler = Resampler::new(44100, 48000, 2, ResamplingQuality::Balanced).unwrap();
//! let input = vec![vec![0.0_f32; 4410]; 2];
//! let mut output = resampler.process(&input).unwrap();
//! let tail = resampler.flush().unwrap();
//! for (plane, rest) in output.iter_mut().zip(tail) {
//!     plane.extend(rest);
//! }
//! assert_eq!(output[0].len(), 4800);
//! ```

mod rubato_backend;

use thiserror::Error;

use rubato_backend::RubatoResampler;

/// Highest rate accepted on either side of a conversion
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// Most planes a single conversion handles
pub const MAX_CHANNELS: usize = 8;

#[derive(Error, Debug)]
pub enum ResamplingError {
    #[error("Unsupported sample rate {0} Hz")]
    InvalidSampleRate(u32),

    #[error("Unsupported channel count {0}")]
    InvalidChannelCount(usize),

    #[error("Expected {expected} channel planes, got {actual}")]
    PlaneCountMismatch { expected: usize, actual: usize },

    #[error("Channel planes differ in length")]
    RaggedPlanes,

    #[error("Resampler setup failed: {0}")]
    Setup(String),

    #[error("Resampler failed: {0}")]
    Process(String),
}

pub type Result<T> = std::result::Result<T, ResamplingError>;

/// Trade-off between filter length and stopband rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResamplingQuality {
    /// 64-tap linear interpolation, cutoff at 90% of Nyquist
    Fast,
    /// 128-tap cubic interpolation, cutoff at 95% of Nyquist
    Balanced,
    /// 256-tap cubic interpolation, cutoff at 99% of Nyquist
    #[default]
    High,
}

/// Delay-compensated rate converter for one stream.
///
/// Equal input and output rates pass blocks through untouched.
pub struct Resampler {
    backend: RubatoResampler,
}

impl Resampler {
    pub fn new(
        input_rate: u32,
        output_rate: u32,
        channels: usize,
        quality: ResamplingQuality,
    ) -> Result<Self> {
        for rate in [input_rate, output_rate] {
            if rate == 0 || rate > MAX_SAMPLE_RATE {
                return Err(ResamplingError::InvalidSampleRate(rate));
            }
        }
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(ResamplingError::InvalidChannelCount(channels));
        }

        Ok(Self {
            backend: RubatoResampler::new(input_rate, output_rate, channels, quality)?,
        })
    }

    /// Convert one planar block; output may lag input until [`Resampler::flush`]
    pub fn process(&mut self, input: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        self.backend.process(input)
    }

    /// Drain everything still buffered at end of stream
    pub fn flush(&mut self) -> Result<Vec<Vec<f32>>> {
        self.backend.flush()
    }
}

/// Total output frames for `input_frames` converted between two rates
pub(crate) fn expected_output_frames(input_frames: u64, input_rate: u32, output_rate: u32) -> u64 {
    let scaled = u128::from(input_frames) * u128::from(output_rate);
    let rate = u128::from(input_rate);
    ((scaled + rate / 2) / rate) as u64
}
