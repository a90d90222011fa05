//! Rubato resampler backend
//!
//! Fixed-input sinc resampling over planar blocks with exact-length flushing.
//! `SincFixedIn` output is already aligned with its input, so no leading
//! frames are dropped.

use super::{expected_output_frames, ResamplingError, ResamplingQuality, Result};
use rubato::{
    Resampler as _, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};

/// Upper bound on zero-fed chunks while flushing
const MAX_FLUSH_CHUNKS: usize = 64;

/// Chunked `SincFixedIn` converter with delay and length bookkeeping
pub struct RubatoResampler {
    /// `None` when input and output rates match
    resampler: Option<SincFixedIn<f32>>,
    input_rate: u32,
    output_rate: u32,
    channels: usize,
    /// Input not yet forming a complete chunk, one buffer per channel
    input_buffer: Vec<Vec<f32>>,
    frames_in: u64,
    frames_out: u64,
}

impl RubatoResampler {
    pub fn new(
        input_rate: u32,
        output_rate: u32,
        channels: usize,
        quality: ResamplingQuality,
    ) -> Result<Self> {
        let chunk_size = match quality {
            ResamplingQuality::Fast | ResamplingQuality::Balanced => 1024,
            ResamplingQuality::High => 2048,
        };

        let resampler = if input_rate == output_rate {
            None
        } else {
            let ratio = f64::from(output_rate) / f64::from(input_rate);
            let sinc = SincFixedIn::<f32>::new(
                ratio,
                1.0,
                sinc_parameters(quality),
                chunk_size,
                channels,
            )
            .map_err(|e| ResamplingError::Setup(e.to_string()))?;
            Some(sinc)
        };

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
            channels,
            input_buffer: vec![Vec::new(); channels],
            frames_in: 0,
            frames_out: 0,
        })
    }

    pub fn process(&mut self, input: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        if input.len() != self.channels {
            return Err(ResamplingError::PlaneCountMismatch {
                expected: self.channels,
                actual: input.len(),
            });
        }
        let frames = input.first().map_or(0, Vec::len);
        if input.iter().any(|plane| plane.len() != frames) {
            return Err(ResamplingError::RaggedPlanes);
        }
        self.frames_in += frames as u64;

        let Some(resampler) = self.resampler.as_mut() else {
            self.frames_out += frames as u64;
            return Ok(input.to_vec());
        };

        for (buffer, plane) in self.input_buffer.iter_mut().zip(input) {
            buffer.extend_from_slice(plane);
        }

        let mut output = vec![Vec::new(); self.channels];
        loop {
            let needed = resampler.input_frames_next();
            if self.input_buffer[0].len() < needed {
                break;
            }

            let chunk: Vec<Vec<f32>> = self
                .input_buffer
                .iter_mut()
                .map(|buffer| buffer.drain(..needed).collect())
                .collect();

            let resampled = resampler
                .process(&chunk, None)
                .map_err(|e| ResamplingError::Process(e.to_string()))?;
            Self::emit(
                &mut output,
                resampled,
                &mut self.frames_out,
                u64::MAX,
            );
        }

        Ok(output)
    }

    /// Drain buffered input and the filter tail.
    ///
    /// The stream's total output is padded or cut to exactly
    /// `round(frames_in * output_rate / input_rate)` frames.
    pub fn flush(&mut self) -> Result<Vec<Vec<f32>>> {
        let mut output = vec![Vec::new(); self.channels];
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(output);
        };

        let expected = expected_output_frames(self.frames_in, self.input_rate, self.output_rate);
        let mut chunks = 0;
        while self.frames_out < expected && chunks < MAX_FLUSH_CHUNKS {
            let pending = std::mem::replace(
                &mut self.input_buffer,
                vec![Vec::new(); self.channels],
            );
            let wave_in = if pending[0].is_empty() {
                None
            } else {
                Some(pending.as_slice())
            };
            let resampled = resampler
                .process_partial(wave_in, None)
                .map_err(|e| ResamplingError::Process(e.to_string()))?;

            Self::emit(
                &mut output,
                resampled,
                &mut self.frames_out,
                expected,
            );
            chunks += 1;
        }

        // short tails (should the filter run dry) are padded with silence
        if self.frames_out < expected {
            let missing = (expected - self.frames_out) as usize;
            for plane in &mut output {
                plane.resize(plane.len() + missing, 0.0);
            }
            self.frames_out = expected;
        }

        Ok(output)
    }

    /// Append `resampled` to `output`, stopping at `limit` frames in total
    fn emit(output: &mut [Vec<f32>], resampled: Vec<Vec<f32>>, frames_out: &mut u64, limit: u64) {
        let produced = resampled.first().map_or(0, Vec::len);
        let room = limit.saturating_sub(*frames_out);
        let take = (produced as u64).min(room) as usize;
        for (out, plane) in output.iter_mut().zip(resampled) {
            out.extend_from_slice(&plane[..take]);
        }
        *frames_out += take as u64;
    }
}

fn sinc_parameters(quality: ResamplingQuality) -> SincInterpolationParameters {
    match quality {
        ResamplingQuality::Fast => SincInterpolationParameters {
            sinc_len: 64,
            f_cutoff: 0.9,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 128,
            window: WindowFunction::Blackman,
        },
        ResamplingQuality::Balanced => SincInterpolationParameters {
            sinc_len: 128,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Cubic,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris,
        },
        ResamplingQuality::High => SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.99,
            interpolation: SincInterpolationType::Cubic,
            oversampling_factor: 512,
            window: WindowFunction::BlackmanHarris,
        },
    }
}
