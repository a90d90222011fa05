//! Leading trim

use super::options::FilterOptions;
use super::{frames_to_ticks, AudioFilter, StreamSpec};
use crate::error::Result;
use std::collections::VecDeque;
use tonal_media::{ensure, Frame};

/// Drops the first `start` of audio. Timestamps of the remaining frames are
/// moved back so the output begins where the input began.
pub struct Trim {
    spec: StreamSpec,
    /// Samples trimmed in total
    start_samples: usize,
    /// Samples still to drop
    remaining: usize,
}

impl Trim {
    /// Options: `start` (seconds, `s`/`ms`/`us` suffixes accepted) or
    /// `start_sample`.
    pub fn from_options(opts: &mut FilterOptions, input: &StreamSpec) -> Result<Self> {
        let seconds = opts.take_seconds("start")?;
        let sample = opts.take_u32("start_sample")?;

        let start_samples = match (seconds, sample) {
            (Some(seconds), _) => {
                ensure(
                    seconds >= 0.0,
                    "configure filter",
                    format!("atrim start {}s is negative", seconds),
                )?;
                (seconds * f64::from(input.sample_rate)).round() as usize
            }
            (None, Some(sample)) => sample as usize,
            (None, None) => 0,
        };

        Ok(Self {
            spec: *input,
            start_samples,
            remaining: start_samples,
        })
    }
}

impl AudioFilter for Trim {
    fn name(&self) -> &'static str {
        "atrim"
    }

    fn output_spec(&self) -> StreamSpec {
        self.spec
    }

    fn filter_frame(&mut self, mut frame: Frame, out: &mut VecDeque<Frame>) -> Result<()> {
        let frames = frame.frames();
        if self.remaining >= frames {
            self.remaining -= frames;
            return Ok(());
        }

        let drop = self.remaining;
        self.remaining = 0;
        if drop > 0 {
            for plane in &mut frame.planes {
                plane.drain(..drop);
            }
        }
        let shift = frames_to_ticks(
            self.start_samples - drop,
            frame.sample_rate,
            frame.time_base,
        );
        frame.pts = frame.pts.map(|pts| pts - shift);
        out.push_back(frame);
        Ok(())
    }
}
