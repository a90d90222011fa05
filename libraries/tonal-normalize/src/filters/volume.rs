//! Uniform gain

use super::options::FilterOptions;
use super::{AudioFilter, StreamSpec};
use crate::error::Result;
use std::collections::VecDeque;
use tonal_media::{Frame, SampleFormat};

/// Multiplies every sample by a fixed factor. Output is planar float so
/// values above full scale survive until a later stage deals with them.
pub struct Volume {
    spec: StreamSpec,
    factor: f32,
}

impl Volume {
    /// Options: `volume`, linear or `dB`-suffixed (default 1.0)
    pub fn from_options(opts: &mut FilterOptions, input: &StreamSpec) -> Result<Self> {
        let factor = opts.take_gain("volume")?.unwrap_or(1.0);
        Ok(Self {
            spec: StreamSpec {
                sample_format: SampleFormat::F32Planar,
                ..*input
            },
            factor: factor as f32,
        })
    }
}

impl AudioFilter for Volume {
    fn name(&self) -> &'static str {
        "volume"
    }

    fn output_spec(&self) -> StreamSpec {
        self.spec
    }

    fn filter_frame(&mut self, mut frame: Frame, out: &mut VecDeque<Frame>) -> Result<()> {
        if (self.factor - 1.0).abs() > f32::EPSILON {
            for sample in frame.planes.iter_mut().flatten() {
                *sample *= self.factor;
            }
        }
        frame.format = SampleFormat::F32Planar;
        out.push_back(frame);
        Ok(())
    }
}
