//! Passthrough loudness meter stage

use super::options::FilterOptions;
use super::{AudioFilter, StreamSpec};
use crate::error::Result;
use std::collections::VecDeque;
use tonal_loudness::LoudnessMeter;
use tonal_media::{Frame, MediaError, OrMedia};
use tracing::info;

/// Feeds every frame through an EBU R128 meter and passes it on unchanged.
///
/// Readable properties: `integrated` (LUFS), `true_peak` (dBTP),
/// `sample_peak` (dBFS) and `duration` (seconds).
pub struct Meter {
    spec: StreamSpec,
    meter: LoudnessMeter,
    /// Log a summary at end of stream
    verbose: bool,
}

impl Meter {
    /// Options: `peak` (`true`, `sample`, `true+sample` or `none`; true and
    /// sample peaks are always measured) and `framelog` (`quiet` or
    /// `verbose`).
    pub fn from_options(opts: &mut FilterOptions, input: &StreamSpec) -> Result<Self> {
        if let Some(peak) = opts.take("peak") {
            if !matches!(peak.as_str(), "true" | "sample" | "true+sample" | "none") {
                return Err(MediaError::new(
                    "configure filter",
                    format!("invalid peak mode '{}' for ebur128", peak),
                )
                .into());
            }
        }
        let verbose = match opts.take("framelog").as_deref() {
            None | Some("quiet") => false,
            Some("verbose" | "info") => true,
            Some(other) => {
                return Err(MediaError::new(
                    "configure filter",
                    format!("invalid framelog '{}' for ebur128", other),
                )
                .into())
            }
        };

        Ok(Self {
            spec: *input,
            meter: LoudnessMeter::new(input.sample_rate, u32::from(input.channels))?,
            verbose,
        })
    }
}

impl AudioFilter for Meter {
    fn name(&self) -> &'static str {
        "ebur128"
    }

    fn output_spec(&self) -> StreamSpec {
        self.spec
    }

    fn filter_frame(&mut self, frame: Frame, out: &mut VecDeque<Frame>) -> Result<()> {
        self.meter.add_planar(&frame.planes)?;
        out.push_back(frame);
        Ok(())
    }

    fn flush(&mut self, _out: &mut VecDeque<Frame>) -> Result<()> {
        if self.verbose {
            info!(
                "Summary: I {:.1} LUFS, true peak {:.1} dBTP over {:.2}s",
                self.meter.integrated_lufs()?,
                self.meter.true_peak_dbtp()?,
                self.meter.duration_seconds()
            );
        }
        Ok(())
    }

    fn property(&self, key: &str) -> Result<Option<f64>> {
        let value = match key {
            "integrated" => self.meter.integrated_lufs(),
            "true_peak" => self.meter.true_peak_dbtp(),
            "sample_peak" => self.meter.sample_peak_dbfs(),
            "duration" => Ok(self.meter.duration_seconds()),
            _ => return Ok(None),
        };
        let value = value.or_media(&format!("read meter {}", key))?;
        Ok(Some(value))
    }
}
