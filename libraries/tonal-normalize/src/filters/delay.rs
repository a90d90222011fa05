//! Leading silence

use super::options::{parse_duration, FilterOptions, Unit};
use super::{frames_to_ticks, AudioFilter, StreamSpec};
use crate::error::Result;
use std::collections::VecDeque;
use tonal_media::{Frame, MediaError};

/// Pads silence in front of the stream and shifts every timestamp by the
/// same amount. Only uniform delays across channels are supported.
pub struct Delay {
    spec: StreamSpec,
    /// Delay in samples
    samples: usize,
    started: bool,
}

impl Delay {
    /// Options: `delays` is a `|`-separated per-channel list, each entry in
    /// milliseconds unless suffixed with `s` (seconds) or `S` (samples);
    /// `all=1` extends the last entry to every remaining channel.
    pub fn from_options(opts: &mut FilterOptions, input: &StreamSpec) -> Result<Self> {
        let raw = opts.take("delays").unwrap_or_default();
        let fill = opts.take_bool("all")?.unwrap_or(false);
        let channels = usize::from(input.channels);

        let mut delays = Vec::with_capacity(channels);
        for entry in raw.split('|').filter(|e| !e.is_empty()) {
            delays.push(parse_delay(entry, input.sample_rate).ok_or_else(|| {
                MediaError::new(
                    "configure filter",
                    format!("invalid delay '{}' for adelay", entry),
                )
            })?);
        }
        let last = delays.last().copied().unwrap_or(0);
        delays.resize(channels, if fill { last } else { 0 });
        delays.truncate(channels);

        let samples = delays.first().copied().unwrap_or(0);
        if delays.iter().any(|&d| d != samples) {
            return Err(MediaError::new(
                "configure filter",
                format!("adelay needs equal delays on all channels, got {}", raw),
            )
            .into());
        }

        Ok(Self {
            spec: *input,
            samples,
            started: false,
        })
    }
}

fn parse_delay(entry: &str, sample_rate: u32) -> Option<usize> {
    let samples = if let Some(count) = entry.strip_suffix('S') {
        count.parse::<f64>().ok()?
    } else {
        parse_duration(entry, Unit::Milliseconds)? * f64::from(sample_rate)
    };
    (samples.is_finite() && samples >= 0.0).then(|| samples.round() as usize)
}

impl AudioFilter for Delay {
    fn name(&self) -> &'static str {
        "adelay"
    }

    fn output_spec(&self) -> StreamSpec {
        self.spec
    }

    fn filter_frame(&mut self, mut frame: Frame, out: &mut VecDeque<Frame>) -> Result<()> {
        let shift = frames_to_ticks(self.samples, frame.sample_rate, frame.time_base);
        if !self.started {
            self.started = true;
            if self.samples > 0 {
                let mut silence = Frame::silence(
                    self.samples,
                    frame.channels(),
                    frame.sample_rate,
                    frame.format,
                    frame.time_base,
                );
                silence.pts = frame.pts;
                out.push_back(silence);
            }
        }
        frame.pts = frame.pts.map(|pts| pts + shift);
        out.push_back(frame);
        Ok(())
    }
}
