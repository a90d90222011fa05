//! Chain endpoints

use super::options::FilterOptions;
use super::{AudioFilter, StreamSpec};
use crate::error::Result;
use std::collections::VecDeque;
use tonal_media::{ensure, Frame, MediaError, SampleFormat, TimeBase};

/// Chain input. Declares the shape of the frames the chain accepts and
/// rejects frames that do not match it.
pub struct BufferSource {
    spec: StreamSpec,
}

impl BufferSource {
    /// Option string describing `spec`
    pub fn options_for(spec: &StreamSpec) -> String {
        format!(
            "time_base={}:sample_rate={}:sample_fmt={}:channels={}",
            spec.time_base, spec.sample_rate, spec.sample_format, spec.channels
        )
    }

    pub fn from_options(opts: &mut FilterOptions) -> Result<Self> {
        let time_base = opts.take("time_base").unwrap_or_default();
        let time_base = parse_time_base(&time_base).ok_or_else(|| {
            MediaError::new(
                "configure filter",
                format!("invalid time base '{}' for abuffer", time_base),
            )
        })?;
        let sample_rate = opts.take_u32("sample_rate")?.unwrap_or(0);
        let channels = opts.take_u32("channels")?.unwrap_or(0);
        let name = opts.take("sample_fmt").unwrap_or_default();
        let sample_format = SampleFormat::from_name(&name).ok_or_else(|| {
            MediaError::new(
                "configure filter",
                format!("unknown sample format '{}' for abuffer", name),
            )
        })?;
        ensure(
            sample_rate > 0,
            "configure filter",
            "abuffer needs a sample rate",
        )?;
        ensure(
            (1..=u32::from(u16::MAX)).contains(&channels),
            "configure filter",
            "abuffer needs a channel count",
        )?;

        Ok(Self {
            spec: StreamSpec {
                sample_rate,
                channels: channels as u16,
                sample_format,
                time_base,
            },
        })
    }
}

impl AudioFilter for BufferSource {
    fn name(&self) -> &'static str {
        "abuffer"
    }

    fn output_spec(&self) -> StreamSpec {
        self.spec
    }

    fn filter_frame(&mut self, frame: Frame, out: &mut VecDeque<Frame>) -> Result<()> {
        ensure(
            frame.sample_rate == self.spec.sample_rate,
            "filter frame",
            format!(
                "frame at {} Hz fed to a {} Hz chain",
                frame.sample_rate, self.spec.sample_rate
            ),
        )?;
        ensure(
            frame.channels() == usize::from(self.spec.channels),
            "filter frame",
            format!(
                "{} channel frame fed to a {} channel chain",
                frame.channels(),
                self.spec.channels
            ),
        )?;
        out.push_back(frame);
        Ok(())
    }
}

/// Chain output
pub struct BufferSink {
    spec: StreamSpec,
}

impl BufferSink {
    pub fn new(spec: StreamSpec) -> Self {
        Self { spec }
    }
}

impl AudioFilter for BufferSink {
    fn name(&self) -> &'static str {
        "abuffersink"
    }

    fn output_spec(&self) -> StreamSpec {
        self.spec
    }

    fn filter_frame(&mut self, frame: Frame, out: &mut VecDeque<Frame>) -> Result<()> {
        out.push_back(frame);
        Ok(())
    }
}

fn parse_time_base(raw: &str) -> Option<TimeBase> {
    let (numer, denom) = raw.split_once('/')?;
    let numer: u32 = numer.parse().ok()?;
    let denom: u32 = denom.parse().ok()?;
    (numer > 0 && denom > 0).then(|| TimeBase::new(numer, denom))
}
