//! Linear filter chain
//!
//! Stages are described by [`StageDescriptor`]s (what to do), instantiated by
//! name and `key=value:key=value` option string through the
//! [`FilterRegistry`] (how to do it), and run by [`FilterChain`] between a
//! buffer source and a buffer sink.
//!
//! Every stage is an [`AudioFilter`]: frames are pushed in, zero or more
//! frames come out, and an explicit flush at end of stream releases whatever
//! the stage still holds.

mod buffer;
mod chain;
mod delay;
mod format;
mod limiter;
mod meter;
pub mod options;
mod registry;
mod trim;
mod volume;

use crate::error::Result;
use std::collections::VecDeque;
use tonal_media::{AudioStreamDescriptor, Frame, SampleFormat, TimeBase};

pub use chain::FilterChain;
pub use options::FilterOptions;
pub use registry::{FilterFactory, FilterRegistry};

/// Shape of the frames flowing between two stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_format: SampleFormat,
    pub time_base: TimeBase,
}

impl From<&AudioStreamDescriptor> for StreamSpec {
    fn from(stream: &AudioStreamDescriptor) -> Self {
        Self {
            sample_rate: stream.sample_rate,
            channels: stream.channels,
            sample_format: stream.sample_format,
            time_base: stream.time_base,
        }
    }
}

/// One processing stage of a chain
pub trait AudioFilter {
    /// Registered filter name
    fn name(&self) -> &'static str;

    /// Shape of the frames this stage emits
    fn output_spec(&self) -> StreamSpec;

    /// Consume one frame, appending any output to `out`
    fn filter_frame(&mut self, frame: Frame, out: &mut VecDeque<Frame>) -> Result<()>;

    /// End of stream: emit everything still buffered
    fn flush(&mut self, _out: &mut VecDeque<Frame>) -> Result<()> {
        Ok(())
    }

    /// Named numeric property, readable after the chain has been flushed.
    ///
    /// `Ok(None)` for keys the stage does not know; `Err` when the stage
    /// knows the key but cannot produce its value.
    fn property(&self, _key: &str) -> Result<Option<f64>> {
        Ok(None)
    }
}

/// What a chain stage does, independent of how it is instantiated
#[derive(Debug, Clone, PartialEq)]
pub enum StageDescriptor {
    /// Pad `seconds` of silence at the start
    Delay { seconds: f64 },
    /// Drop the first `seconds` of audio
    Trim { seconds: f64 },
    /// Uniform gain
    Gain { db: f64 },
    /// Brick-wall limiter against a ceiling referenced to 0 dBFS
    Limiter {
        limit_db: f64,
        attack_ms: f64,
        release_ms: f64,
    },
    /// Remix, resample and requantize
    Format {
        sample_format: SampleFormat,
        sample_rate: u32,
        channel_layout: &'static str,
    },
    /// Passthrough loudness and true peak meter
    Meter,
}

impl StageDescriptor {
    pub fn filter_name(&self) -> &'static str {
        match self {
            Self::Delay { .. } => "adelay",
            Self::Trim { .. } => "atrim",
            Self::Gain { .. } => "volume",
            Self::Limiter { .. } => "alimiter",
            Self::Format { .. } => "aformat",
            Self::Meter => "ebur128",
        }
    }

    /// Option string the stage is configured with
    pub fn options(&self) -> String {
        match self {
            Self::Delay { seconds } => format!("delays={}s:all=1", seconds),
            Self::Trim { seconds } => format!("start={}s", seconds),
            Self::Gain { db } => format!("volume={}dB", db),
            Self::Limiter {
                limit_db,
                attack_ms,
                release_ms,
            } => format!(
                "limit={}dB:attack={}:release={}:level=0",
                limit_db, attack_ms, release_ms
            ),
            Self::Format {
                sample_format,
                sample_rate,
                channel_layout,
            } => format!(
                "sample_fmts={}:sample_rates={}:channel_layouts={}",
                sample_format, sample_rate, channel_layout
            ),
            Self::Meter => "peak=true:framelog=quiet".to_string(),
        }
    }
}

/// Ticks of `time_base` spanned by `frames` samples at `sample_rate`
pub(crate) fn frames_to_ticks(frames: usize, sample_rate: u32, time_base: TimeBase) -> i64 {
    TimeBase::rescale(frames as i64, TimeBase::from_rate(sample_rate), time_base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_strings() {
        assert_eq!(
            StageDescriptor::Delay { seconds: 0.5 }.options(),
            "delays=0.5s:all=1"
        );
        assert_eq!(
            StageDescriptor::Trim { seconds: 0.25 }.options(),
            "start=0.25s"
        );
        assert_eq!(
            StageDescriptor::Gain { db: -3.5 }.options(),
            "volume=-3.5dB"
        );
        assert_eq!(
            StageDescriptor::Limiter {
                limit_db: 0.0,
                attack_ms: 12.0,
                release_ms: 200.0
            }
            .options(),
            "limit=0dB:attack=12:release=200:level=0"
        );
        assert_eq!(
            StageDescriptor::Format {
                sample_format: SampleFormat::S16,
                sample_rate: 48000,
                channel_layout: "stereo"
            }
            .options(),
            "sample_fmts=s16:sample_rates=48000:channel_layouts=stereo"
        );
        assert_eq!(StageDescriptor::Meter.filter_name(), "ebur128");
    }
}
