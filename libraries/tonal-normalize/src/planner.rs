//! Which transforms a measured stream needs to reach a target

use crate::analyzer::AudioStreamMeta;
use crate::filters::StageDescriptor;
use crate::target::NormalizationTarget;
use serde::Serialize;

/// Independent transform decisions for one stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TransformPlan {
    /// Sample rate, channel count or sample format differ from the target
    pub format_conversion: bool,
    /// Signed gain in dB bringing the measured loudness onto the target
    pub gain_adjustment: Option<f64>,
    /// True peak is off the limit by at least the tolerance
    pub peak_limiting: bool,
    /// Requested shift in seconds: positive pads, negative trims
    pub time_offset: Option<f64>,
    /// Source codec differs from the target codec
    pub codec_mismatch: bool,
}

impl TransformPlan {
    /// Whether anything at all has to be written
    pub fn any(&self) -> bool {
        self.format_conversion
            || self.gain_adjustment.is_some()
            || self.peak_limiting
            || self.time_offset.is_some()
            || self.codec_mismatch
    }

    /// Chain stages realizing this plan, in fixed order: offset, gain,
    /// limiter, format. A codec mismatch alone needs no stage; the encoder
    /// does the conversion.
    pub fn stages(&self, target: &NormalizationTarget) -> Vec<StageDescriptor> {
        let mut stages = Vec::with_capacity(4);

        match self.time_offset {
            Some(offset) if offset > 0.0 => stages.push(StageDescriptor::Delay { seconds: offset }),
            Some(offset) if offset < 0.0 => stages.push(StageDescriptor::Trim { seconds: -offset }),
            _ => {}
        }
        if let Some(db) = self.gain_adjustment {
            stages.push(StageDescriptor::Gain { db });
        }
        if self.peak_limiting {
            stages.push(StageDescriptor::Limiter {
                limit_db: target.limit_db,
                attack_ms: target.attack_ms,
                release_ms: target.release_ms,
            });
        }
        if self.format_conversion {
            if let Some(channel_layout) = target.channel_layout() {
                stages.push(StageDescriptor::Format {
                    sample_format: target.sample_format,
                    sample_rate: target.sample_rate,
                    channel_layout,
                });
            }
        }
        stages
    }
}

/// Decide every transform independently against its own tolerance
pub fn plan(measured: &AudioStreamMeta, target: &NormalizationTarget, offset: f64) -> TransformPlan {
    let stream = &measured.stream;
    let loudness = &measured.loudness;

    let gain = target.loudness_lufs - loudness.integrated_lufs;
    let peak_deviation = (loudness.true_peak_dbtp - target.limit_db).abs();

    TransformPlan {
        format_conversion: stream.sample_rate != target.sample_rate
            || stream.channels != target.channels
            || stream.sample_format != target.sample_format,
        gain_adjustment: (gain.abs() >= target.gain_tolerance_db).then_some(gain),
        peak_limiting: peak_deviation >= target.true_peak_tolerance_db,
        time_offset: (offset.abs() >= target.offset_tolerance_seconds).then_some(offset),
        codec_mismatch: stream.codec != target.codec,
    }
}
