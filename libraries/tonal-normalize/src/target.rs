//! Mastering target configuration

use crate::error::{NormalizeError, Result};
use serde::{Deserialize, Serialize};
use tonal_media::{CodecId, EncoderConfig, SampleFormat};

/// The canonical output every normalized file is brought to.
///
/// Deserializes with per-field defaults, so a partial TOML table or a few
/// environment variables override only what they name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationTarget {
    /// Output codec (PCM only)
    pub codec: CodecId,
    /// Sample representation; must be the one `codec` stores
    pub sample_format: SampleFormat,
    pub sample_rate: u32,
    /// 1 (mono) or 2 (stereo)
    pub channels: u16,
    /// Integrated loudness in LUFS
    pub loudness_lufs: f64,
    /// Peak ceiling in dB
    pub limit_db: f64,
    /// Limiter attack in milliseconds
    pub attack_ms: f64,
    /// Limiter release in milliseconds
    pub release_ms: f64,
    pub true_peak_tolerance_db: f64,
    pub gain_tolerance_db: f64,
    pub offset_tolerance_seconds: f64,
}

impl Default for NormalizationTarget {
    fn default() -> Self {
        Self {
            codec: CodecId::PcmS16Le,
            sample_format: SampleFormat::S16,
            sample_rate: 48000,
            channels: 2,
            loudness_lufs: -8.0,
            limit_db: 0.0,
            attack_ms: 12.0,
            release_ms: 200.0,
            true_peak_tolerance_db: 1.0,
            gain_tolerance_db: 1.0,
            offset_tolerance_seconds: 0.0001,
        }
    }
}

impl NormalizationTarget {
    /// Check every field is usable by the filter chain and encoder
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(NormalizeError::InvalidTarget(msg));

        if !matches!(
            self.codec,
            CodecId::PcmU8
                | CodecId::PcmS16Le
                | CodecId::PcmS24Le
                | CodecId::PcmS32Le
                | CodecId::PcmF32Le
        ) {
            return invalid(format!("codec {} cannot be written", self.codec));
        }
        if self.codec.implied_sample_format() != Some(self.sample_format) {
            return invalid(format!(
                "sample format {} does not match codec {}",
                self.sample_format, self.codec
            ));
        }
        if !(8000..=384000).contains(&self.sample_rate) {
            return invalid(format!(
                "sample rate {} Hz outside 8000-384000",
                self.sample_rate
            ));
        }
        if self.channel_layout().is_none() {
            return invalid(format!(
                "{} channels (only mono or stereo output)",
                self.channels
            ));
        }
        if !self.loudness_lufs.is_finite() || self.loudness_lufs > 0.0 {
            return invalid(format!("loudness {} LUFS", self.loudness_lufs));
        }
        if !(-24.0..=0.0).contains(&self.limit_db) {
            return invalid(format!("limit {} dB outside -24..0", self.limit_db));
        }
        for (name, ms) in [("attack", self.attack_ms), ("release", self.release_ms)] {
            if !(ms.is_finite() && ms > 0.0) {
                return invalid(format!("{} {} ms must be positive", name, ms));
            }
        }
        for (name, tolerance) in [
            ("true peak tolerance", self.true_peak_tolerance_db),
            ("gain tolerance", self.gain_tolerance_db),
            ("offset tolerance", self.offset_tolerance_seconds),
        ] {
            if !(tolerance.is_finite() && tolerance >= 0.0) {
                return invalid(format!("{} {} must be non-negative", name, tolerance));
            }
        }
        Ok(())
    }

    /// Channel layout name used in format stage options
    pub fn channel_layout(&self) -> Option<&'static str> {
        match self.channels {
            1 => Some("mono"),
            2 => Some("stereo"),
            _ => None,
        }
    }

    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            codec: self.codec,
            sample_format: self.sample_format,
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let target = NormalizationTarget::default();
        target.validate().unwrap();
        assert_eq!(target.channel_layout(), Some("stereo"));
        assert_eq!(target.encoder_config().sample_rate, 48000);
    }

    #[test]
    fn rejects_codec_format_mismatch() {
        let target = NormalizationTarget {
            sample_format: SampleFormat::F32,
            ..NormalizationTarget::default()
        };
        assert!(matches!(
            target.validate(),
            Err(NormalizeError::InvalidTarget(_))
        ));
    }

    #[test]
    fn rejects_unwritable_codec() {
        let target = NormalizationTarget {
            codec: CodecId::Flac,
            ..NormalizationTarget::default()
        };
        assert!(target.validate().is_err());
    }

    #[test]
    fn rejects_surround_output() {
        let target = NormalizationTarget {
            channels: 6,
            ..NormalizationTarget::default()
        };
        assert!(target.validate().is_err());
    }

    #[test]
    fn rejects_negative_tolerance_and_bad_timing() {
        let target = NormalizationTarget {
            gain_tolerance_db: -1.0,
            ..NormalizationTarget::default()
        };
        assert!(target.validate().is_err());

        let target = NormalizationTarget {
            attack_ms: 0.0,
            ..NormalizationTarget::default()
        };
        assert!(target.validate().is_err());

        let target = NormalizationTarget {
            limit_db: 3.0,
            ..NormalizationTarget::default()
        };
        assert!(target.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let target: NormalizationTarget =
            serde_json::from_str(r#"{"sample_rate": 44100, "codec": "pcm_s24le", "sample_format": "s24"}"#)
                .unwrap();
        assert_eq!(target.sample_rate, 44100);
        assert_eq!(target.codec, CodecId::PcmS24Le);
        assert_eq!(target.loudness_lufs, -8.0);
        target.validate().unwrap();
    }
}
