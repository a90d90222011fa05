//! Stream-level value types shared by reader, writer and filters

use serde::{Deserialize, Serialize};
use std::fmt;
use symphonia::core::codecs::{
    CodecType, CODEC_TYPE_AAC, CODEC_TYPE_ALAC, CODEC_TYPE_FLAC, CODEC_TYPE_MP1, CODEC_TYPE_MP2,
    CODEC_TYPE_MP3, CODEC_TYPE_OPUS, CODEC_TYPE_PCM_F32LE, CODEC_TYPE_PCM_F64LE,
    CODEC_TYPE_PCM_S16LE, CODEC_TYPE_PCM_S24LE, CODEC_TYPE_PCM_S32LE, CODEC_TYPE_PCM_U8,
    CODEC_TYPE_VORBIS,
};

/// Kind of elementary stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    Unknown,
}

/// Sample representation of a stream or frame.
///
/// Names follow the usual short forms (`s16`, `fltp`, ...). Only `Fltp` is
/// planar; everything else describes interleaved storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleFormat {
    #[serde(rename = "u8")]
    U8,
    #[serde(rename = "s16")]
    S16,
    #[serde(rename = "s24")]
    S24,
    #[serde(rename = "s32")]
    S32,
    #[serde(rename = "flt")]
    F32,
    #[serde(rename = "fltp")]
    F32Planar,
    #[serde(rename = "dbl")]
    F64,
}

impl SampleFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::S16 => "s16",
            Self::S24 => "s24",
            Self::S32 => "s32",
            Self::F32 => "flt",
            Self::F32Planar => "fltp",
            Self::F64 => "dbl",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "u8" => Some(Self::U8),
            "s16" => Some(Self::S16),
            "s24" => Some(Self::S24),
            "s32" => Some(Self::S32),
            "flt" => Some(Self::F32),
            "fltp" => Some(Self::F32Planar),
            "dbl" => Some(Self::F64),
            _ => None,
        }
    }

    pub fn is_planar(self) -> bool {
        matches!(self, Self::F32Planar)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F32Planar | Self::F64)
    }

    pub fn bits_per_sample(self) -> u16 {
        match self {
            Self::U8 => 8,
            Self::S16 => 16,
            Self::S24 => 24,
            Self::S32 | Self::F32 | Self::F32Planar => 32,
            Self::F64 => 64,
        }
    }

    /// Full-scale divisor for integer formats (symmetric 2^(N-1) scaling)
    fn full_scale(self) -> Option<f32> {
        match self {
            Self::U8 => Some(128.0),
            Self::S16 => Some(32768.0),
            Self::S24 => Some(8388608.0),
            Self::S32 => Some(2147483648.0),
            Self::F32 | Self::F32Planar | Self::F64 => None,
        }
    }

    /// Snap a float sample onto this format's value grid.
    ///
    /// Integer formats round to the nearest code and clip to the code range;
    /// float formats pass through. The result converts to the integer code
    /// losslessly with [`SampleFormat::to_code`].
    pub fn quantize(self, sample: f32) -> f32 {
        match self.full_scale() {
            Some(scale) => self.to_code(sample) as f32 / scale,
            None => sample,
        }
    }

    /// Integer code for `sample` in this format (float formats return 0)
    pub fn to_code(self, sample: f32) -> i32 {
        match self.full_scale() {
            Some(scale) => {
                let code = (f64::from(sample) * f64::from(scale)).round();
                code.clamp(-f64::from(scale), f64::from(scale) - 1.0) as i32
            }
            None => 0,
        }
    }

    /// PCM codec storing this representation in a WAV container
    pub fn pcm_codec(self) -> Option<CodecId> {
        match self {
            Self::U8 => Some(CodecId::PcmU8),
            Self::S16 => Some(CodecId::PcmS16Le),
            Self::S24 => Some(CodecId::PcmS24Le),
            Self::S32 => Some(CodecId::PcmS32Le),
            Self::F32 => Some(CodecId::PcmF32Le),
            Self::F64 => Some(CodecId::PcmF64Le),
            Self::F32Planar => None,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<symphonia::core::sample::SampleFormat> for SampleFormat {
    fn from(format: symphonia::core::sample::SampleFormat) -> Self {
        use symphonia::core::sample::SampleFormat as Sf;
        match format {
            Sf::U8 | Sf::S8 => Self::U8,
            Sf::U16 | Sf::S16 => Self::S16,
            Sf::U24 | Sf::S24 => Self::S24,
            Sf::U32 | Sf::S32 => Self::S32,
            Sf::F32 => Self::F32,
            Sf::F64 => Self::F64,
        }
    }
}

/// Codec identity of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodecId {
    #[serde(rename = "pcm_u8")]
    PcmU8,
    #[serde(rename = "pcm_s16le")]
    PcmS16Le,
    #[serde(rename = "pcm_s24le")]
    PcmS24Le,
    #[serde(rename = "pcm_s32le")]
    PcmS32Le,
    #[serde(rename = "pcm_f32le")]
    PcmF32Le,
    #[serde(rename = "pcm_f64le")]
    PcmF64Le,
    #[serde(rename = "mp2")]
    Mp2,
    #[serde(rename = "mp3")]
    Mp3,
    #[serde(rename = "aac")]
    Aac,
    #[serde(rename = "flac")]
    Flac,
    #[serde(rename = "alac")]
    Alac,
    #[serde(rename = "vorbis")]
    Vorbis,
    #[serde(rename = "opus")]
    Opus,
    #[serde(rename = "unknown")]
    Unknown,
}

impl CodecId {
    pub fn name(self) -> &'static str {
        match self {
            Self::PcmU8 => "pcm_u8",
            Self::PcmS16Le => "pcm_s16le",
            Self::PcmS24Le => "pcm_s24le",
            Self::PcmS32Le => "pcm_s32le",
            Self::PcmF32Le => "pcm_f32le",
            Self::PcmF64Le => "pcm_f64le",
            Self::Mp2 => "mp2",
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Alac => "alac",
            Self::Vorbis => "vorbis",
            Self::Opus => "opus",
            Self::Unknown => "unknown",
        }
    }

    /// Sample representation implied by the codec itself, if any.
    ///
    /// PCM codecs fix their representation; perceptual codecs always decode
    /// to planar float. Lossless codecs depend on the stream and return `None`.
    pub fn implied_sample_format(self) -> Option<SampleFormat> {
        match self {
            Self::PcmU8 => Some(SampleFormat::U8),
            Self::PcmS16Le => Some(SampleFormat::S16),
            Self::PcmS24Le => Some(SampleFormat::S24),
            Self::PcmS32Le => Some(SampleFormat::S32),
            Self::PcmF32Le => Some(SampleFormat::F32),
            Self::PcmF64Le => Some(SampleFormat::F64),
            Self::Mp2 | Self::Mp3 | Self::Aac | Self::Vorbis | Self::Opus => {
                Some(SampleFormat::F32Planar)
            }
            Self::Flac | Self::Alac | Self::Unknown => None,
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<CodecType> for CodecId {
    fn from(codec: CodecType) -> Self {
        match codec {
            CODEC_TYPE_PCM_U8 => Self::PcmU8,
            CODEC_TYPE_PCM_S16LE => Self::PcmS16Le,
            CODEC_TYPE_PCM_S24LE => Self::PcmS24Le,
            CODEC_TYPE_PCM_S32LE => Self::PcmS32Le,
            CODEC_TYPE_PCM_F32LE => Self::PcmF32Le,
            CODEC_TYPE_PCM_F64LE => Self::PcmF64Le,
            CODEC_TYPE_MP1 | CODEC_TYPE_MP2 => Self::Mp2,
            CODEC_TYPE_MP3 => Self::Mp3,
            CODEC_TYPE_AAC => Self::Aac,
            CODEC_TYPE_FLAC => Self::Flac,
            CODEC_TYPE_ALAC => Self::Alac,
            CODEC_TYPE_VORBIS => Self::Vorbis,
            CODEC_TYPE_OPUS => Self::Opus,
            _ => Self::Unknown,
        }
    }
}

/// Rational time base: one timestamp tick lasts `numer / denom` seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeBase {
    pub numer: u32,
    pub denom: u32,
}

impl TimeBase {
    pub const fn new(numer: u32, denom: u32) -> Self {
        Self { numer, denom }
    }

    /// One tick per sample at `sample_rate`
    pub const fn from_rate(sample_rate: u32) -> Self {
        Self::new(1, sample_rate)
    }

    /// Convert `ts` from `from` ticks to `to` ticks, rounding to nearest.
    pub fn rescale(ts: i64, from: TimeBase, to: TimeBase) -> i64 {
        let num = i128::from(ts) * i128::from(from.numer) * i128::from(to.denom);
        let den = i128::from(from.denom) * i128::from(to.numer);
        if den == 0 {
            return ts;
        }
        let half = den / 2;
        let rounded = if num >= 0 {
            (num + half) / den
        } else {
            (num - half) / den
        };
        rounded as i64
    }

    /// Tick count closest to `seconds`
    pub fn ticks(self, seconds: f64) -> i64 {
        if self.numer == 0 {
            return 0;
        }
        (seconds * f64::from(self.denom) / f64::from(self.numer)).round() as i64
    }

    pub fn seconds(self, ts: i64) -> f64 {
        if self.denom == 0 {
            return 0.0;
        }
        ts as f64 * f64::from(self.numer) / f64::from(self.denom)
    }
}

impl From<symphonia::core::units::TimeBase> for TimeBase {
    fn from(tb: symphonia::core::units::TimeBase) -> Self {
        Self::new(tb.numer, tb.denom)
    }
}

impl fmt::Display for TimeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numer, self.denom)
    }
}

/// Snapshot of an opened audio stream. Never mutated after opening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioStreamDescriptor {
    pub stream_index: u32,
    pub media_type: MediaType,
    pub codec: CodecId,
    pub sample_format: SampleFormat,
    pub sample_rate: u32,
    pub channels: u16,
    #[serde(skip)]
    pub time_base: TimeBase,
}
