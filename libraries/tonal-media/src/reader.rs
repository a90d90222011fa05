//! Source side of the media boundary: container probe, demux and decode
//!
//! [`MediaReader`] wraps a symphonia format reader and exposes the single best
//! audio stream. [`Decoder`] follows a push-packet / pull-frame discipline so
//! the pump can drive it exactly like any other stage.

use crate::error::{ensure, MediaError, OrMedia, Result};
use crate::frame::{Frame, Receive};
use crate::types::{AudioStreamDescriptor, CodecId, MediaType, SampleFormat, TimeBase};
use std::collections::VecDeque;
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{CodecParameters, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::IntoSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// A demuxed, still-encoded unit of the selected stream
pub struct Packet {
    inner: symphonia::core::formats::Packet,
}

impl Packet {
    pub fn stream_index(&self) -> u32 {
        self.inner.track_id()
    }

    /// Presentation timestamp in stream time-base ticks
    pub fn pts(&self) -> i64 {
        self.inner.ts() as i64
    }

    pub fn duration(&self) -> u64 {
        self.inner.dur()
    }
}

/// An opened source container with one selected audio stream
pub struct MediaReader {
    path: PathBuf,
    format: Box<dyn FormatReader>,
    codec_params: CodecParameters,
    stream: AudioStreamDescriptor,
}

impl MediaReader {
    /// Open `path`, probe its container and select the best audio stream.
    ///
    /// The container's default track wins when it carries a real codec;
    /// otherwise the first track with one is taken.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Opening input container {}", path.display());

        let file = File::open(path)
            .map_err(|e| MediaError::new("open input container", e).with_path(path))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| MediaError::new("open input container", e).with_path(path))?;
        let format = probed.format;

        let track = format
            .default_track()
            .filter(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .or_else(|| {
                format
                    .tracks()
                    .iter()
                    .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            })
            .ok_or_else(|| {
                MediaError::new("find audio stream", "no audio stream in container")
                    .with_path(path)
            })?;

        let codec_params = track.codec_params.clone();
        let stream = describe(track.id, &codec_params);

        tracing::debug!(
            "Selected stream {} ({}, {}, {} Hz, {} ch)",
            stream.stream_index,
            stream.codec,
            stream.sample_format,
            stream.sample_rate,
            stream.channels
        );

        Ok(Self {
            path: path.to_path_buf(),
            format,
            codec_params,
            stream,
        })
    }

    pub fn stream(&self) -> &AudioStreamDescriptor {
        &self.stream
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next packet of any stream, or `None` at end of container.
    ///
    /// A reset request from the demuxer (chained streams) is treated as the
    /// end of the selected stream.
    pub fn read_packet(&mut self) -> Result<Option<Packet>> {
        match self.format.next_packet() {
            Ok(inner) => Ok(Some(Packet { inner })),
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Ok(None)
            }
            Err(SymphoniaError::ResetRequired) => {
                tracing::warn!(
                    "Stream layout changed mid-file in {}, stopping at first segment",
                    self.path.display()
                );
                Ok(None)
            }
            Err(e) => Err(MediaError::new("read packet", e).with_path(&self.path)),
        }
    }

    /// Open a decoder matching the selected stream
    pub fn open_decoder(&self) -> Result<Decoder> {
        ensure(
            self.stream.channels > 0,
            "open decoder",
            "No audio channels available in stream",
        )?;
        ensure(
            self.stream.sample_rate > 0,
            "open decoder",
            "stream has no sample rate",
        )?;

        let inner = symphonia::default::get_codecs()
            .make(&self.codec_params, &DecoderOptions::default())
            .or_media("open decoder")?;

        Ok(Decoder {
            inner,
            stream: self.stream.clone(),
            pending: VecDeque::new(),
            flushed: false,
        })
    }
}

fn describe(track_id: u32, params: &CodecParameters) -> AudioStreamDescriptor {
    let codec = CodecId::from(params.codec);
    let sample_rate = params.sample_rate.unwrap_or(0);
    let channels = params.channels.map_or(0, |c| c.count() as u16);

    let sample_format = codec
        .implied_sample_format()
        .or_else(|| params.sample_format.map(SampleFormat::from))
        .or_else(|| match params.bits_per_sample {
            Some(0..=8) => Some(SampleFormat::U8),
            Some(9..=16) => Some(SampleFormat::S16),
            Some(17..=24) => Some(SampleFormat::S24),
            Some(_) => Some(SampleFormat::S32),
            None => None,
        })
        .unwrap_or(SampleFormat::F32Planar);

    let time_base = params
        .time_base
        .map(TimeBase::from)
        .unwrap_or_else(|| TimeBase::from_rate(sample_rate.max(1)));

    AudioStreamDescriptor {
        stream_index: track_id,
        media_type: if sample_rate > 0 {
            MediaType::Audio
        } else {
            MediaType::Unknown
        },
        codec,
        sample_format,
        sample_rate,
        channels,
        time_base,
    }
}

/// Push-packet / pull-frame decoder for the selected stream
pub struct Decoder {
    inner: Box<dyn symphonia::core::codecs::Decoder>,
    stream: AudioStreamDescriptor,
    pending: VecDeque<Frame>,
    flushed: bool,
}

impl Decoder {
    /// Decode `packet`, or signal end of input with `None`.
    ///
    /// Decoded frames queue up until pulled with [`Decoder::receive_frame`].
    pub fn send_packet(&mut self, packet: Option<&Packet>) -> Result<()> {
        let Some(packet) = packet else {
            tracing::trace!("Decoder flushed");
            self.flushed = true;
            return Ok(());
        };

        let decoded = self
            .inner
            .decode(&packet.inner)
            .or_media("decode packet")?;
        let planes = planes_of_ref(decoded);
        if planes.first().map_or(true, Vec::is_empty) {
            return Ok(());
        }

        self.pending.push_back(Frame::new(
            planes,
            self.stream.sample_rate,
            self.stream.sample_format,
            self.stream.time_base,
            Some(packet.pts()),
        ));
        Ok(())
    }

    pub fn receive_frame(&mut self) -> Receive<Frame> {
        match self.pending.pop_front() {
            Some(frame) => Receive::Ready(frame),
            None if self.flushed => Receive::EndOfStream,
            None => Receive::NotReady,
        }
    }

    pub fn stream(&self) -> &AudioStreamDescriptor {
        &self.stream
    }
}

/// Planar f32 copy of a decoded buffer (symmetric 2^(N-1) integer scaling)
fn planes_of_ref(decoded: AudioBufferRef<'_>) -> Vec<Vec<f32>> {
    match decoded {
        AudioBufferRef::U8(buf) => planes_of(&*buf),
        AudioBufferRef::U16(buf) => planes_of(&*buf),
        AudioBufferRef::U24(buf) => planes_of(&*buf),
        AudioBufferRef::U32(buf) => planes_of(&*buf),
        AudioBufferRef::S8(buf) => planes_of(&*buf),
        AudioBufferRef::S16(buf) => planes_of(&*buf),
        AudioBufferRef::S24(buf) => planes_of(&*buf),
        AudioBufferRef::S32(buf) => planes_of(&*buf),
        AudioBufferRef::F32(buf) => planes_of(&*buf),
        AudioBufferRef::F64(buf) => planes_of(&*buf),
    }
}

fn planes_of<S>(buf: &AudioBuffer<S>) -> Vec<Vec<f32>>
where
    S: Sample + IntoSample<f32>,
{
    (0..buf.spec().channels.count())
        .map(|ch| buf.chan(ch).iter().map(|&s| s.into_sample()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::codecs::{CODEC_TYPE_FLAC, CODEC_TYPE_MP3, CODEC_TYPE_PCM_S24LE};

    #[test]
    fn pcm_codec_fixes_sample_format() {
        let mut params = CodecParameters::new();
        params
            .for_codec(CODEC_TYPE_PCM_S24LE)
            .with_sample_rate(96000)
            .with_bits_per_sample(24);
        let stream = describe(3, &params);
        assert_eq!(stream.stream_index, 3);
        assert_eq!(stream.codec, CodecId::PcmS24Le);
        assert_eq!(stream.sample_format, SampleFormat::S24);
        assert_eq!(stream.time_base, TimeBase::from_rate(96000));
        assert_eq!(stream.media_type, MediaType::Audio);
    }

    #[test]
    fn perceptual_codec_decodes_to_planar_float() {
        let mut params = CodecParameters::new();
        params.for_codec(CODEC_TYPE_MP3).with_sample_rate(44100);
        assert_eq!(describe(0, &params).sample_format, SampleFormat::F32Planar);
    }

    #[test]
    fn lossless_codec_uses_bit_depth() {
        let mut params = CodecParameters::new();
        params
            .for_codec(CODEC_TYPE_FLAC)
            .with_sample_rate(48000)
            .with_bits_per_sample(16);
        assert_eq!(describe(0, &params).sample_format, SampleFormat::S16);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = MediaReader::open("/definitely/not/here.wav")
            .err()
            .expect("open must fail");
        assert_eq!(err.operation(), "open input container");
        assert!(err.to_string().contains("(while opening: /definitely/not/here.wav)"));
    }
}
