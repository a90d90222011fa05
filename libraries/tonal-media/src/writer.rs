//! Destination side of the media boundary: PCM encoder and WAV muxer
//!
//! The muxer writes into a sibling staging file and only moves it onto the
//! destination when the trailer is written, so a file at the destination path
//! is always complete.

use crate::error::{ensure, MediaError, OrMedia, Result};
use crate::frame::{EncodedPacket, Frame, PacketData, Receive};
use crate::types::{CodecId, SampleFormat, TimeBase};
use hound::{WavSpec, WavWriter};
use std::collections::VecDeque;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Parameters an [`Encoder`] is opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    pub codec: CodecId,
    pub sample_format: SampleFormat,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Push-frame / pull-packet PCM encoder
pub struct Encoder {
    config: EncoderConfig,
    time_base: TimeBase,
    pending: VecDeque<EncodedPacket>,
    flushed: bool,
}

impl Encoder {
    pub fn open(config: EncoderConfig) -> Result<Self> {
        ensure(
            matches!(
                config.codec,
                CodecId::PcmU8
                    | CodecId::PcmS16Le
                    | CodecId::PcmS24Le
                    | CodecId::PcmS32Le
                    | CodecId::PcmF32Le
            ),
            "find encoder",
            format!("unsupported codec: {}", config.codec),
        )?;
        ensure(
            config.codec.implied_sample_format() == Some(config.sample_format),
            "open encoder",
            format!(
                "sample format {} not supported by {}",
                config.sample_format, config.codec
            ),
        )?;
        ensure(
            config.sample_rate > 0,
            "open encoder",
            "invalid sample rate 0",
        )?;
        ensure(
            config.channels > 0,
            "open encoder",
            "invalid channel count 0",
        )?;

        Ok(Self {
            config,
            time_base: TimeBase::from_rate(config.sample_rate),
            pending: VecDeque::new(),
            flushed: false,
        })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Always one tick per sample at the output rate
    pub fn time_base(&self) -> TimeBase {
        self.time_base
    }

    /// Encode `frame`, or signal end of input with `None`
    pub fn send_frame(&mut self, frame: Option<&Frame>) -> Result<()> {
        let Some(frame) = frame else {
            tracing::trace!("Encoder flushed");
            self.flushed = true;
            return Ok(());
        };

        ensure(!self.flushed, "send frame to encoder", "encoder already flushed")?;
        ensure(
            frame.channels() == usize::from(self.config.channels),
            "send frame to encoder",
            format!(
                "frame has {} channels, encoder expects {}",
                frame.channels(),
                self.config.channels
            ),
        )?;
        ensure(
            frame.sample_rate == self.config.sample_rate,
            "send frame to encoder",
            format!(
                "frame sample rate {} differs from encoder rate {}",
                frame.sample_rate, self.config.sample_rate
            ),
        )?;
        if frame.is_empty() {
            return Ok(());
        }

        let format = self.config.sample_format;
        let samples = interleave(frame);
        let data = match format {
            SampleFormat::U8 => {
                PacketData::Int8(samples.iter().map(|&s| format.to_code(s) as i8).collect())
            }
            SampleFormat::S16 => {
                PacketData::Int16(samples.iter().map(|&s| format.to_code(s) as i16).collect())
            }
            SampleFormat::S24 => {
                PacketData::Int24(samples.iter().map(|&s| format.to_code(s)).collect())
            }
            SampleFormat::S32 => {
                PacketData::Int32(samples.iter().map(|&s| format.to_code(s)).collect())
            }
            SampleFormat::F32 | SampleFormat::F32Planar | SampleFormat::F64 => {
                PacketData::Float32(samples)
            }
        };

        self.pending.push_back(EncodedPacket {
            pts: frame.pts,
            duration: frame.frames() as i64,
            data,
        });
        Ok(())
    }

    pub fn receive_packet(&mut self) -> Receive<EncodedPacket> {
        match self.pending.pop_front() {
            Some(packet) => Receive::Ready(packet),
            None if self.flushed => Receive::EndOfStream,
            None => Receive::NotReady,
        }
    }
}

fn interleave(frame: &Frame) -> Vec<f32> {
    let channels = frame.channels();
    let mut out = Vec::with_capacity(frame.frames() * channels);
    for i in 0..frame.frames() {
        for plane in &frame.planes {
            out.push(plane[i]);
        }
    }
    out
}

/// Staging path used while the destination is being written
pub fn staging_path(dst: &Path) -> PathBuf {
    let mut name = dst.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// WAV muxer with one PCM stream
pub struct MediaWriter {
    path: PathBuf,
    staging: PathBuf,
    spec: Option<WavSpec>,
    writer: Option<WavWriter<BufWriter<File>>>,
    last_pts: Option<i64>,
}

impl MediaWriter {
    /// Allocate an output container for `path`.
    ///
    /// Nothing touches the filesystem until [`MediaWriter::write_header`].
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        ensure(
            path.file_name().is_some(),
            "allocate output context",
            "destination has no file name",
        )
        .map_err(|e| e.with_path(path))?;

        Ok(Self {
            staging: staging_path(path),
            path: path.to_path_buf(),
            spec: None,
            writer: None,
            last_pts: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add the output stream described by an opened encoder
    pub fn add_stream(&mut self, encoder: &Encoder) -> Result<()> {
        ensure(
            self.spec.is_none(),
            "allocate output stream",
            "container already has a stream",
        )?;

        let config = encoder.config();
        let sample_format = if config.sample_format.is_float() {
            hound::SampleFormat::Float
        } else {
            hound::SampleFormat::Int
        };
        self.spec = Some(WavSpec {
            channels: config.channels,
            sample_rate: config.sample_rate,
            bits_per_sample: config.sample_format.bits_per_sample(),
            sample_format,
        });
        Ok(())
    }

    pub fn write_header(&mut self) -> Result<()> {
        let spec = self
            .spec
            .ok_or_else(|| MediaError::new("write output file header", "no stream added"))?;
        ensure(
            self.writer.is_none(),
            "write output file header",
            "header already written",
        )?;

        let writer = WavWriter::create(&self.staging, spec)
            .map_err(|e| MediaError::new("open output file", e).with_path(&self.path))?;
        tracing::debug!("Writing to staging file {}", self.staging.display());
        self.writer = Some(writer);
        Ok(())
    }

    /// Write one packet; packets must arrive in presentation order
    pub fn write_interleaved(&mut self, packet: &EncodedPacket) -> Result<()> {
        if let (Some(last), Some(pts)) = (self.last_pts, packet.pts) {
            ensure(
                pts >= last,
                "write packet",
                format!("non-monotonic pts {pts} after {last}"),
            )?;
        }
        if packet.pts.is_some() {
            self.last_pts = packet.pts;
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| MediaError::new("write packet", "header not written"))?;

        match &packet.data {
            PacketData::Int8(samples) => {
                for &s in samples {
                    writer.write_sample(s).or_media("write packet")?;
                }
            }
            PacketData::Int16(samples) => {
                for &s in samples {
                    writer.write_sample(s).or_media("write packet")?;
                }
            }
            PacketData::Int24(samples) | PacketData::Int32(samples) => {
                for &s in samples {
                    writer.write_sample(s).or_media("write packet")?;
                }
            }
            PacketData::Float32(samples) => {
                for &s in samples {
                    writer.write_sample(s).or_media("write packet")?;
                }
            }
        }
        Ok(())
    }

    /// Finalize the container and move it onto the destination path
    pub fn write_trailer(mut self) -> Result<()> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| MediaError::new("write output file trailer", "header not written"))?;
        writer.finalize().or_media("write output file trailer")?;

        std::fs::rename(&self.staging, &self.path)
            .map_err(|e| MediaError::new("write output file trailer", e).with_path(&self.path))?;
        tracing::debug!("Finalized {}", self.path.display());
        Ok(())
    }
}
