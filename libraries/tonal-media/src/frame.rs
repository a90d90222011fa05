//! Decoded frames, encoded packets and the push/pull result type

use crate::types::{SampleFormat, TimeBase};

/// Result of pulling from a push/pull component
#[derive(Debug, Clone, PartialEq)]
pub enum Receive<T> {
    /// An item is available
    Ready(T),
    /// More input is required before anything comes out
    NotReady,
    /// The component has been flushed and has nothing left
    EndOfStream,
}

impl<T> Receive<T> {
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(item) => Some(item),
            Self::NotReady | Self::EndOfStream => None,
        }
    }
}

/// A run of decoded audio.
///
/// Samples are held planar as `f32` regardless of `format`; `format` records
/// which representation the values are exact in (after quantization by
/// `aformat` an `s16` frame holds only values on the 16-bit grid).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Presentation time of the first sample, in `time_base` ticks
    pub pts: Option<i64>,
    pub time_base: TimeBase,
    pub sample_rate: u32,
    pub format: SampleFormat,
    pub planes: Vec<Vec<f32>>,
}

impl Frame {
    pub fn new(
        planes: Vec<Vec<f32>>,
        sample_rate: u32,
        format: SampleFormat,
        time_base: TimeBase,
        pts: Option<i64>,
    ) -> Self {
        Self {
            pts,
            time_base,
            sample_rate,
            format,
            planes,
        }
    }

    /// All-zero frame
    pub fn silence(
        frames: usize,
        channels: usize,
        sample_rate: u32,
        format: SampleFormat,
        time_base: TimeBase,
    ) -> Self {
        Self::new(
            vec![vec![0.0; frames]; channels],
            sample_rate,
            format,
            time_base,
            None,
        )
    }

    /// Samples per channel
    pub fn frames(&self) -> usize {
        self.planes.first().map_or(0, Vec::len)
    }

    pub fn channels(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Duration of this frame expressed in its own time base
    pub fn duration_ticks(&self) -> i64 {
        TimeBase::rescale(
            self.frames() as i64,
            TimeBase::from_rate(self.sample_rate),
            self.time_base,
        )
    }
}

/// Encoded sample payload, interleaved, one variant per storage width
#[derive(Debug, Clone, PartialEq)]
pub enum PacketData {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    /// 24-bit samples sign-extended into `i32`
    Int24(Vec<i32>),
    Int32(Vec<i32>),
    Float32(Vec<f32>),
}

impl PacketData {
    /// Number of interleaved samples
    pub fn len(&self) -> usize {
        match self {
            Self::Int8(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::Int24(v) | Self::Int32(v) => v.len(),
            Self::Float32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One encoder output unit, timestamped in the encoder's time base
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPacket {
    pub pts: Option<i64>,
    /// Length in ticks
    pub duration: i64,
    pub data: PacketData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_dimensions() {
        let frame = Frame::silence(
            480,
            2,
            48000,
            SampleFormat::F32Planar,
            TimeBase::from_rate(48000),
        );
        assert_eq!(frame.frames(), 480);
        assert_eq!(frame.channels(), 2);
        assert_eq!(frame.duration_ticks(), 480);
        assert!(frame.pts.is_none());
    }

    #[test]
    fn duration_in_foreign_time_base() {
        let frame = Frame::silence(
            44100,
            1,
            44100,
            SampleFormat::S16,
            TimeBase::new(1, 1000),
        );
        assert_eq!(frame.duration_ticks(), 1000);
    }

    #[test]
    fn receive_helpers() {
        assert_eq!(Receive::Ready(3).ready(), Some(3));
        assert_eq!(Receive::<i32>::NotReady.ready(), None);
        assert!(Receive::<i32>::EndOfStream.is_end_of_stream());
    }
}
