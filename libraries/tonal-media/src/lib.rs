//! Tonal media boundary
//!
//! Wraps the decoding, resampling and container libraries behind a small
//! push/pull surface:
//!
//! - [`MediaReader`] probes a source container and selects its best audio
//!   stream; [`Decoder`] turns its packets into planar [`Frame`]s.
//! - [`Encoder`] turns frames into PCM [`EncodedPacket`]s and [`MediaWriter`]
//!   muxes them into a WAV file.
//! - [`resampling`] provides the sample rate converter used by format stages.
//!
//! Every failure is a [`MediaError`]. Call [`initialize`] once before the
//! first media operation so library logging follows the process log level.

pub mod error;
pub mod frame;
mod log_bridge;
pub mod reader;
pub mod resampling;
pub mod types;
pub mod writer;

pub use error::{ensure, MediaError, OrMedia, Result};
pub use frame::{EncodedPacket, Frame, PacketData, Receive};
pub use log_bridge::initialize;
pub use reader::{Decoder, MediaReader, Packet};
pub use types::{AudioStreamDescriptor, CodecId, MediaType, SampleFormat, TimeBase};
pub use writer::{staging_path, Encoder, EncoderConfig, MediaWriter};
