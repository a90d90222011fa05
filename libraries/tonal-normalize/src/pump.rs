//! Streaming decode → filter (→ encode → mux) loop
//!
//! The pump is an explicit state machine. Every component is driven
//! push/pull: after each push the pump drains the component until it answers
//! `NotReady`, then falls back to the component feeding it. End of input is
//! propagated as an explicit flush through decoder, chain and encoder in that
//! order, each drained completely before the next one is flushed.

use crate::error::Result;
use crate::filters::FilterChain;
use tonal_media::{Decoder, Encoder, Frame, MediaReader, MediaWriter, Receive, TimeBase};
use tracing::{debug, trace};

/// Where filtered frames go
pub enum PumpOutput {
    /// Drop them (analysis)
    Discard,
    /// Encode and mux them; the container is finalized when the pump finishes
    Encode {
        encoder: Encoder,
        writer: MediaWriter,
    },
}

/// Component an end-of-stream signal is sent to next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushStage {
    Decoder,
    FilterChain,
    Encoder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Reading,
    DrainingDecoder,
    DrainingFilterChain,
    DrainingEncoder,
    Flushing(FlushStage),
    Done,
}

/// Counters of one pump run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub packets_read: u64,
    /// Packets belonging to other streams
    pub packets_skipped: u64,
    pub frames_decoded: u64,
    pub frames_filtered: u64,
    pub packets_written: u64,
    /// Samples per channel that left the chain
    pub samples_filtered: u64,
}

/// Drives one stream from `reader` through `decoder` and `chain` into `output`
pub struct StreamingPump<'a> {
    reader: &'a mut MediaReader,
    decoder: Decoder,
    chain: &'a mut FilterChain,
    output: PumpOutput,
    state: PumpState,
    stats: PumpStats,
    /// Next expected pts in encoder ticks, for frames without one
    next_pts: i64,
}

impl<'a> StreamingPump<'a> {
    pub fn new(
        reader: &'a mut MediaReader,
        decoder: Decoder,
        chain: &'a mut FilterChain,
        output: PumpOutput,
    ) -> Self {
        Self {
            reader,
            decoder,
            chain,
            output,
            state: PumpState::Reading,
            stats: PumpStats::default(),
            next_pts: 0,
        }
    }

    /// Run to completion. With [`PumpOutput::Encode`] the trailer is written
    /// after the encoder has been drained.
    pub fn run(mut self) -> Result<PumpStats> {
        let stream_index = self.reader.stream().stream_index;

        loop {
            self.state = match self.state {
                PumpState::Reading => match self.reader.read_packet()? {
                    Some(packet) => {
                        self.stats.packets_read += 1;
                        if packet.stream_index() == stream_index {
                            self.decoder.send_packet(Some(&packet))?;
                            PumpState::DrainingDecoder
                        } else {
                            self.stats.packets_skipped += 1;
                            PumpState::Reading
                        }
                    }
                    None => {
                        debug!("End of input after {} packets", self.stats.packets_read);
                        PumpState::Flushing(FlushStage::Decoder)
                    }
                },

                PumpState::DrainingDecoder => match self.decoder.receive_frame() {
                    Receive::Ready(frame) => {
                        self.stats.frames_decoded += 1;
                        self.chain.send_frame(Some(frame))?;
                        PumpState::DrainingFilterChain
                    }
                    Receive::NotReady => PumpState::Reading,
                    Receive::EndOfStream => PumpState::Flushing(FlushStage::FilterChain),
                },

                PumpState::DrainingFilterChain => match self.chain.receive_frame() {
                    Receive::Ready(frame) => {
                        self.stats.frames_filtered += 1;
                        self.stats.samples_filtered += frame.frames() as u64;
                        self.encode(frame)?
                    }
                    Receive::NotReady => PumpState::DrainingDecoder,
                    Receive::EndOfStream => match self.output {
                        PumpOutput::Discard => PumpState::Done,
                        PumpOutput::Encode { .. } => PumpState::Flushing(FlushStage::Encoder),
                    },
                },

                PumpState::DrainingEncoder => match &mut self.output {
                    PumpOutput::Discard => PumpState::DrainingFilterChain,
                    PumpOutput::Encode { encoder, writer } => match encoder.receive_packet() {
                        Receive::Ready(packet) => {
                            writer.write_interleaved(&packet)?;
                            self.stats.packets_written += 1;
                            PumpState::DrainingEncoder
                        }
                        Receive::NotReady => PumpState::DrainingFilterChain,
                        Receive::EndOfStream => PumpState::Done,
                    },
                },

                PumpState::Flushing(stage) => {
                    trace!("Flushing {:?}", stage);
                    match stage {
                        FlushStage::Decoder => {
                            self.decoder.send_packet(None)?;
                            PumpState::DrainingDecoder
                        }
                        FlushStage::FilterChain => {
                            self.chain.send_frame(None)?;
                            PumpState::DrainingFilterChain
                        }
                        FlushStage::Encoder => {
                            if let PumpOutput::Encode { encoder, .. } = &mut self.output {
                                encoder.send_frame(None)?;
                            }
                            PumpState::DrainingEncoder
                        }
                    }
                }

                PumpState::Done => break,
            };
        }

        if let PumpOutput::Encode { writer, .. } = self.output {
            writer.write_trailer()?;
        }
        debug!(
            "Pump finished: {} frames decoded, {} frames filtered, {} packets written",
            self.stats.frames_decoded, self.stats.frames_filtered, self.stats.packets_written
        );
        Ok(self.stats)
    }

    /// Hand one filtered frame to the encoder, retimed to its time base
    fn encode(&mut self, mut frame: Frame) -> Result<PumpState> {
        let PumpOutput::Encode { encoder, .. } = &mut self.output else {
            return Ok(PumpState::DrainingFilterChain);
        };

        let time_base = encoder.time_base();
        let pts = frame
            .pts
            .map_or(self.next_pts, |pts| TimeBase::rescale(pts, frame.time_base, time_base));
        self.next_pts = pts + TimeBase::rescale(
            frame.frames() as i64,
            TimeBase::from_rate(frame.sample_rate),
            time_base,
        );
        frame.pts = Some(pts);
        frame.time_base = time_base;

        encoder.send_frame(Some(&frame))?;
        Ok(PumpState::DrainingEncoder)
    }
}
