//! Whole-stream loudness analysis

use crate::error::Result;
use crate::filters::{FilterChain, StageDescriptor, StreamSpec};
use crate::pump::{PumpOutput, StreamingPump};
use serde::Serialize;
use tonal_loudness::SILENCE_FLOOR_LUFS;
use tonal_media::{AudioStreamDescriptor, MediaError, MediaReader};
use tracing::{debug, info};

/// Result of one complete forward pass over a stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoudnessMeasurement {
    /// Gated integrated loudness (LUFS), -70 for silence
    pub integrated_lufs: f64,
    /// Maximum true peak across channels (dBTP), `-inf` for silence
    pub true_peak_dbtp: f64,
    pub duration_seconds: f64,
}

/// Stream description plus its loudness, as reported by [`crate::analyze`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioStreamMeta {
    #[serde(flatten)]
    pub stream: AudioStreamDescriptor,
    #[serde(flatten)]
    pub loudness: LoudnessMeasurement,
}

/// Measures a stream by decoding it through an `ebur128` meter stage
pub struct LoudnessAnalyzer;

impl LoudnessAnalyzer {
    /// Decode every packet of the selected stream and measure it.
    ///
    /// Values are read only after end of stream has been drained through
    /// decoder and chain; any demux or decode error aborts the measurement.
    pub fn measure(reader: &mut MediaReader) -> Result<LoudnessMeasurement> {
        let decoder = reader.open_decoder()?;
        let spec = StreamSpec::from(reader.stream());
        let mut chain = FilterChain::build(spec, &[StageDescriptor::Meter])?;

        let stats = StreamingPump::new(reader, decoder, &mut chain, PumpOutput::Discard).run()?;
        debug!(
            "Analysis decoded {} frames ({} samples)",
            stats.frames_decoded, stats.samples_filtered
        );

        let property = |key: &str| -> Result<f64> {
            chain.property("ebur128", key)?.ok_or_else(|| {
                MediaError::new("read meter", format!("meter has no '{}' value", key)).into()
            })
        };
        let measurement = LoudnessMeasurement {
            integrated_lufs: property("integrated")?,
            true_peak_dbtp: property("true_peak")?,
            duration_seconds: property("duration")?,
        };

        if measurement.integrated_lufs <= SILENCE_FLOOR_LUFS {
            info!("Stream is silent");
        }
        info!(
            "Measured {:.2} LUFS, true peak {:.2} dBTP over {:.2}s",
            measurement.integrated_lufs, measurement.true_peak_dbtp, measurement.duration_seconds
        );
        Ok(measurement)
    }

    /// Stream description and measurement of `reader` together
    pub fn analyze(reader: &mut MediaReader) -> Result<AudioStreamMeta> {
        let loudness = Self::measure(reader)?;
        Ok(AudioStreamMeta {
            stream: reader.stream().clone(),
            loudness,
        })
    }
}
