//! Tonal normalize
//!
//! Conditional mastering of audio files: a stream is measured, compared
//! against a [`NormalizationTarget`], and rewritten only if some aspect of it
//! is outside tolerance.
//!
//! - [`analyze`]: one decode pass through an EBU R128 meter.
//! - [`normalize`] / [`normalize_with`]: analyze, plan, and if needed run a
//!   decode → offset → gain → limiter → format → encode pass into a WAV file.
//! - [`ensure_valid`]: check that a file has a locatable audio stream.
//!
//! ```no_run
//! # fn main() -> tonal_normalize::Result<()> {
//! let written = tonal_normalize::normalize("take.flac", "take.wav", 0.0)?;
//! if !written {
//!     println!("already compliant");
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod error;
pub mod filters;
pub mod planner;
pub mod pump;
pub mod target;

use std::path::Path;
use tonal_media::{Encoder, MediaReader, MediaWriter};
use tracing::info;

pub use analyzer::{AudioStreamMeta, LoudnessAnalyzer, LoudnessMeasurement};
pub use error::{NormalizeError, Result};
pub use filters::{FilterChain, StageDescriptor, StreamSpec};
pub use planner::{plan, TransformPlan};
pub use pump::{PumpOutput, PumpStats, StreamingPump};
pub use target::NormalizationTarget;

/// Measure the best audio stream of `source`. Never writes anything.
pub fn analyze(source: impl AsRef<Path>) -> Result<AudioStreamMeta> {
    tonal_media::initialize();
    let mut reader = MediaReader::open(source)?;
    LoudnessAnalyzer::analyze(&mut reader)
}

/// Bring `source` to the default target, writing `dest` only when needed.
///
/// Returns `true` if `dest` was written and `false` if the source already
/// matches the target, in which case no file is created.
pub fn normalize(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    offset_seconds: f64,
) -> Result<bool> {
    normalize_with(source, dest, offset_seconds, &NormalizationTarget::default())
}

/// [`normalize`] against an explicit target.
///
/// `offset_seconds > 0` pads that much silence at the start, `< 0` trims it.
/// The output is staged next to `dest` and renamed into place once complete.
pub fn normalize_with(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    offset_seconds: f64,
    target: &NormalizationTarget,
) -> Result<bool> {
    target.validate()?;
    if !offset_seconds.is_finite() {
        return Err(NormalizeError::InvalidOffset(offset_seconds));
    }
    let source = source.as_ref();
    let dest = dest.as_ref();

    let measured = analyze(source)?;
    let plan = plan(&measured, target, offset_seconds);
    if !plan.any() {
        info!("{} already matches the target", source.display());
        return Ok(false);
    }
    info!("Normalizing {} with {:?}", source.display(), plan);

    let mut reader = MediaReader::open(source)?;
    let decoder = reader.open_decoder()?;
    let encoder = Encoder::open(target.encoder_config())?;
    let mut writer = MediaWriter::create(dest)?;
    writer.add_stream(&encoder)?;

    let stages = plan.stages(target);
    let mut chain = FilterChain::build(StreamSpec::from(reader.stream()), &stages)?;

    writer.write_header()?;
    let stats = StreamingPump::new(
        &mut reader,
        decoder,
        &mut chain,
        PumpOutput::Encode { encoder, writer },
    )
    .run()?;
    info!(
        "Wrote {} ({} packets)",
        dest.display(),
        stats.packets_written
    );
    Ok(true)
}

/// Fail unless `path` opens as a container with an audio stream
pub fn ensure_valid(path: impl AsRef<Path>) -> Result<()> {
    tonal_media::initialize();
    MediaReader::open(path)?;
    Ok(())
}
