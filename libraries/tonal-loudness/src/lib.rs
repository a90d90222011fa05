//! Tonal loudness primitives
//!
//! I/O-free DSP building blocks used by the mastering chain:
//!
//! - [`LoudnessMeter`]: EBU R128 integrated loudness and true peak
//!   (ITU-R BS.1770, 4x oversampled) over planar `f32` blocks.
//! - [`PeakLimiter`]: lookahead brick-wall limiter with ceiling, attack and
//!   release, latency-compensated and flushable.

pub mod error;
pub mod limiter;
pub mod meter;

pub use error::{LoudnessError, Result};
pub use limiter::{LimiterSettings, PeakLimiter};
pub use meter::{LoudnessMeter, SILENCE_FLOOR_LUFS};

/// Convert decibels to a linear amplitude factor
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert a linear amplitude factor to decibels
pub fn linear_to_db(linear: f64) -> f64 {
    if linear > 0.0 {
        20.0 * linear.log10()
    } else {
        f64::NEG_INFINITY
    }
}
