//! Process-wide verbosity bridge for the decoding libraries
//!
//! symphonia reports through the `log` facade rather than `tracing`. The
//! bridge copies the active tracing level onto `log`'s global maximum once per
//! process, before the first media call.

use std::sync::Once;
use tracing::level_filters::LevelFilter;

static INIT: Once = Once::new();

/// Align the `log` facade with the current tracing verbosity.
///
/// Safe to call any number of times from any thread; only the first call has
/// an effect.
pub fn initialize() {
    INIT.call_once(|| {
        let level = to_log_level(LevelFilter::current());
        log::set_max_level(level);
        tracing::debug!("Media library log level set to {}", level);
    });
}

fn to_log_level(level: LevelFilter) -> log::LevelFilter {
    match level.into_level() {
        None => log::LevelFilter::Off,
        Some(tracing::Level::ERROR) => log::LevelFilter::Error,
        Some(tracing::Level::WARN) => log::LevelFilter::Warn,
        Some(tracing::Level::INFO) => log::LevelFilter::Info,
        // decoder tracing is far too chatty to forward
        Some(_) => log::LevelFilter::Debug,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_levels() {
        assert_eq!(to_log_level(LevelFilter::OFF), log::LevelFilter::Off);
        assert_eq!(to_log_level(LevelFilter::ERROR), log::LevelFilter::Error);
        assert_eq!(to_log_level(LevelFilter::WARN), log::LevelFilter::Warn);
        assert_eq!(to_log_level(LevelFilter::INFO), log::LevelFilter::Info);
        assert_eq!(to_log_level(LevelFilter::DEBUG), log::LevelFilter::Debug);
        assert_eq!(to_log_level(LevelFilter::TRACE), log::LevelFilter::Debug);
    }

    #[test]
    fn initialize_is_idempotent() {
        initialize();
        initialize();
        assert!(INIT.is_completed());
    }
}
