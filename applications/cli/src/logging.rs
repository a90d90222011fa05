//! Tracing subscriber setup

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Map a `--loglevel` name onto a tracing level filter.
///
/// `critical` has no tracing counterpart and maps to `error`.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.to_ascii_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "error" | "critical" => Some(LevelFilter::ERROR),
        "off" => Some(LevelFilter::OFF),
        _ => None,
    }
}

/// Install the global subscriber writing to stderr.
///
/// `RUST_LOG` directives take precedence over `level`; stdout stays free for
/// command output.
pub fn init(level: &str) {
    let parsed = parse_level(level);

    tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(parsed.unwrap_or(LevelFilter::INFO).into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if parsed.is_none() {
        tracing::warn!("Unknown log level '{}', using info", level);
    }
}
