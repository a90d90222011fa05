//! Normalization target from file and environment

use anyhow::Context;
use std::path::Path;
use tonal_normalize::NormalizationTarget;

/// Environment variables prefixed with `TONAL_` override target fields,
/// e.g. `TONAL_LOUDNESS_LUFS=-14`.
pub const ENV_PREFIX: &str = "TONAL";

/// Load the target: built-in defaults, then `file` (TOML) if given, then
/// `TONAL_*` environment variables. The result is validated.
pub fn load_target(file: Option<&Path>) -> anyhow::Result<NormalizationTarget> {
    load_target_from(
        file,
        config::Environment::with_prefix(ENV_PREFIX).try_parsing(true),
    )
}

fn load_target_from(
    file: Option<&Path>,
    environment: config::Environment,
) -> anyhow::Result<NormalizationTarget> {
    let mut settings = config::Config::builder();

    if let Some(path) = file {
        settings = settings.add_source(
            config::File::from(path)
                .format(config::FileFormat::Toml)
                .required(true),
        );
    }
    settings = settings.add_source(environment);

    let target: NormalizationTarget = settings
        .build()
        .and_then(config::Config::try_deserialize)
        .context("Failed to load normalization target")?;
    target.validate()?;

    tracing::debug!("Normalization target: {:?}", target);
    Ok(target)
}
