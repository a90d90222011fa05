//! tonal - conditional loudness normalization
//!
//! Exit status: 0 on success (for `an`, a file was written), 2 when `an`
//! found the source already on target, 1 on any failure.

mod cli;
mod logging;
mod settings;

use clap::Parser;
use cli::{Cli, Commands};
use std::process::ExitCode;

/// `an` left the source untouched
const EXIT_UNCHANGED: u8 = 2;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // help and version
        Err(e) if !e.use_stderr() => e.exit(),
        // usage errors exit 1; 2 is reserved for an unchanged source
        Err(e) => {
            eprint!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(&cli.loglevel);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::An { src, dst, offset } => {
            let target = settings::load_target(cli.target.as_deref())?;
            if tonal_normalize::normalize_with(&src, &dst, offset, &target)? {
                tracing::info!("Wrote {}", dst.display());
                Ok(ExitCode::SUCCESS)
            } else {
                tracing::info!("{} already meets the target", src.display());
                Ok(ExitCode::from(EXIT_UNCHANGED))
            }
        }
        Commands::Ai { src } => {
            tonal_normalize::ensure_valid(&src)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Am { src } => {
            let meta = tonal_normalize::analyze(&src)?;
            println!("{}", serde_json::to_string_pretty(&meta)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
