//! `quokka build` — Compile a Quokkafile into a Dockerfile.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use quokka_common::config::QuokkaConfig;
use quokka_common::constants::DEFAULT_SPEC_FILE;
use quokka_library::hash::digest_bytes;
use quokka_sdk::BuildService;

/// Arguments for the `build` command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Path to the Quokkafile (`-` for standard input).
    #[arg(default_value = DEFAULT_SPEC_FILE)]
    pub file: PathBuf,

    /// Write the Dockerfile here instead of standard output.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `build` command.
///
/// The Dockerfile is rendered fully in memory and only written once the
/// whole pipeline has succeeded, so a failed build never leaves a partial
/// output file behind.
///
/// # Errors
///
/// Returns an error if the file cannot be read, any pipeline stage fails,
/// or the output cannot be written.
pub fn execute(args: BuildArgs, config: &QuokkaConfig) -> anyhow::Result<()> {
    tracing::info!(file = %args.file.display(), "building from Quokkafile");
    let service = BuildService::new(super::open_library(config)?);
    let input = super::open_spec(&args.file)?;

    let mut script = Vec::new();
    service
        .build(input, &mut script)
        .with_context(|| format!("building {}", args.file.display()))?;
    tracing::info!(digest = %digest_bytes(&script), "rendered Dockerfile");

    match &args.output {
        Some(path) => {
            std::fs::write(path, &script)
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = script.len(), "wrote Dockerfile");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&script)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
