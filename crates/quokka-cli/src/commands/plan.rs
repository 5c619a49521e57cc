//! `quokka plan` — Display the resolved build steps before emitting.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use quokka_common::config::QuokkaConfig;
use quokka_common::constants::DEFAULT_SPEC_FILE;
use quokka_sdk::BuildService;

use crate::output::{canonical_row, plan_row, rule};

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the Quokkafile (`-` for standard input).
    #[arg(default_value = DEFAULT_SPEC_FILE)]
    pub file: PathBuf,
}

/// Executes the `plan` command.
///
/// Parses and realizes the Quokkafile, then lists every resolved step in
/// emission order with its source position and step group. Base and
/// dependency steps also show the reference that will be emitted.
///
/// # Errors
///
/// Returns an error if parsing or realization fails.
pub fn execute(args: PlanArgs, config: &QuokkaConfig) -> anyhow::Result<()> {
    let service = BuildService::new(super::open_library(config)?);
    let realization = service
        .plan(super::open_spec(&args.file)?)
        .with_context(|| format!("planning {}", args.file.display()))?;

    let heading = format!("Build plan for: {}", args.file.display());
    println!("{heading}");
    println!("{}", rule(&heading));
    println!();

    for (index, step) in realization.steps().iter().enumerate() {
        println!("{}", plan_row(index + 1, step));
        if let Some(definition) = step.action.definition() {
            let canonical = service.library().canonical_reference(definition)?;
            println!("{}", canonical_row(&canonical));
        }
    }

    println!();
    println!("  {} step(s) will be emitted.", realization.len());
    Ok(())
}
