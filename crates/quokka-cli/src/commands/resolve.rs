//! `quokka resolve` — Resolve one reference against the library.

use clap::Args;
use quokka_common::config::QuokkaConfig;
use quokka_library::SymbolicReference;

/// Arguments for the `resolve` command.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Reference to resolve, e.g. `alpine:3.19`.
    pub reference: String,

    /// Print the resolved definition as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `resolve` command.
///
/// # Errors
///
/// Returns an error if the reference is malformed or cannot be resolved.
pub fn execute(args: ResolveArgs, config: &QuokkaConfig) -> anyhow::Result<()> {
    let reference = SymbolicReference::parse(&args.reference)?;
    let library = super::open_library(config)?;
    let definition = library
        .resolve(&reference)
        .map_err(|e| anyhow::anyhow!("cannot resolve `{reference}`: {e}"))?;
    let canonical = library.canonical_reference(&definition)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&definition)?);
        return Ok(());
    }

    println!("name:      {}", definition.name);
    println!("version:   {}", definition.version);
    println!("digest:    {}", definition.digest);
    println!("canonical: {canonical}");
    if !definition.metadata.is_empty() {
        println!("metadata:");
        for (key, value) in &definition.metadata {
            println!("  {key} = {value}");
        }
    }
    Ok(())
}
