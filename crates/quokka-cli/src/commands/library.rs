//! `quokka library` — Manage the local library catalog.

use std::collections::BTreeMap;

use anyhow::Context;
use clap::{Args, Subcommand};
use quokka_common::config::QuokkaConfig;
use quokka_common::types::Digest;
use quokka_library::{CatalogEntry, CatalogFile};

use crate::output::short_digest;

/// Arguments for the `library` command.
#[derive(Args, Debug)]
pub struct LibraryArgs {
    /// Catalog operation to perform.
    #[command(subcommand)]
    pub action: LibraryAction,
}

/// Catalog operations.
#[derive(Subcommand, Debug)]
pub enum LibraryAction {
    /// List every registered definition.
    List,
    /// Register a definition.
    Add {
        /// Artifact name.
        name: String,
        /// Published version.
        version: String,
        /// Pinned digest (`algorithm:encoded`); derived from content if omitted.
        #[arg(long)]
        digest: Option<String>,
        /// Metadata entry as `KEY=VALUE`; repeatable.
        #[arg(long = "meta", value_parser = parse_key_value)]
        metadata: Vec<(String, String)>,
    },
    /// Remove a definition, or every version of a name.
    Remove {
        /// Artifact name.
        name: String,
        /// Only remove this version.
        #[arg(long)]
        version: Option<String>,
    },
}

/// Executes the `library` command.
///
/// # Errors
///
/// Returns an error if the catalog cannot be read or written, or the
/// requested entry is invalid or missing.
pub fn execute(args: LibraryArgs, config: &QuokkaConfig) -> anyhow::Result<()> {
    let catalog = CatalogFile::open(&config.catalog)?;
    match args.action {
        LibraryAction::List => list(&catalog),
        LibraryAction::Add {
            name,
            version,
            digest,
            metadata,
        } => {
            let digest = digest
                .as_deref()
                .map(Digest::parse)
                .transpose()
                .context("invalid --digest")?;
            let entry = CatalogEntry {
                name,
                version,
                digest,
                metadata: metadata.into_iter().collect::<BTreeMap<_, _>>(),
            };
            let label = format!("{}:{}", entry.name, entry.version);
            catalog.register(entry)?;
            println!("Registered {label} in {}", catalog.path().display());
            Ok(())
        }
        LibraryAction::Remove { name, version } => {
            catalog.remove(&name, version.as_deref())?;
            println!("Removed {name}{}", version.map(|v| format!(":{v}")).unwrap_or_default());
            Ok(())
        }
    }
}

fn list(catalog: &CatalogFile) -> anyhow::Result<()> {
    let entries = catalog.list()?;
    println!("NAME\tVERSION\tDIGEST");
    for entry in entries {
        let name = entry.name.clone();
        let version = entry.version.clone();
        let definition = entry.into_definition();
        println!("{name}\t{version}\t{}", short_digest(&definition.digest));
    }
    Ok(())
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}
