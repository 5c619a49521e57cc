//! CLI command definitions and dispatch.

pub mod build;
pub mod library;
pub mod plan;
pub mod resolve;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use quokka_common::config::QuokkaConfig;
use quokka_common::constants::{BIN_NAME, default_config_file};
use quokka_library::{CachingClient, CatalogFile, LibraryClient, RemoteLibrary};

/// Quokka: compile Quokkafiles into Dockerfiles.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to the configuration file.
    #[arg(long, global = true, env = "QUOKKA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the library catalog (JSON or YAML).
    #[arg(long, global = true, env = "QUOKKA_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Resolve references against a remote library instead of the catalog.
    #[arg(long, global = true, env = "QUOKKA_REGISTRY_URL")]
    pub registry_url: Option<String>,

    /// Refuse all network lookups.
    #[arg(long, global = true, env = "QUOKKA_OFFLINE")]
    pub offline: bool,

    /// Log at debug level to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a Quokkafile into a Dockerfile.
    Build(build::BuildArgs),
    /// Show the resolved, ordered steps without emitting a Dockerfile.
    Plan(plan::PlanArgs),
    /// Resolve a single reference against the library.
    Resolve(resolve::ResolveArgs),
    /// Manage the local library catalog.
    Library(library::LibraryArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the command fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Build(args) => build::execute(args, &config),
        Command::Plan(args) => plan::execute(args, &config),
        Command::Resolve(args) => resolve::execute(args, &config),
        Command::Library(args) => library::execute(args, &config),
    }
}

/// Loads the configuration file and applies command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<QuokkaConfig> {
    let path = cli.config.clone().unwrap_or_else(default_config_file);
    let mut config = QuokkaConfig::load(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;

    if let Some(catalog) = &cli.catalog {
        config.catalog.clone_from(catalog);
    }
    if let Some(url) = &cli.registry_url {
        config.registry_url = Some(url.clone());
    }
    config.offline |= cli.offline;
    config.validate()?;

    tracing::debug!(?config, "effective configuration");
    Ok(config)
}

/// Opens the library client described by `config`.
///
/// A registry URL selects the remote backend; otherwise the local catalog
/// is loaded. Answers are memoized unless caching is disabled.
pub fn open_library(config: &QuokkaConfig) -> anyhow::Result<Box<dyn LibraryClient>> {
    let backend: Box<dyn LibraryClient> = match &config.registry_url {
        Some(url) => Box::new(
            RemoteLibrary::new(url, Duration::from_secs(config.timeout_secs))?
                .offline(config.offline),
        ),
        None => {
            if !config.catalog.exists() {
                tracing::warn!(
                    path = %config.catalog.display(),
                    "catalog file not found; every lookup will fail"
                );
            }
            Box::new(CatalogFile::open(&config.catalog)?.load()?)
        }
    };

    if config.cache {
        Ok(Box::new(CachingClient::new(backend)))
    } else {
        Ok(backend)
    }
}

/// Opens the specification named by `path`; `-` reads standard input.
pub fn open_spec(path: &Path) -> anyhow::Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(std::io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(Box::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("quokka").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn build_defaults_to_quokkafile() {
        let parsed = cli(&["build"]);
        match parsed.command {
            Command::Build(args) => {
                assert_eq!(args.file, PathBuf::from("Quokkafile"));
                assert!(args.output.is_none());
            }
            other => panic!("expected build, got {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let parsed = cli(&["plan", "spec.qk", "--offline", "--catalog", "/tmp/lib.yaml"]);
        assert!(parsed.offline);
        assert_eq!(parsed.catalog, Some(PathBuf::from("/tmp/lib.yaml")));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{ "catalog": "/from/file.json", "timeout_secs": 3 }"#,
        )
        .expect("write config");

        let parsed = cli(&[
            "--config",
            config_path.to_str().expect("utf-8 path"),
            "--catalog",
            "/from/flag.json",
            "library",
            "list",
        ]);
        let config = load_config(&parsed).expect("config should load");
        assert_eq!(config.catalog, PathBuf::from("/from/flag.json"));
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn invalid_registry_url_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let parsed = cli(&[
            "--config",
            dir.path().join("absent.json").to_str().expect("utf-8 path"),
            "--registry-url",
            "ftp://example.com",
            "resolve",
            "alpine",
        ]);
        assert!(load_config(&parsed).is_err());
    }

    #[test]
    fn open_library_reads_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = dir.path().join("library.json");
        std::fs::write(
            &catalog,
            r#"[{ "name": "alpine", "version": "3.19", "digest": "sha256:abc" }]"#,
        )
        .expect("write catalog");

        let config = QuokkaConfig {
            catalog,
            ..QuokkaConfig::default()
        };
        let library = open_library(&config).expect("library should open");
        let def = library
            .resolve(&quokka_library::SymbolicReference::new("alpine", None))
            .expect("alpine should resolve");
        assert_eq!(def.version, "3.19");
    }
}
