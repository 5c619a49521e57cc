//! System-wide constants and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Default base directory for Quokka data when no home directory is available.
pub const SYSTEM_DATA_DIR: &str = "/var/lib/quokka";

/// Returns the data directory, preferring `$HOME/.quokka`, falling back to
/// `/var/lib/quokka`.
fn resolve_data_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        return PathBuf::from(home).join(".quokka");
    }
    PathBuf::from(SYSTEM_DATA_DIR)
}

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the resolved data directory for this session.
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(resolve_data_dir)
}

/// Returns the default library catalog path.
pub fn default_catalog_file() -> PathBuf {
    data_dir().join(CATALOG_FILE_NAME)
}

/// Returns the default configuration file path.
pub fn default_config_file() -> PathBuf {
    data_dir().join(CONFIG_FILE_NAME)
}

/// File name of the library catalog inside the data directory.
pub const CATALOG_FILE_NAME: &str = "library.json";

/// File name of the configuration file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Specification file read when none is given on the command line.
pub const DEFAULT_SPEC_FILE: &str = "Quokkafile";

/// SHA-256 digest length in hex characters.
pub const SHA256_HEX_LENGTH: usize = 64;

/// Default timeout for remote library lookups, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Path prefix of the remote library lookup endpoint.
pub const REMOTE_DEFINITIONS_PATH: &str = "v1/definitions";

/// Metadata key holding a dependency's install command template.
pub const METADATA_INSTALL: &str = "install";

/// Metadata key prefix for environment variables a dependency exports.
pub const METADATA_ENV_PREFIX: &str = "env.";

/// Metadata key holding the registry host a definition is published under.
pub const METADATA_REGISTRY: &str = "registry";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "quokka";
