//! Concrete definitions returned by a library lookup.

use std::collections::BTreeMap;

use quokka_common::constants::{METADATA_ENV_PREFIX, METADATA_INSTALL, METADATA_REGISTRY};
use quokka_common::types::Digest;
use serde::{Deserialize, Serialize};

/// The library's answer for a symbolic reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDefinition {
    /// Concrete artifact name.
    pub name: String,
    /// Concrete version.
    pub version: String,
    /// Content identifier.
    pub digest: Digest,
    /// Free-form metadata, kept ordered so renderings are deterministic.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ResolvedDefinition {
    /// Creates a definition without metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>, digest: Digest) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            digest,
            metadata: BTreeMap::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.metadata.insert(key.into(), value.into());
        self
    }

    /// The install command template, if the definition carries one.
    #[must_use]
    pub fn install_template(&self) -> Option<&str> {
        self.metadata.get(METADATA_INSTALL).map(String::as_str)
    }

    /// Registry host the definition is published under, if any.
    #[must_use]
    pub fn registry(&self) -> Option<&str> {
        self.metadata.get(METADATA_REGISTRY).map(String::as_str)
    }

    /// Environment variables exported through `env.<KEY>` metadata, in key order.
    pub fn exported_env(&self) -> impl Iterator<Item = (&str, &str)> {
        self.metadata.iter().filter_map(|(key, value)| {
            key.strip_prefix(METADATA_ENV_PREFIX)
                .filter(|name| !name.is_empty())
                .map(|name| (name, value.as_str()))
        })
    }
}
