//! Local library catalog.
//!
//! A catalog is a JSON (or YAML, by file extension) array of entries, one per
//! published version of a name. [`CatalogFile`] manages the file itself;
//! [`CatalogLibrary`] is the in-memory index that answers lookups.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use quokka_common::error::{LibraryError, QuokkaError, Result};
use quokka_common::types::Digest;
use serde::{Deserialize, Serialize};

use crate::client::LibraryClient;
use crate::definition::ResolvedDefinition;
use crate::reference::SymbolicReference;

/// Entry in the library catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Artifact name.
    pub name: String,
    /// Published version.
    pub version: String,
    /// Pinned digest; derived from the entry's content when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
    /// Free-form metadata (install template, exported env, registry).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl CatalogEntry {
    /// Converts the entry into a definition, deriving a digest if needed.
    #[must_use]
    pub fn into_definition(self) -> ResolvedDefinition {
        let digest = self.digest.unwrap_or_else(|| {
            crate::hash::definition_digest(&self.name, &self.version, &self.metadata)
        });
        ResolvedDefinition {
            name: self.name,
            version: self.version,
            digest,
            metadata: self.metadata,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Library catalog backed by a single file.
#[derive(Debug)]
pub struct CatalogFile {
    catalog_path: PathBuf,
    format: Format,
}

impl CatalogFile {
    /// Opens a catalog at `path`, creating its parent directory if needed.
    ///
    /// The file itself is created lazily on the first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| QuokkaError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        Ok(Self {
            catalog_path: path.to_path_buf(),
            format: Format::of(path),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.catalog_path
    }

    /// Lists all entries in file order.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog file cannot be read or parsed.
    pub fn list(&self) -> Result<Vec<CatalogEntry>> {
        if !self.catalog_path.exists() {
            return Ok(Vec::new());
        }
        let content =
            std::fs::read_to_string(&self.catalog_path).map_err(|e| QuokkaError::Io {
                path: self.catalog_path.clone(),
                source: e,
            })?;
        let entries: Vec<CatalogEntry> = match self.format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Yaml => serde_yaml::from_str(&content)?,
        };
        Ok(entries)
    }

    /// Registers a new entry.
    ///
    /// # Errors
    ///
    /// Returns `QuokkaError::Config` if the same name and version is already
    /// registered, or an I/O error if the catalog cannot be read or written.
    pub fn register(&self, entry: CatalogEntry) -> Result<()> {
        let mut entries = self.list()?;
        if entries
            .iter()
            .any(|e| e.name == entry.name && e.version == entry.version)
        {
            return Err(QuokkaError::Config {
                message: format!(
                    "catalog already contains {}:{}",
                    entry.name, entry.version
                ),
            });
        }
        tracing::info!(name = %entry.name, version = %entry.version, "registering catalog entry");
        entries.push(entry);
        self.write_entries(&entries)
    }

    /// Removes every entry for `name`, or only `version` when given.
    ///
    /// # Errors
    ///
    /// Returns `QuokkaError::NotFound` if nothing matched.
    pub fn remove(&self, name: &str, version: Option<&str>) -> Result<()> {
        let mut entries = self.list()?;
        let before = entries.len();
        entries.retain(|e| !(e.name == name && version.is_none_or(|v| e.version == v)));
        if entries.len() == before {
            return Err(QuokkaError::NotFound {
                kind: "catalog entry",
                id: version.map_or_else(|| name.to_string(), |v| format!("{name}:{v}")),
            });
        }
        self.write_entries(&entries)
    }

    /// Loads the file into a [`CatalogLibrary`].
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or parsed.
    pub fn load(&self) -> Result<CatalogLibrary> {
        let entries = self.list()?;
        tracing::info!(
            path = %self.catalog_path.display(),
            entries = entries.len(),
            "loaded library catalog"
        );
        Ok(CatalogLibrary::from_entries(entries))
    }

    fn write_entries(&self, entries: &[CatalogEntry]) -> Result<()> {
        let content = match self.format {
            Format::Json => serde_json::to_string_pretty(entries)?,
            Format::Yaml => serde_yaml::to_string(entries)?,
        };
        std::fs::write(&self.catalog_path, content).map_err(|e| QuokkaError::Io {
            path: self.catalog_path.clone(),
            source: e,
        })?;
        Ok(())
    }
}

/// In-memory library index answering lookups from catalog entries.
#[derive(Debug, Clone, Default)]
pub struct CatalogLibrary {
    by_name: BTreeMap<String, Vec<ResolvedDefinition>>,
}

impl CatalogLibrary {
    /// Creates an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from catalog entries.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self::from_definitions(entries.into_iter().map(CatalogEntry::into_definition))
    }

    /// Builds an index from already-resolved definitions.
    #[must_use]
    pub fn from_definitions(definitions: impl IntoIterator<Item = ResolvedDefinition>) -> Self {
        let mut library = Self::new();
        for definition in definitions {
            library.insert(definition);
        }
        library
    }

    /// Adds a definition; a later definition with the same name and version
    /// replaces the earlier one.
    pub fn insert(&mut self, definition: ResolvedDefinition) {
        let versions = self.by_name.entry(definition.name.clone()).or_default();
        versions.retain(|d| d.version != definition.version);
        versions.push(definition);
    }

    /// All definitions, grouped by name in name order.
    pub fn definitions(&self) -> impl Iterator<Item = &ResolvedDefinition> {
        self.by_name.values().flatten()
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the library holds no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl LibraryClient for CatalogLibrary {
    fn resolve(&self, reference: &SymbolicReference) -> std::result::Result<ResolvedDefinition, LibraryError> {
        let candidates = self
            .by_name
            .get(&reference.name)
            .map_or(&[][..], Vec::as_slice);
        let definition = crate::version::select(
            &reference.name,
            reference.constraint.as_deref(),
            candidates,
            |d| d.version.as_str(),
        )?;
        tracing::debug!(
            reference = %reference,
            version = %definition.version,
            "resolved from catalog"
        );
        Ok(definition.clone())
    }
}
