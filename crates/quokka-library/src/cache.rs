//! Memoizing wrapper around any library client.

use std::collections::HashMap;
use std::sync::RwLock;

use quokka_common::error::LibraryError;

use crate::client::LibraryClient;
use crate::definition::ResolvedDefinition;
use crate::reference::SymbolicReference;

/// Caches successful answers of an inner client for its whole lifetime.
///
/// Failures are never cached, so a backend that was briefly unavailable is
/// asked again on the next lookup.
#[derive(Debug)]
pub struct CachingClient<C> {
    inner: C,
    answers: RwLock<HashMap<SymbolicReference, ResolvedDefinition>>,
}

impl<C: LibraryClient> CachingClient<C> {
    /// Wraps `inner`.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            answers: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached answers.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.answers.read().map_or(0, |answers| answers.len())
    }

    /// Returns the wrapped client.
    pub const fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: LibraryClient> LibraryClient for CachingClient<C> {
    fn resolve(&self, reference: &SymbolicReference) -> Result<ResolvedDefinition, LibraryError> {
        if let Ok(answers) = self.answers.read() {
            if let Some(hit) = answers.get(reference) {
                tracing::debug!(reference = %reference, "library cache hit");
                return Ok(hit.clone());
            }
        }

        let definition = self.inner.resolve(reference)?;
        if let Ok(mut answers) = self.answers.write() {
            let _ = answers.insert(reference.clone(), definition.clone());
        }
        Ok(definition)
    }

    fn canonical_reference(&self, definition: &ResolvedDefinition) -> Result<String, LibraryError> {
        self.inner.canonical_reference(definition)
    }
}
