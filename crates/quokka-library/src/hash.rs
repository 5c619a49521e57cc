//! SHA-256 content digests.
//!
//! Used for catalog entries that do not pin a digest of their own and for
//! fingerprinting emitted scripts.

use std::collections::BTreeMap;

use quokka_common::types::Digest;
use sha2::{Digest as _, Sha256};

/// Computes the SHA-256 digest of a byte slice.
#[must_use]
pub fn digest_bytes(data: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    from_hasher(hasher)
}

/// Computes a stable content digest for a definition that has none.
///
/// Fields are length-prefixed so that no two distinct inputs share an
/// encoding; metadata is consumed in key order.
#[must_use]
pub fn definition_digest(name: &str, version: &str, metadata: &BTreeMap<String, String>) -> Digest {
    tracing::debug!(name, version, "computing definition digest");
    let mut hasher = Sha256::new();
    let mut field = |value: &str| {
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value.as_bytes());
    };
    field(name);
    field(version);
    for (key, value) in metadata {
        field(key);
        field(value);
    }
    from_hasher(hasher)
}

fn from_hasher(hasher: Sha256) -> Digest {
    let hex = format!("{:x}", hasher.finalize());
    // Sha256 always yields 64 lowercase hex characters.
    Digest::sha256_from_hex(hex).unwrap_or_else(|_| unreachable!("sha256 hex is always valid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_bytes_known_vector() {
        let digest = digest_bytes(b"hello world");
        assert_eq!(
            digest.to_string(),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn definition_digest_is_stable() {
        let mut metadata = BTreeMap::new();
        let _ = metadata.insert("install".to_string(), "apk add curl".to_string());
        let a = definition_digest("curl", "8.5", &metadata);
        let b = definition_digest("curl", "8.5", &metadata.clone());
        assert_eq!(a, b);
    }

    #[test]
    fn definition_digest_separates_fields() {
        let empty = BTreeMap::new();
        assert_ne!(
            definition_digest("ab", "c", &empty),
            definition_digest("a", "bc", &empty)
        );
    }

    #[test]
    fn definition_digest_depends_on_metadata() {
        let empty = BTreeMap::new();
        let mut metadata = BTreeMap::new();
        let _ = metadata.insert("env.PATH".to_string(), "/opt/bin".to_string());
        assert_ne!(
            definition_digest("curl", "8.5", &empty),
            definition_digest("curl", "8.5", &metadata)
        );
    }
}
