//! Domain primitive types used across the Quokka workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QuokkaError, Result};

/// A 1-based line/column location in specification text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SourcePosition {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number in characters, starting at 1.
    pub column: usize,
}

impl SourcePosition {
    /// Creates a position from a line and column.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Content identifier of a resolved artifact, in `algorithm:encoded` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest {
    algorithm: String,
    encoded: String,
}

impl Digest {
    /// Parses a digest such as `sha256:9f86d0…`.
    ///
    /// Both halves must be non-empty; the algorithm is lowercase
    /// alphanumeric and the encoded part is alphanumeric.
    ///
    /// # Errors
    ///
    /// Returns `QuokkaError::Config` if the string is not a valid digest.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || QuokkaError::Config {
            message: format!("invalid digest `{value}`: expected algorithm:hex"),
        };
        let (algorithm, encoded) = value.split_once(':').ok_or_else(invalid)?;
        let algorithm_ok = !algorithm.is_empty()
            && algorithm
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        let encoded_ok = !encoded.is_empty() && encoded.chars().all(|c| c.is_ascii_alphanumeric());
        if !algorithm_ok || !encoded_ok {
            return Err(invalid());
        }
        Ok(Self {
            algorithm: algorithm.to_string(),
            encoded: encoded.to_string(),
        })
    }

    /// Creates a SHA-256 digest from a hex-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid 64-character hex string.
    pub fn sha256_from_hex(hex: impl Into<String>) -> Result<Self> {
        let hex = hex.into();
        if hex.len() != crate::constants::SHA256_HEX_LENGTH
            || !hex.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(QuokkaError::Config {
                message: format!("invalid SHA-256 hex string: {hex}"),
            });
        }
        Ok(Self {
            algorithm: "sha256".into(),
            encoded: hex.to_ascii_lowercase(),
        })
    }

    /// Returns the algorithm half, e.g. `sha256`.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Returns the encoded half.
    #[must_use]
    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.encoded)
    }
}

impl TryFrom<String> for Digest {
    type Error = QuokkaError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_displays_line_and_column() {
        assert_eq!(SourcePosition::new(12, 4).to_string(), "12:4");
    }

    #[test]
    fn positions_order_by_line_then_column() {
        assert!(SourcePosition::new(1, 9) < SourcePosition::new(2, 1));
        assert!(SourcePosition::new(2, 1) < SourcePosition::new(2, 3));
    }

    #[test]
    fn digest_parse_short_form() {
        let digest = Digest::parse("sha256:abc").expect("should parse");
        assert_eq!(digest.algorithm(), "sha256");
        assert_eq!(digest.encoded(), "abc");
        assert_eq!(digest.to_string(), "sha256:abc");
    }

    #[test]
    fn digest_parse_rejects_missing_separator() {
        assert!(Digest::parse("abc").is_err());
        assert!(Digest::parse(":abc").is_err());
        assert!(Digest::parse("sha256:").is_err());
        assert!(Digest::parse("sha256:ab c").is_err());
    }

    #[test]
    fn digest_from_hex_requires_full_length() {
        assert!(Digest::sha256_from_hex("abc").is_err());
        let hex = "B94D27B9934D3E08A52E52D7DA7DABFAC484EFE37A5380EE9088F7ACE2EFCDE9";
        let digest = Digest::sha256_from_hex(hex).expect("valid hex");
        assert_eq!(digest.encoded(), hex.to_ascii_lowercase());
    }

    #[test]
    fn digest_serializes_as_string() {
        let digest = Digest::parse("sha256:abc").expect("should parse");
        let json = serde_json::to_string(&digest).expect("serialize");
        assert_eq!(json, "\"sha256:abc\"");
        let back: Digest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, digest);
        assert!(serde_json::from_str::<Digest>("\"nope\"").is_err());
    }
}
