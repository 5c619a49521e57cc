//! Symbolic reference parsing.
//!
//! Parses references like `alpine`, `alpine:3.19` or
//! `registry.local:5000/tools/jq:>=1.6` into a name and an optional
//! version constraint. Nothing here talks to a backend.

use std::fmt;

use thiserror::Error;

/// Why a reference string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid reference `{reference}`: {reason}")]
pub struct InvalidReference {
    /// The rejected input.
    pub reference: String,
    /// What is wrong with it.
    pub reason: &'static str,
}

/// A name plus optional version constraint, not yet bound to an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolicReference {
    /// Artifact name, possibly including a registry host and path.
    pub name: String,
    /// Version constraint, if one was written.
    pub constraint: Option<String>,
}

impl SymbolicReference {
    /// Creates a reference from its parts without validation.
    #[must_use]
    pub fn new(name: impl Into<String>, constraint: Option<String>) -> Self {
        Self {
            name: name.into(),
            constraint,
        }
    }

    /// Parses a `name[:constraint]` reference.
    ///
    /// The constraint separator is the last `:` after the last `/`, so a
    /// registry port (`localhost:5000/app`) stays part of the name.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidReference`] for empty input, whitespace, an empty
    /// name or constraint, or a name with empty path segments.
    pub fn parse(reference: &str) -> Result<Self, InvalidReference> {
        let invalid = |reason| InvalidReference {
            reference: reference.to_string(),
            reason,
        };

        if reference.is_empty() {
            return Err(invalid("reference is empty"));
        }
        if reference.chars().any(char::is_whitespace) {
            return Err(invalid("reference contains whitespace"));
        }

        let search_from = reference.rfind('/').map_or(0, |pos| pos + 1);
        let (name, constraint) = match reference[search_from..].find(':') {
            Some(offset) => {
                let colon = search_from + offset;
                let constraint = &reference[colon + 1..];
                if constraint.is_empty() {
                    return Err(invalid("version constraint is empty"));
                }
                (&reference[..colon], Some(constraint.to_string()))
            }
            None => (reference, None),
        };

        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if name.split('/').any(str::is_empty) {
            return Err(invalid("name has an empty path segment"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/' | ':'))
        {
            return Err(invalid("name contains an unsupported character"));
        }

        Ok(Self {
            name: name.to_string(),
            constraint,
        })
    }
}

impl fmt::Display for SymbolicReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some(constraint) => write!(f, "{}:{constraint}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
