//! Unified error types for the Quokka workspace.
//!
//! [`QuokkaError`] covers the four pipeline failure categories (syntax,
//! resolution, semantic, emission) plus the ambient I/O and configuration
//! failures of the outer layers. [`LibraryError`] is the narrower error a
//! library backend reports for a single lookup; the realizer wraps it into
//! [`QuokkaError::Resolution`] together with the offending source position.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::SourcePosition;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum QuokkaError {
    /// The specification text is malformed.
    #[error("syntax error at {position}: expected {expected}, found {found}")]
    Syntax {
        /// Where the offending construct starts.
        position: SourcePosition,
        /// What the parser was looking for.
        expected: String,
        /// What it found instead.
        found: String,
    },

    /// A symbolic reference could not be bound to a concrete definition.
    #[error("cannot resolve `{reference}` at {position}: {source}")]
    Resolution {
        /// The reference as written in the specification.
        reference: String,
        /// Position of the declaration carrying the reference.
        position: SourcePosition,
        /// Why the library lookup failed.
        source: LibraryError,
    },

    /// The declaration sequence violates a structural rule.
    #[error("semantic error at {position}: [{rule}] {message}")]
    Semantic {
        /// Position of the offending declaration.
        position: SourcePosition,
        /// The rule that was violated.
        rule: SemanticRule,
        /// Human-readable description of the violation.
        message: String,
    },

    /// A resolved step could not be rendered.
    #[error("emission error at {position}: {message}")]
    Emission {
        /// Position of the declaration the step originated from.
        position: SourcePosition,
        /// Why rendering failed.
        message: String,
    },

    /// The output sink rejected the emitted script.
    #[error("emission error: output sink rejected write: {source}")]
    OutputSink {
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The specification input stream could not be read.
    #[error("failed to read specification input: {source}")]
    Input {
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// YAML deserialization failed.
    #[error("YAML error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

impl QuokkaError {
    /// Returns the source position attached to the error, if any.
    #[must_use]
    pub const fn position(&self) -> Option<SourcePosition> {
        match self {
            Self::Syntax { position, .. }
            | Self::Resolution { position, .. }
            | Self::Semantic { position, .. }
            | Self::Emission { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Structural rules enforced by the realizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticRule {
    /// A declaration appears before any `base`.
    MissingBase,
    /// More than one `base` is declared.
    DuplicateBase,
    /// A `base` appears inside a step group.
    BaseInStep,
    /// A step group is nested inside another step group.
    NestedStep,
    /// Two step groups share a name.
    DuplicateStep,
    /// An `after` clause names a step that does not exist.
    UndeclaredPrerequisite,
    /// Step prerequisites form a cycle.
    DependencyCycle,
    /// A required argument is absent or empty.
    MissingArgument,
    /// An argument has the wrong shape or an out-of-range value.
    InvalidArgument,
}

impl SemanticRule {
    /// Stable kebab-case identifier of the rule.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingBase => "missing-base",
            Self::DuplicateBase => "duplicate-base",
            Self::BaseInStep => "base-in-step",
            Self::NestedStep => "nested-step",
            Self::DuplicateStep => "duplicate-step",
            Self::UndeclaredPrerequisite => "undeclared-prerequisite",
            Self::DependencyCycle => "dependency-cycle",
            Self::MissingArgument => "missing-argument",
            Self::InvalidArgument => "invalid-argument",
        }
    }
}

impl fmt::Display for SemanticRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single library lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    /// The library knows nothing under this name.
    #[error("unknown name `{name}`")]
    UnknownName {
        /// Name that was looked up.
        name: String,
    },

    /// The name exists but no version satisfies the constraint.
    #[error("no version of `{name}` satisfies `{constraint}` (available: {available})")]
    NoMatchingVersion {
        /// Name that was looked up.
        name: String,
        /// The unsatisfiable constraint.
        constraint: String,
        /// Comma-separated list of known versions.
        available: String,
    },

    /// The backend could not be reached or timed out.
    #[error("library backend unavailable: {message}")]
    Unavailable {
        /// Description of the backend failure.
        message: String,
    },

    /// The backend answered with a definition that cannot be used.
    #[error("malformed definition for `{name}`: {message}")]
    Malformed {
        /// Name that was looked up.
        name: String,
        /// What is wrong with the definition.
        message: String,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, QuokkaError>;
