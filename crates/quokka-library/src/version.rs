//! Version ordering and constraint matching for the bundled backends.
//!
//! Versions are dot-separated components. Two components compare
//! numerically when both are numeric and lexically otherwise; numeric
//! components sort before textual ones, and a version that is a strict
//! prefix of another sorts first (`3.19` < `3.19.1`).

use std::cmp::Ordering;

use quokka_common::error::LibraryError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Component<'a> {
    Numeric(u64),
    Text(&'a str),
}

impl Ord for Component<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Numeric(a), Self::Numeric(b)) => a.cmp(b),
            (Self::Numeric(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Numeric(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Component<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn components(version: &str) -> Vec<Component<'_>> {
    version
        .split('.')
        .map(|part| {
            part.parse::<u64>()
                .map_or(Component::Text(part), Component::Numeric)
        })
        .collect()
}

/// Compares two version strings.
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    components(a).cmp(&components(b))
}

/// A parsed version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// `*`, `latest`, or no constraint: the highest version wins.
    Any,
    /// `=V`: exactly `V`.
    Exact(String),
    /// `>=V`: the highest version not lower than `V`.
    AtLeast(String),
    /// `V`: any version whose leading components equal those of `V`.
    Prefix(String),
}

impl VersionConstraint {
    /// Parses a constraint; `None` means unconstrained.
    #[must_use]
    pub fn parse(constraint: Option<&str>) -> Self {
        match constraint {
            None | Some("*" | "latest") => Self::Any,
            Some(c) => {
                if let Some(v) = c.strip_prefix(">=") {
                    Self::AtLeast(v.to_string())
                } else if let Some(v) = c.strip_prefix('=') {
                    Self::Exact(v.to_string())
                } else {
                    Self::Prefix(c.to_string())
                }
            }
        }
    }

    /// Returns whether `version` satisfies this constraint.
    #[must_use]
    pub fn matches(&self, version: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(v) => compare(version, v) == Ordering::Equal,
            Self::AtLeast(v) => compare(version, v) != Ordering::Less,
            Self::Prefix(v) => {
                let wanted = components(v);
                let have = components(version);
                have.len() >= wanted.len() && have[..wanted.len()] == wanted[..]
            }
        }
    }
}

/// Picks the highest candidate satisfying `constraint`.
///
/// `version_of` projects each candidate to its version string.
///
/// # Errors
///
/// Returns `LibraryError::UnknownName` when there are no candidates at all
/// and `LibraryError::NoMatchingVersion` when none satisfies the constraint.
pub fn select<'a, T>(
    name: &str,
    constraint: Option<&str>,
    candidates: &'a [T],
    version_of: impl Fn(&T) -> &str,
) -> Result<&'a T, LibraryError> {
    if candidates.is_empty() {
        return Err(LibraryError::UnknownName {
            name: name.to_string(),
        });
    }

    let parsed = VersionConstraint::parse(constraint);
    candidates
        .iter()
        .filter(|c| parsed.matches(version_of(*c)))
        .max_by(|a, b| compare(version_of(*a), version_of(*b)))
        .ok_or_else(|| {
            let mut versions: Vec<&str> = candidates.iter().map(&version_of).collect();
            versions.sort_by(|a, b| compare(a, b));
            LibraryError::NoMatchingVersion {
                name: name.to_string(),
                constraint: constraint.unwrap_or("*").to_string(),
                available: versions.join(", "),
            }
        })
}
