//! HTTP library backend.
//!
//! Looks names up with `GET <base>/v1/definitions/<name>`, which answers
//! with a JSON array of every published version of that name. Version
//! selection happens client-side with the same rules as the local catalog.

use std::time::Duration;

use quokka_common::constants::REMOTE_DEFINITIONS_PATH;
use quokka_common::error::{LibraryError, QuokkaError, Result};
use reqwest::StatusCode;
use reqwest::Url;

use crate::client::LibraryClient;
use crate::definition::ResolvedDefinition;
use crate::reference::SymbolicReference;

/// Library client backed by a remote HTTP service.
#[derive(Debug, Clone)]
pub struct RemoteLibrary {
    base_url: Url,
    client: reqwest::blocking::Client,
    offline: bool,
}

impl RemoteLibrary {
    /// Creates a client for `base_url` whose lookups give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `QuokkaError::Config` if the URL is not an absolute
    /// `http(s)` URL or the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quokka/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| QuokkaError::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        let library = Self::with_client(base_url, client)?;
        tracing::info!(url = %library.base_url, timeout_secs = timeout.as_secs(), "remote library configured");
        Ok(library)
    }

    /// Creates a client for `base_url` that sends lookups through `client`.
    ///
    /// # Errors
    ///
    /// Returns `QuokkaError::Config` if the URL is not an absolute
    /// `http(s)` URL.
    pub fn with_client(base_url: &str, client: reqwest::blocking::Client) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| QuokkaError::Config {
            message: format!("invalid registry URL `{base_url}`: {e}"),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(QuokkaError::Config {
                message: format!("unsupported registry URL: {base_url}"),
            });
        }
        Ok(Self {
            base_url,
            client,
            offline: false,
        })
    }

    /// Enables or disables offline mode, in which every lookup is refused.
    #[must_use]
    pub const fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// The lookup URL for `name`; path separators inside the name are escaped.
    #[must_use]
    pub fn definitions_url(&self, name: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            let _ = segments.pop_if_empty();
            let _ = segments.extend(REMOTE_DEFINITIONS_PATH.split('/'));
            let _ = segments.push(name);
        }
        url
    }
}

/// Picks the definition for `reference` among the versions a server returned.
///
/// # Errors
///
/// Returns `LibraryError::Malformed` if the server answered with
/// definitions for another name, otherwise the selection errors of
/// [`crate::version::select`].
pub fn choose(
    reference: &SymbolicReference,
    definitions: &[ResolvedDefinition],
) -> std::result::Result<ResolvedDefinition, LibraryError> {
    if let Some(stray) = definitions.iter().find(|d| d.name != reference.name) {
        return Err(LibraryError::Malformed {
            name: reference.name.clone(),
            message: format!("server answered with a definition for `{}`", stray.name),
        });
    }
    crate::version::select(
        &reference.name,
        reference.constraint.as_deref(),
        definitions,
        |d| d.version.as_str(),
    )
    .cloned()
}

impl LibraryClient for RemoteLibrary {
    fn resolve(
        &self,
        reference: &SymbolicReference,
    ) -> std::result::Result<ResolvedDefinition, LibraryError> {
        if self.offline {
            return Err(LibraryError::Unavailable {
                message: format!("offline mode forbids remote lookup of `{}`", reference.name),
            });
        }

        let url = self.definitions_url(&reference.name);
        tracing::debug!(%url, reference = %reference, "remote library lookup");

        let response = self.client.get(url.clone()).send().map_err(|e| {
            let message = if e.is_timeout() {
                format!("lookup of `{}` timed out", reference.name)
            } else {
                format!("request to {url} failed: {e}")
            };
            LibraryError::Unavailable { message }
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(LibraryError::UnknownName {
                    name: reference.name.clone(),
                });
            }
            status if !status.is_success() => {
                return Err(LibraryError::Unavailable {
                    message: format!("{url} answered {status}"),
                });
            }
            _ => {}
        }

        let definitions: Vec<ResolvedDefinition> =
            response.json().map_err(|e| LibraryError::Malformed {
                name: reference.name.clone(),
                message: format!("unreadable response body: {e}"),
            })?;
        choose(reference, &definitions)
    }
}
