//! # quokka-library
//!
//! The lookup side of the Quokka pipeline: turning symbolic references such
//! as `alpine:3.19` into concrete, digest-pinned definitions.
//!
//! Handles:
//! - **Client**: the [`LibraryClient`] contract the realizer and emitter consume.
//! - **References**: parsing of `name[:constraint]`.
//! - **Versions**: ordering and constraint matching shared by the backends.
//! - **Catalog**: a local JSON/YAML catalog and its in-memory index.
//! - **Remote**: an HTTP backend with timeouts and an offline switch.
//! - **Cache**: a memoizing wrapper safe for concurrent builds.
//! - **Hashing**: SHA-256 content digests.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod cache;
pub mod catalog;
pub mod client;
pub mod definition;
pub mod hash;
pub mod reference;
pub mod remote;
pub mod version;

pub use cache::CachingClient;
pub use catalog::{CatalogEntry, CatalogFile, CatalogLibrary};
pub use client::LibraryClient;
pub use definition::ResolvedDefinition;
pub use reference::SymbolicReference;
pub use remote::RemoteLibrary;
