//! # quokka-sdk
//!
//! Public SDK for using Quokka as a Rust library.
//!
//! Provides two entry points:
//! - [`BuildService`](service::BuildService): Runs parse, realize and emit
//!   against one library client.
//! - [`BuildServiceBuilder`](builder::BuildServiceBuilder): Assembles a
//!   service with substitute stages.
//!
//! # Example
//!
//! ```rust,no_run
//! use quokka_library::CatalogFile;
//! use quokka_sdk::service::BuildService;
//!
//! # fn main() -> quokka_common::error::Result<()> {
//! let library = CatalogFile::open(std::path::Path::new("library.json"))?.load()?;
//! let service = BuildService::new(library);
//! let mut dockerfile = Vec::new();
//! service.build(&b"base = \"alpine\"\nrun = \"echo hi\"\n"[..], &mut dockerfile)?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod builder;
pub mod service;

pub use builder::BuildServiceBuilder;
pub use service::BuildService;
