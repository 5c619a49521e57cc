//! # quokka-compiler
//!
//! The three stages that turn a Quokkafile into a Dockerfile.
//!
//! Handles:
//! - **Parser**: Lexing and recursive-descent parsing into a positioned AST.
//! - **Realize**: Reference resolution, structural checks, and step ordering.
//! - **Emit**: Deterministic Dockerfile rendering.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod emit;
pub mod parser;
pub mod realize;

pub use emit::{Emit, Emitter};
pub use parser::{Parse, Parser, parse_spec};
pub use realize::{Realization, Realize, Realizer, ResolvedStep, StepAction};
