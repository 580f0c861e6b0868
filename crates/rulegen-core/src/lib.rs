//! # rulegen-core: Foundational Types for rulegen
//!
//! This crate is the leaf of the rulegen workspace. It defines the
//! vocabulary shared by the schema resolver and the mutation engine:
//!
//! 1. **[`PathExpression`].** Dotted/indexed paths (`a.b[0].c`) are parsed
//!    once into typed tokens. No layer above this one splits strings on `.`.
//!
//! 2. **[`JsonKind`] and [`ResolvedType`].** A closed enum of the seven JSON
//!    Schema type names, and the tagged result of resolving a path: one
//!    kind, a deterministic set of kinds, or unknown.
//!
//! 3. **[`PathError`].** The structural failure shared by schema walks and
//!    document walks.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `rulegen-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod kind;
pub mod path;

pub use error::PathError;
pub use kind::{JsonKind, ResolvedType};
pub use path::{PathExpression, PathToken};
