//! # rulegen-engine: Schema-Directed Document Mutation
//!
//! Turns `--set path=value` / `--unset path` / patch-file arguments into
//! edits of a rule document.
//!
//! - [`convert`] narrows a resolved schema type to one kind and converts
//!   raw text into JSON of that kind.
//! - [`mutate`] writes and removes values at a
//!   [`PathExpression`](rulegen_core::PathExpression) in a live document.
//! - [`merge`] deep-merges patch objects.
//! - [`RuleEngine`] ties them to a schema registry and applies ordered
//!   [`MutationOp`] batches.
//!
//! Validation of the finished document is not done here; see
//! `rulegen_schema::SchemaValidator`.

pub mod convert;
pub mod engine;
pub mod error;
pub mod merge;
pub mod mutate;

pub use engine::{MutationOp, RuleEngine};
pub use error::MutationError;
