//! # rulegen-schema: Schema Registry, Type Resolution & Validation
//!
//! Everything rulegen knows about JSON Schema lives here.
//!
//! ## Registry (`registry`)
//!
//! [`SchemaRegistry::load`] reads the root schema and every sibling
//! `*.json` file, indexes them by `$id` (or a path-derived identifier) and
//! by file name, and resolves `<id>#<pointer>` references between them.
//!
//! ## Type Resolution (`resolve`)
//!
//! [`TypeResolver::resolve_type`] walks a dotted path through `properties`
//! and `items`, dereferencing `$ref` chains at every step, and reports the
//! [`ResolvedType`](rulegen_core::ResolvedType) declared there. The
//! mutation engine uses it to decide how to parse raw `--set` values.
//!
//! ## Validation (`validate`)
//!
//! [`SchemaValidator`] compiles the root schema with the `jsonschema`
//! crate (Draft 2020-12), serving external references from the registry,
//! and reports every violation of a finished document.
//!
//! ## Form Outline (`outline`)
//!
//! [`FormOutline::build`] lists the sections and typed fields a rule
//! wizard would render for the root schema.
//!
//! ## Crate Policy
//!
//! - Depends only on `rulegen-core` internally.
//! - Read-only: nothing here mutates a schema after loading.
//! - No network access; every `$ref` resolves from the loaded directory.

pub mod error;
pub mod outline;
pub mod registry;
pub mod resolve;
pub mod validate;

pub use error::SchemaError;
pub use outline::{Field, FormOutline, Section};
pub use registry::{SchemaRegistry, ROOT_SENTINEL};
pub use resolve::{ResolvedNode, TypeResolver};
pub use validate::{SchemaValidator, ValidationError, ValidationViolations, Violation};
