//! Errors raised while loading schemas and resolving paths against them.

use rulegen_core::PathError;
use thiserror::Error;

/// Error during schema loading, reference resolution, or path resolution.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A schema file or directory could not be read or parsed, or the
    /// registry is inconsistent (duplicate identifier, missing root).
    #[error("schema load error for '{schema}': {reason}")]
    SchemaLoad {
        /// Schema file path or identifier.
        schema: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// A `$ref` names an unregistered schema, a missing pointer segment,
    /// or forms a cycle.
    #[error("cannot resolve reference '{reference}': {reason}")]
    Reference {
        /// The reference string as written in the schema.
        reference: String,
        /// Reason the reference could not be resolved.
        reason: String,
    },

    /// A path token does not match the schema shape.
    #[error(transparent)]
    Path(#[from] PathError),

    /// IO error while listing the schema directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
