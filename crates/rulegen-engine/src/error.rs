//! Errors raised while applying mutation operations to a rule document.

use rulegen_core::{JsonKind, PathError, ResolvedType};
use rulegen_schema::SchemaError;
use thiserror::Error;

/// Error during a `Set`, `Unset`, or `Merge` operation.
#[derive(Error, Debug)]
pub enum MutationError {
    /// The schema could not be consulted for the target path.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The path could not be walked in the live document.
    #[error(transparent)]
    Path(#[from] PathError),

    /// The schema declares no usable type at the path.
    #[error("cannot determine a type for '{path}' (resolved: {resolved})")]
    TypeResolution {
        /// The dotted path.
        path: String,
        /// What the resolver reported.
        resolved: ResolvedType,
    },

    /// The raw value cannot be read as the chosen kind.
    #[error("cannot convert '{value}' to {kind} at '{path}': {reason}")]
    Conversion {
        /// The dotted path.
        path: String,
        /// The kind the value was converted to.
        kind: JsonKind,
        /// The raw text.
        value: String,
        /// Why conversion failed.
        reason: String,
    },

    /// A textual operation is malformed (e.g. `--set` without `=`).
    #[error("invalid operation '{entry}': {reason}")]
    InvalidOperation {
        /// The operation as given.
        entry: String,
        /// What is wrong with it.
        reason: String,
    },
}
