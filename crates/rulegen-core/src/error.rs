//! # Error Types: Path Failures
//!
//! Path errors are shared by every layer that walks a [`PathExpression`]:
//! the schema resolver walks it through `properties`/`items`, the mutation
//! engine walks it through the live document. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.
//!
//! Each variant carries the full dotted path that was being processed so
//! that a failure deep inside a batch of `--set` operations can be traced
//! back to the argument that caused it.
//!
//! [`PathExpression`]: crate::path::PathExpression

use thiserror::Error;

/// A path token could not be resolved, or the path text is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path text does not follow `segment(.segment)*` syntax.
    #[error("invalid path '{path}': {reason}")]
    Syntax {
        /// The raw path text.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A key token has no matching entry in the schema's `properties`.
    #[error("property not found: '{property}' in '{path}'")]
    PropertyNotFound {
        /// The full dotted path.
        path: String,
        /// The key token that failed to resolve.
        property: String,
    },

    /// An index token was applied to a schema node that is not an array.
    #[error("index on non-array at position {position} of '{path}'")]
    IndexOnNonArray {
        /// The full dotted path.
        path: String,
        /// Zero-based token position of the offending index.
        position: usize,
    },

    /// An index lies beyond the end of an existing array. Writing exactly
    /// at the current length appends; anything further is rejected.
    #[error("index {index} out of bounds for append in '{path}' (array length {len})")]
    IndexOutOfBounds {
        /// The full dotted path.
        path: String,
        /// The requested index.
        index: usize,
        /// The current length of the array.
        len: usize,
    },

    /// Traversal reached a value that cannot hold the next token: a scalar,
    /// a key applied to an array, or an index applied to an object.
    #[error("cannot traverse through non-container at '{segment}' in '{path}'")]
    NotAContainer {
        /// The full dotted path.
        path: String,
        /// The token at which traversal stopped.
        segment: String,
    },
}

impl PathError {
    /// The full dotted path this error refers to.
    pub fn path(&self) -> &str {
        match self {
            Self::Syntax { path, .. }
            | Self::PropertyNotFound { path, .. }
            | Self::IndexOnNonArray { path, .. }
            | Self::IndexOutOfBounds { path, .. }
            | Self::NotAContainer { path, .. } => path,
        }
    }
}
