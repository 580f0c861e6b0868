//! # JSON Kinds and Resolved Types
//!
//! [`JsonKind`] is the closed set of JSON Schema primitive type names.
//! [`ResolvedType`] is what the schema resolver reports for a path: one
//! kind, a set of candidate kinds (unions and `type` arrays), or nothing
//! determinable.
//!
//! The declaration order of [`JsonKind`] is significant: union members are
//! kept in a `BTreeSet`, so iteration (and therefore any "first member"
//! fallback during narrowing) is deterministic.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON Schema primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonKind {
    /// `"string"`
    String,
    /// `"integer"`
    Integer,
    /// `"number"`
    Number,
    /// `"boolean"`
    Boolean,
    /// `"array"`
    Array,
    /// `"object"`
    Object,
    /// `"null"`
    Null,
}

impl JsonKind {
    /// All kinds in declaration order.
    pub const ALL: [JsonKind; 7] = [
        Self::String,
        Self::Integer,
        Self::Number,
        Self::Boolean,
        Self::Array,
        Self::Object,
        Self::Null,
    ];

    /// Map a JSON Schema `type` name to its kind.
    ///
    /// Returns `None` for names outside the seven standard types.
    pub fn from_schema_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// The JSON Schema `type` name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
        }
    }

    /// The kind of an existing JSON value. Integral numbers report
    /// [`JsonKind::Integer`].
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// True for kinds whose values contain other values.
    pub fn is_compound(self) -> bool {
        matches!(self, Self::Array | Self::Object)
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The type a schema node permits, as far as the resolver can tell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resolution", content = "kinds", rename_all = "lowercase")]
pub enum ResolvedType {
    /// Exactly one declared kind.
    Single(JsonKind),
    /// A set of candidate kinds from `oneOf`/`anyOf`/`allOf` or a `type`
    /// array.
    Union(BTreeSet<JsonKind>),
    /// No determinable kind.
    Unknown,
}

impl ResolvedType {
    /// Build a union from any collection of kinds. An empty collection
    /// yields [`ResolvedType::Unknown`].
    pub fn union<I: IntoIterator<Item = JsonKind>>(kinds: I) -> Self {
        let set: BTreeSet<JsonKind> = kinds.into_iter().collect();
        if set.is_empty() {
            Self::Unknown
        } else {
            Self::Union(set)
        }
    }

    /// The kinds this type permits, in deterministic order.
    pub fn kinds(&self) -> Vec<JsonKind> {
        match self {
            Self::Single(k) => vec![*k],
            Self::Union(set) => set.iter().copied().collect(),
            Self::Unknown => Vec::new(),
        }
    }

    /// True if `kind` is permitted.
    pub fn contains(&self, kind: JsonKind) -> bool {
        match self {
            Self::Single(k) => *k == kind,
            Self::Union(set) => set.contains(&kind),
            Self::Unknown => false,
        }
    }

    /// True if nothing could be determined.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(k) => write!(f, "{k}"),
            Self::Union(set) => {
                let names: Vec<&str> = set.iter().map(|k| k.as_str()).collect();
                write!(f, "{}", names.join(" | "))
            }
            Self::Unknown => f.write_str("unknown"),
        }
    }
}
