//! # Rule Engine
//!
//! Applies an ordered list of [`MutationOp`]s to a rule document. Each
//! `Set` consults the schema through a [`TypeResolver`] to decide how its
//! raw text becomes JSON; `Unset` and `Merge` are schema-independent.
//!
//! Operations run strictly in order. The first failing operation aborts
//! the batch and the document keeps every change made before it, so
//! callers that need all-or-nothing semantics work on a clone.

use rulegen_core::{JsonKind, PathExpression, ResolvedType};
use rulegen_schema::{SchemaRegistry, TypeResolver};
use serde_json::{Map, Value};

use crate::convert;
use crate::error::MutationError;
use crate::merge;
use crate::mutate;

/// One edit to a rule document.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOp {
    /// Write the schema-typed conversion of `raw` at `path`.
    Set {
        /// Target path.
        path: PathExpression,
        /// Raw text as given on the command line.
        raw: String,
    },
    /// Remove whatever is at `path`, if anything.
    Unset {
        /// Target path.
        path: PathExpression,
    },
    /// Deep-merge a patch object into the document.
    Merge(Map<String, Value>),
}

impl MutationOp {
    /// Parse a `path=value` assignment. The path is trimmed; the value is
    /// kept exactly as given and may itself contain `=`.
    ///
    /// # Errors
    ///
    /// [`MutationError::InvalidOperation`] without `=`, or a path error for
    /// a malformed path.
    pub fn parse_set(entry: &str) -> Result<Self, MutationError> {
        let (path, raw) = entry
            .split_once('=')
            .ok_or_else(|| MutationError::InvalidOperation {
                entry: entry.to_string(),
                reason: "expected path=value".to_string(),
            })?;
        Ok(Self::Set {
            path: PathExpression::parse(path.trim())?,
            raw: raw.to_string(),
        })
    }

    /// Parse an unset target.
    ///
    /// # Errors
    ///
    /// A path error for a malformed path.
    pub fn parse_unset(entry: &str) -> Result<Self, MutationError> {
        Ok(Self::Unset {
            path: PathExpression::parse(entry.trim())?,
        })
    }
}

/// Applies mutation operations to documents described by one schema registry.
#[derive(Debug, Clone, Copy)]
pub struct RuleEngine<'a> {
    resolver: TypeResolver<'a>,
}

impl<'a> RuleEngine<'a> {
    /// Create an engine over a loaded registry.
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            resolver: TypeResolver::new(registry),
        }
    }

    /// The resolver used for `Set` operations.
    pub fn resolver(&self) -> &TypeResolver<'a> {
        &self.resolver
    }

    /// Apply a single operation.
    ///
    /// # Errors
    ///
    /// See [`RuleEngine::set`]. `Unset` and `Merge` never fail.
    pub fn apply(&self, document: &mut Value, op: MutationOp) -> Result<(), MutationError> {
        match op {
            MutationOp::Set { path, raw } => self.set(document, &path, &raw),
            MutationOp::Unset { path } => {
                self.unset(document, &path);
                Ok(())
            }
            MutationOp::Merge(patch) => {
                self.merge(document, patch);
                Ok(())
            }
        }
    }

    /// Apply operations in order and return how many were applied.
    ///
    /// # Errors
    ///
    /// The first failing operation's error. Earlier operations stay applied.
    pub fn apply_all<I>(&self, document: &mut Value, ops: I) -> Result<usize, MutationError>
    where
        I: IntoIterator<Item = MutationOp>,
    {
        let mut applied = 0;
        for op in ops {
            self.apply(document, op)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Convert `raw` per the schema type at `path` and write it there.
    ///
    /// # Errors
    ///
    /// - [`MutationError::Schema`] if the path cannot be resolved in the schema.
    /// - [`MutationError::TypeResolution`] if the schema declares no type there.
    /// - [`MutationError::Conversion`] if `raw` does not fit the chosen kind.
    /// - [`MutationError::Path`] if the document cannot hold the path.
    pub fn set(
        &self,
        document: &mut Value,
        path: &PathExpression,
        raw: &str,
    ) -> Result<(), MutationError> {
        let value = self.typed_value(path, raw)?;
        tracing::debug!(path = %path, value = %value, "set");
        mutate::write_value(document, path, value)?;
        Ok(())
    }

    /// The JSON value `raw` becomes when written at `path`.
    ///
    /// # Errors
    ///
    /// As [`RuleEngine::set`], minus document errors.
    pub fn typed_value(&self, path: &PathExpression, raw: &str) -> Result<Value, MutationError> {
        let resolved = self.resolver.resolve_type(path)?;
        let kind = convert::narrow(&resolved, raw).ok_or_else(|| MutationError::TypeResolution {
            path: path.to_string(),
            resolved: resolved.clone(),
        })?;

        let item_type = if kind == JsonKind::Array {
            self.resolver.resolve_item_type(path)?
        } else {
            ResolvedType::Unknown
        };
        tracing::trace!(path = %path, resolved = %resolved, chosen = %kind, "narrowed type");

        convert::convert(path, kind, raw, &item_type)
    }

    /// Remove the value at `path`. Returns whether anything was removed.
    pub fn unset(&self, document: &mut Value, path: &PathExpression) -> bool {
        let removed = mutate::remove_value(document, path);
        if removed {
            tracing::debug!(path = %path, "unset");
        } else {
            tracing::debug!(path = %path, "unset: nothing to remove");
        }
        removed
    }

    /// Deep-merge `patch` into the document.
    pub fn merge(&self, document: &mut Value, patch: Map<String, Value>) {
        tracing::debug!(keys = patch.len(), "merge");
        merge::merge_document(document, patch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulegen_core::PathError;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_documents(
            "root.json",
            vec![(
                "root.json".to_string(),
                json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "count": {"type": "integer"},
                        "ratio": {"type": "number"},
                        "flag": {"type": "boolean"},
                        "tags": {"type": ["array", "null"], "items": {"type": "string"}},
                        "options": {"type": "array", "items": {"type": "integer"}},
                        "extra": {"type": "object"},
                        "anything": {},
                        "nested": {
                            "type": "object",
                            "properties": {"level": {"type": "integer"}}
                        }
                    }
                }),
            )],
        )
        .unwrap()
    }

    fn p(text: &str) -> PathExpression {
        PathExpression::parse(text).unwrap()
    }

    #[test]
    fn parse_set_splits_on_first_equals() {
        let op = MutationOp::parse_set(" name = a=b").unwrap();
        assert_eq!(
            op,
            MutationOp::Set {
                path: p("name"),
                raw: " a=b".to_string()
            }
        );
    }

    #[test]
    fn parse_set_without_equals_is_rejected() {
        let err = MutationOp::parse_set("name").unwrap_err();
        assert!(matches!(err, MutationError::InvalidOperation { .. }));
    }

    #[test]
    fn parse_set_with_bad_path() {
        let err = MutationOp::parse_set("a..b=1").unwrap_err();
        assert!(matches!(err, MutationError::Path(PathError::Syntax { .. })));
    }

    #[test]
    fn set_converts_by_schema_type() {
        let registry = registry();
        let engine = RuleEngine::new(&registry);
        let mut doc = json!({});
        engine.set(&mut doc, &p("name"), "42").unwrap();
        engine.set(&mut doc, &p("count"), "42").unwrap();
        engine.set(&mut doc, &p("ratio"), "0.5").unwrap();
        engine.set(&mut doc, &p("flag"), "True").unwrap();
        engine.set(&mut doc, &p("nested.level"), "3").unwrap();
        assert_eq!(
            doc,
            json!({"name": "42", "count": 42, "ratio": 0.5, "flag": true, "nested": {"level": 3}})
        );
    }

    #[test]
    fn set_union_array_or_null() {
        let registry = registry();
        let engine = RuleEngine::new(&registry);
        let mut doc = json!({});
        engine.set(&mut doc, &p("tags"), "[a, b]").unwrap();
        assert_eq!(doc["tags"], json!(["a", "b"]));
        engine.set(&mut doc, &p("tags"), "null").unwrap();
        assert_eq!(doc["tags"], json!(null));
    }

    #[test]
    fn set_array_uses_item_type() {
        let registry = registry();
        let engine = RuleEngine::new(&registry);
        let mut doc = json!({});
        engine.set(&mut doc, &p("options"), "[1, 2, 3]").unwrap();
        assert_eq!(doc["options"], json!([1, 2, 3]));
        engine.set(&mut doc, &p("options[1]"), "20").unwrap();
        assert_eq!(doc["options"], json!([1, 20, 3]));
    }

    #[test]
    fn set_object_from_inline_json() {
        let registry = registry();
        let engine = RuleEngine::new(&registry);
        let mut doc = json!({});
        engine.set(&mut doc, &p("extra"), r#"{"k": [1]}"#).unwrap();
        assert_eq!(doc["extra"], json!({"k": [1]}));
    }

    #[test]
    fn untyped_property_is_type_resolution_error() {
        let registry = registry();
        let engine = RuleEngine::new(&registry);
        let mut doc = json!({});
        let err = engine.set(&mut doc, &p("anything"), "x").unwrap_err();
        assert!(matches!(err, MutationError::TypeResolution { .. }));
        assert_eq!(doc, json!({}));
    }

    #[test]
    fn unknown_property_is_schema_path_error() {
        let registry = registry();
        let engine = RuleEngine::new(&registry);
        let mut doc = json!({});
        let err = engine.set(&mut doc, &p("missing"), "x").unwrap_err();
        assert!(matches!(err, MutationError::Schema(_)));
    }

    #[test]
    fn conversion_failure_leaves_document_unchanged() {
        let registry = registry();
        let engine = RuleEngine::new(&registry);
        let mut doc = json!({"count": 1});
        let err = engine.set(&mut doc, &p("count"), "many").unwrap_err();
        assert!(matches!(err, MutationError::Conversion { .. }));
        assert_eq!(doc, json!({"count": 1}));
    }

    #[test]
    fn apply_all_in_order_and_stops_at_first_error() {
        let registry = registry();
        let engine = RuleEngine::new(&registry);
        let mut doc = json!({"name": "old", "count": 1});

        let ops = vec![
            MutationOp::Merge(json!({"flag": false}).as_object().cloned().unwrap()),
            MutationOp::parse_set("name=new").unwrap(),
            MutationOp::parse_unset("count").unwrap(),
            MutationOp::parse_set("count=bad").unwrap(),
            MutationOp::parse_set("flag=true").unwrap(),
        ];
        let err = engine.apply_all(&mut doc, ops).unwrap_err();
        assert!(matches!(err, MutationError::Conversion { .. }));
        assert_eq!(doc, json!({"name": "new", "flag": false}));
    }

    #[test]
    fn unset_reports_removal() {
        let registry = registry();
        let engine = RuleEngine::new(&registry);
        let mut doc = json!({"name": "x"});
        assert!(engine.unset(&mut doc, &p("name")));
        assert!(!engine.unset(&mut doc, &p("name")));
    }

    #[test]
    fn set_through_all_of_and_nullable_array() {
        let registry = SchemaRegistry::from_documents(
            "root.json",
            vec![
                (
                    "root.json".to_string(),
                    json!({"properties": {
                        "scoring": {"allOf": [
                            {"$ref": "base.json#/$defs/scoring"},
                            {"properties": {"bonus": {"type": "integer"}}}
                        ]},
                        "limits": {"anyOf": [
                            {"type": "array", "items": {"type": "integer"}},
                            {"type": "null"}
                        ]}
                    }}),
                ),
                (
                    "base.json".to_string(),
                    json!({"$defs": {"scoring": {"properties": {"points": {"type": "number"}}}}}),
                ),
            ],
        )
        .unwrap();
        let engine = RuleEngine::new(&registry);
        let mut doc = json!({});
        engine.set(&mut doc, &p("scoring.points"), "2.5").unwrap();
        engine.set(&mut doc, &p("scoring.bonus"), "3").unwrap();
        engine.set(&mut doc, &p("limits"), "[1, 2]").unwrap();
        assert_eq!(
            doc,
            json!({"scoring": {"points": 2.5, "bonus": 3}, "limits": [1, 2]})
        );
        engine.set(&mut doc, &p("limits"), "null").unwrap();
        assert_eq!(doc["limits"], json!(null));
    }
}
