//! # Path Type Resolution
//!
//! Walks a [`PathExpression`] from the root schema through `properties`
//! and `items`, dereferencing `$ref` chains before every step, and reports
//! the [`ResolvedType`] of the node it lands on.
//!
//! A key is looked up in the node's `properties` and in the `properties`
//! of its `allOf` branches; the last declaration wins. An index uses
//! `prefixItems` or `items`, and when the node has neither, the items of
//! the first array-typed `oneOf`/`anyOf`/`allOf` branch.
//!
//! Type extraction is shallow:
//!
//! - `oneOf`, `anyOf` and `allOf` branches are unioned. `allOf` should
//!   intersect; it is unioned here and that is a known simplification.
//! - a `type` array becomes a union, a `type` string a single kind,
//! - `properties` without `type` means object,
//! - anything else is unknown.
//!
//! `if/then/else`, `not`, and value constraints are ignored.

use std::collections::BTreeSet;

use rulegen_core::{JsonKind, PathError, PathExpression, PathToken, ResolvedType};
use serde_json::Value;

use crate::error::SchemaError;
use crate::registry::SchemaRegistry;

/// The schema `true`: accepts anything, declares nothing.
static EMPTY_SCHEMA: Value = Value::Bool(true);

/// Composition keywords whose branches are unioned for type extraction.
const UNION_KEYWORDS: [&str; 3] = ["oneOf", "anyOf", "allOf"];

/// A schema fragment together with the identifier of the document that
/// contains it. The document matters for `$ref`s with an empty identifier.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedNode<'a> {
    /// Identifier of the containing schema document.
    pub document_id: &'a str,
    /// The schema fragment.
    pub schema: &'a Value,
}

/// Resolves the declared type of dotted paths against one registry.
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> TypeResolver<'a> {
    /// Create a resolver over `registry`, starting at its root schema.
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// The registry this resolver reads from.
    pub fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    /// The root schema as a node.
    pub fn root(&self) -> ResolvedNode<'a> {
        ResolvedNode {
            document_id: self.registry.root_id(),
            schema: self.registry.root(),
        }
    }

    /// Resolve the type declared at `path`.
    ///
    /// # Errors
    ///
    /// - [`PathError::PropertyNotFound`] if a key is not among the node's
    ///   `properties`.
    /// - [`PathError::IndexOnNonArray`] if an index meets a node whose type
    ///   does not include `array`.
    /// - [`SchemaError::Reference`] for unresolvable or cyclic `$ref`s.
    pub fn resolve_type(&self, path: &PathExpression) -> Result<ResolvedType, SchemaError> {
        let node = self.node_at(path)?;
        let resolved = self.type_of(node)?;
        tracing::trace!(path = %path, resolved = %resolved, "resolved path type");
        Ok(resolved)
    }

    /// Resolve the item type of the array at `path` (the type at `path[0]`).
    ///
    /// # Errors
    ///
    /// As [`TypeResolver::resolve_type`].
    pub fn resolve_item_type(&self, path: &PathExpression) -> Result<ResolvedType, SchemaError> {
        self.resolve_type(&path.with_index(0))
    }

    /// The fully dereferenced schema node at `path`.
    ///
    /// # Errors
    ///
    /// As [`TypeResolver::resolve_type`].
    pub fn node_at(&self, path: &PathExpression) -> Result<ResolvedNode<'a>, SchemaError> {
        let mut node = self.root();

        for (position, token) in path.tokens().iter().enumerate() {
            node = self.dereference(node)?;
            node = match token {
                PathToken::Key(key) => {
                    self.property_of(node, key, &mut Vec::new())?
                        .ok_or_else(|| PathError::PropertyNotFound {
                            path: path.to_string(),
                            property: key.clone(),
                        })?
                }
                PathToken::Index(index) => {
                    if !self.type_of(node)?.contains(JsonKind::Array) {
                        return Err(PathError::IndexOnNonArray {
                            path: path.to_string(),
                            position,
                        }
                        .into());
                    }
                    self.item_node(node, *index)?.unwrap_or(ResolvedNode {
                        document_id: node.document_id,
                        schema: &EMPTY_SCHEMA,
                    })
                }
            };
        }

        self.dereference(node)
    }

    /// The schema of element `index` of the array schema `node`, or `None`
    /// when neither the node nor an array-typed union branch declares one.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Reference`] for unresolvable or cyclic
    /// references.
    pub fn item_node<'n>(
        &self,
        node: ResolvedNode<'n>,
        index: usize,
    ) -> Result<Option<ResolvedNode<'n>>, SchemaError>
    where
        'a: 'n,
    {
        self.find_items(node, index, &mut Vec::new())
    }

    fn find_items<'n>(
        &self,
        node: ResolvedNode<'n>,
        index: usize,
        visited: &mut Vec<&'n Value>,
    ) -> Result<Option<ResolvedNode<'n>>, SchemaError>
    where
        'a: 'n,
    {
        let node = self.dereference(node)?;
        if visited.iter().any(|seen| std::ptr::eq(*seen, node.schema)) {
            return Ok(None);
        }
        visited.push(node.schema);

        if let Some(schema) = declared_items(node.schema, index) {
            return Ok(Some(ResolvedNode {
                document_id: node.document_id,
                schema,
            }));
        }
        for keyword in UNION_KEYWORDS {
            for branch in node.schema.get(keyword).and_then(Value::as_array).into_iter().flatten() {
                let branch = ResolvedNode {
                    document_id: node.document_id,
                    schema: branch,
                };
                if !self.type_of(branch)?.contains(JsonKind::Array) {
                    continue;
                }
                if let Some(found) = self.find_items(branch, index, visited)? {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }

    /// The schema of property `key` declared by `node` or its `allOf`
    /// branches, the last declaration winning.
    fn property_of<'n>(
        &self,
        node: ResolvedNode<'n>,
        key: &str,
        visited: &mut Vec<&'n Value>,
    ) -> Result<Option<ResolvedNode<'n>>, SchemaError>
    where
        'a: 'n,
    {
        let node = self.dereference(node)?;
        if visited.iter().any(|seen| std::ptr::eq(*seen, node.schema)) {
            return Ok(None);
        }
        visited.push(node.schema);

        let mut found = node
            .schema
            .get("properties")
            .and_then(|props| props.get(key))
            .map(|schema| ResolvedNode {
                document_id: node.document_id,
                schema,
            });
        for branch in node.schema.get("allOf").and_then(Value::as_array).into_iter().flatten() {
            let branch = ResolvedNode {
                document_id: node.document_id,
                schema: branch,
            };
            if let Some(hit) = self.property_of(branch, key, visited)? {
                found = Some(hit);
            }
        }
        Ok(found)
    }

    /// Follow a `$ref` chain until the node is not a reference.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Reference`] if a reference cannot be resolved
    /// or the same reference is met twice in one chain.
    pub fn dereference<'n>(&self, node: ResolvedNode<'n>) -> Result<ResolvedNode<'n>, SchemaError>
    where
        'a: 'n,
    {
        let mut visited: Vec<(&str, &str)> = Vec::new();
        let mut current = node;
        while let Some(reference) = current.schema.get("$ref").and_then(Value::as_str) {
            if visited.contains(&(current.document_id, reference)) {
                return Err(cyclic(reference));
            }
            visited.push((current.document_id, reference));
            let (document_id, schema) = self
                .registry
                .resolve_reference_from(current.document_id, reference)?;
            current = ResolvedNode {
                document_id,
                schema,
            };
        }
        Ok(current)
    }

    /// Compute the type of a schema node (dereferencing it first).
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Reference`] for unresolvable or cyclic
    /// references met inside union branches.
    pub fn type_of<'n>(&self, node: ResolvedNode<'n>) -> Result<ResolvedType, SchemaError>
    where
        'a: 'n,
    {
        let mut stack = Vec::new();
        self.extract(node, &mut stack)
    }

    fn extract<'n>(
        &self,
        node: ResolvedNode<'n>,
        stack: &mut Vec<(&'n str, &'n str)>,
    ) -> Result<ResolvedType, SchemaError>
    where
        'a: 'n,
    {
        let depth = stack.len();
        let mut current = node;
        while let Some(reference) = current.schema.get("$ref").and_then(Value::as_str) {
            if stack.contains(&(current.document_id, reference)) {
                return Err(cyclic(reference));
            }
            stack.push((current.document_id, reference));
            let (document_id, schema) = self
                .registry
                .resolve_reference_from(current.document_id, reference)?;
            current = ResolvedNode {
                document_id,
                schema,
            };
        }

        let mut union: Option<BTreeSet<JsonKind>> = None;
        for keyword in UNION_KEYWORDS {
            let Some(branches) = current.schema.get(keyword).and_then(Value::as_array)
            else {
                continue;
            };
            let kinds = union.get_or_insert_with(BTreeSet::new);
            for branch in branches {
                let branch = ResolvedNode {
                    document_id: current.document_id,
                    schema: branch,
                };
                kinds.extend(self.extract(branch, stack)?.kinds());
            }
        }

        let resolved = match union {
            Some(kinds) => ResolvedType::union(kinds),
            None => declared_type(current.schema),
        };
        stack.truncate(depth);
        Ok(resolved)
    }
}

/// Type from the `type` keyword, falling back to `object` when only
/// `properties` is present. Ignores composition keywords.
pub fn declared_type(schema: &Value) -> ResolvedType {
    match schema.get("type") {
        Some(Value::Array(names)) => {
            let kinds = names.iter().filter_map(Value::as_str);
            ResolvedType::union(kinds.filter_map(JsonKind::from_schema_name))
        }
        Some(Value::String(name)) => JsonKind::from_schema_name(name)
            .map(ResolvedType::Single)
            .unwrap_or(ResolvedType::Unknown),
        Some(_) => ResolvedType::Unknown,
        None if schema.get("properties").is_some() => ResolvedType::Single(JsonKind::Object),
        None => ResolvedType::Unknown,
    }
}

/// The schema for element `index` declared directly on an array schema:
/// `prefixItems[index]` when present, else a schema-valued `items`.
fn declared_items(schema: &Value, index: usize) -> Option<&Value> {
    schema
        .get("prefixItems")
        .and_then(Value::as_array)
        .and_then(|prefix| prefix.get(index))
        .or_else(|| schema.get("items").filter(|items| !items.is_array()))
}

fn cyclic(reference: &str) -> SchemaError {
    SchemaError::Reference {
        reference: reference.to_string(),
        reason: "cyclic reference".to_string(),
    }
}
