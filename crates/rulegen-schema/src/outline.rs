//! # Form Outline
//!
//! The rule wizard presents a root schema as a sequence of sections, one
//! per top-level property, each holding the editable fields of that
//! section. This module computes that structure without any UI: the
//! dotted keys it produces are exactly the keys the mutation engine
//! accepts, so a front end only has to pair each [`Field::key`] with a
//! user-entered string.
//!
//! Section schemas are dereferenced and their `allOf` branches merged:
//! `properties` are unioned, every other keyword is taken from the last
//! branch that declares it. Nested objects are flattened into dotted keys.

use rulegen_core::{JsonKind, ResolvedType};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::registry::SchemaRegistry;
use crate::resolve::{declared_type, ResolvedNode, TypeResolver};

/// All sections of a root schema, in schema order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormOutline {
    /// One section per top-level property.
    pub sections: Vec<Section>,
}

/// One top-level property of the root schema.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    /// Property name.
    pub name: String,
    /// `description` of the section schema, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Editable fields, depth-first in schema order.
    pub fields: Vec<Field>,
}

/// One editable leaf value.
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    /// Dotted key (`section.group.leaf`).
    pub key: String,
    /// Name of the enclosing nested object, when the field is not directly
    /// under its section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Declared type.
    pub kinds: ResolvedType,
    /// Element type for array fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_kinds: Option<ResolvedType>,
    /// `default` value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// `enum` choices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// `const` value; such a field is displayed, not edited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constant: Option<Value>,
    /// `description`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FormOutline {
    /// Build the outline of the registry's root schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Reference`] if a `$ref` met while walking the
    /// sections cannot be resolved.
    pub fn build(registry: &SchemaRegistry) -> Result<Self, SchemaError> {
        let resolver = TypeResolver::new(registry);
        let root = resolver.dereference(resolver.root())?;
        let Some(properties) = root.schema.get("properties").and_then(Value::as_object) else {
            return Ok(Self::default());
        };

        let mut sections = Vec::with_capacity(properties.len());
        for (name, schema) in properties {
            let node = ResolvedNode {
                document_id: root.document_id,
                schema,
            };
            let merged = MergedSchema::merge(&resolver, node)?;
            let mut fields = Vec::new();
            let mut ancestors = vec![merged.origin.schema];

            match merged.keyword("type") {
                Some(Value::String(t)) if t != "object" => {
                    fields.push(merged.field(&resolver, name.clone(), None)?);
                }
                Some(Value::Array(_)) => {
                    fields.push(merged.field(&resolver, name.clone(), None)?);
                }
                _ => collect_fields(&resolver, &merged, name, None, &mut ancestors, &mut fields)?,
            }

            sections.push(Section {
                name: name.clone(),
                description: merged
                    .keyword("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                fields,
            });
        }

        tracing::debug!(sections = sections.len(), "built form outline");
        Ok(Self { sections })
    }

    /// Every field key of every section.
    pub fn keys(&self) -> Vec<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.fields.iter().map(|f| f.key.as_str()))
            .collect()
    }
}

/// Flatten the properties of an object schema into fields.
fn collect_fields<'a>(
    resolver: &TypeResolver<'a>,
    merged: &MergedSchema<'a>,
    prefix: &str,
    group: Option<&str>,
    ancestors: &mut Vec<&'a Value>,
    fields: &mut Vec<Field>,
) -> Result<(), SchemaError> {
    for (name, node) in &merged.properties {
        let key = format!("{prefix}.{name}");
        let child = MergedSchema::merge(resolver, *node)?;

        let recursive = ancestors
            .iter()
            .any(|seen| std::ptr::eq(*seen, child.origin.schema));
        if child.is_object() && !recursive {
            ancestors.push(child.origin.schema);
            collect_fields(resolver, &child, &key, Some(name), ancestors, fields)?;
            ancestors.pop();
        } else {
            fields.push(child.field(resolver, key, group.map(str::to_string))?);
        }
    }
    Ok(())
}

/// A schema node with its `allOf` branches folded in.
struct MergedSchema<'a> {
    /// The dereferenced schema this was merged from.
    origin: ResolvedNode<'a>,
    /// Merged properties, first declaration order, later definitions win.
    properties: Vec<(String, ResolvedNode<'a>)>,
    /// Every other keyword with the document it came from.
    keywords: Vec<(String, ResolvedNode<'a>)>,
}

impl<'a> MergedSchema<'a> {
    fn merge(resolver: &TypeResolver<'a>, node: ResolvedNode<'a>) -> Result<Self, SchemaError> {
        let node = resolver.dereference(node)?;
        let mut merged = Self {
            origin: node,
            properties: Vec::new(),
            keywords: Vec::new(),
        };
        let mut seen = Vec::new();
        merged.absorb(resolver, node, &mut seen)?;
        Ok(merged)
    }

    fn absorb(
        &mut self,
        resolver: &TypeResolver<'a>,
        node: ResolvedNode<'a>,
        seen: &mut Vec<&'a Value>,
    ) -> Result<(), SchemaError> {
        let node = resolver.dereference(node)?;
        let Some(object) = node.schema.as_object() else {
            return Ok(());
        };
        if seen.iter().any(|s| std::ptr::eq(*s, node.schema)) {
            return Ok(());
        }
        seen.push(node.schema);

        for (key, value) in object {
            let entry = ResolvedNode {
                document_id: node.document_id,
                schema: value,
            };
            match key.as_str() {
                "allOf" => {}
                "properties" => {
                    for (name, schema) in value.as_object().into_iter().flatten() {
                        let prop = ResolvedNode {
                            document_id: node.document_id,
                            schema,
                        };
                        upsert(&mut self.properties, name, prop);
                    }
                }
                _ => upsert(&mut self.keywords, key, entry),
            }
        }

        for branch in object.get("allOf").and_then(Value::as_array).into_iter().flatten() {
            let branch = ResolvedNode {
                document_id: node.document_id,
                schema: branch,
            };
            self.absorb(resolver, branch, seen)?;
        }
        Ok(())
    }

    fn keyword(&self, name: &str) -> Option<&'a Value> {
        self.keywords
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, node)| node.schema)
    }

    fn keyword_node(&self, name: &str) -> Option<ResolvedNode<'a>> {
        self.keywords.iter().find(|(k, _)| k == name).map(|(_, node)| *node)
    }

    /// Declared `type: object`, or no type at all but some properties.
    fn is_object(&self) -> bool {
        match self.keyword("type") {
            Some(Value::String(t)) => t == "object",
            Some(_) => false,
            None => !self.properties.is_empty(),
        }
    }

    /// Type of the merged schema: `oneOf`/`anyOf` branches unioned, else
    /// the declared `type`, else object when properties exist.
    fn kinds(&self, resolver: &TypeResolver<'a>) -> Result<ResolvedType, SchemaError> {
        let mut kinds = Vec::new();
        let mut composed = false;
        for keyword in ["oneOf", "anyOf"] {
            let Some(node) = self.keyword_node(keyword) else {
                continue;
            };
            composed = true;
            for branch in node.schema.as_array().into_iter().flatten() {
                let branch = ResolvedNode {
                    document_id: node.document_id,
                    schema: branch,
                };
                kinds.extend(resolver.type_of(branch)?.kinds());
            }
        }
        if composed {
            return Ok(ResolvedType::union(kinds));
        }

        let mut declared = Map::new();
        if let Some(t) = self.keyword("type") {
            declared.insert("type".to_string(), t.clone());
        } else if !self.properties.is_empty() {
            declared.insert("properties".to_string(), Value::Object(Map::new()));
        }
        Ok(declared_type(&Value::Object(declared)))
    }

    fn field(
        &self,
        resolver: &TypeResolver<'a>,
        key: String,
        group: Option<String>,
    ) -> Result<Field, SchemaError> {
        let kinds = self.kinds(resolver)?;
        let item_kinds = if kinds.contains(JsonKind::Array) {
            let items = match self.keyword_node("items") {
                Some(items) => Some(items),
                None => resolver.item_node(self.origin, 0)?,
            };
            match items {
                Some(items) => Some(resolver.type_of(items)?),
                None => Some(ResolvedType::Unknown),
            }
        } else {
            None
        };

        Ok(Field {
            key,
            group,
            kinds,
            item_kinds,
            default: self.keyword("default").cloned(),
            enum_values: self.keyword("enum").and_then(Value::as_array).cloned(),
            constant: self.keyword("const").cloned(),
            description: self
                .keyword("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

fn upsert<'a>(entries: &mut Vec<(String, ResolvedNode<'a>)>, name: &str, node: ResolvedNode<'a>) {
    match entries.iter_mut().find(|(k, _)| k == name) {
        Some(entry) => entry.1 = node,
        None => entries.push((name.to_string(), node)),
    }
}
