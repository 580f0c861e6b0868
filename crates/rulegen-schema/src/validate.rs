//! # Schema Validation
//!
//! Validation of finished rule documents against the root schema (Draft
//! 2020-12), with every sibling schema of the registry available for
//! cross-file `$ref`s.
//!
//! ## Schema Resolution
//!
//! Registry identifiers may be relative (`"$id": "child"`) while the
//! `jsonschema` crate resolves every reference against an absolute base
//! URI. Before compiling, each registry document is therefore given an
//! absolute `$id`: its own when it has a scheme, else one under
//! `json-schema:///`. Every `$ref` the registry can resolve is rewritten
//! to point at that absolute URI, so relative identifiers, file name
//! references and id-less documents all compile the way
//! [`TypeResolver`](crate::TypeResolver) reads them.
//!
//! The rewritten documents are served by [`LocalSchemaRetriever`]: by
//! absolute URI, by file name, or by the last segment of the URI, with any
//! fragment ignored. Nothing is fetched over the network; a URI that
//! matches no loaded schema fails the build.
//!
//! ## Diagnostics
//!
//! Failures are never collapsed into a boolean. Every violation keeps the
//! JSON Pointer of the offending value, the schema path that rejected it,
//! and the validator's message.

use std::collections::HashMap;
use std::fmt;

use jsonschema::{Retrieve, Uri, Validator};
use serde_json::Value;
use thiserror::Error;

use crate::registry::SchemaRegistry;

/// Base for documents whose identifier has no scheme.
const RELATIVE_BASE: &str = "json-schema:///";

/// Keywords whose values are data, not subschemas.
const DATA_KEYWORDS: [&str; 4] = ["const", "default", "enum", "examples"];

/// Keywords whose values map arbitrary names to subschemas.
const SCHEMA_MAPS: [&str; 5] = [
    "properties",
    "patternProperties",
    "$defs",
    "definitions",
    "dependentSchemas",
];

/// Local retriever that resolves `$ref` URIs to schemas loaded in memory.
struct LocalSchemaRetriever {
    /// Map from absolute URI or file name to schema value.
    schemas_by_uri: HashMap<String, Value>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let base = uri_str.split('#').next().unwrap_or(uri_str);

        if let Some(value) = self.schemas_by_uri.get(base) {
            return Ok(value.clone());
        }

        // Unrewritten relative refs arrive joined onto the referencing
        // schema's base URI; fall back to the final path segment.
        let filename = base.rsplit('/').next().unwrap_or(base);
        if let Some(value) = self.schemas_by_uri.get(filename) {
            return Ok(value.clone());
        }

        Err(format!("schema not found in registry for URI: {uri_str}").into())
    }
}

/// The absolute URI a registry document is compiled under.
fn document_uri(id: &str) -> String {
    let id = id.trim_end_matches('#');
    if has_scheme(id) {
        encode_uri(id, b":/?@!$&'()*+,;=%")
    } else {
        // One path segment, so no dot-segment normalization applies.
        format!("{RELATIVE_BASE}{}", encode_uri(id, b":@!$&'()*+,;="))
    }
}

/// True for `scheme:...` identifiers (RFC 3986 scheme syntax).
fn has_scheme(id: &str) -> bool {
    id.split_once(':').is_some_and(|(scheme, _)| {
        let mut chars = scheme.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Percent-encode every byte that is neither unreserved nor in `keep`.
fn encode_uri(text: &str, keep: &[u8]) -> String {
    let mut encoded = String::with_capacity(text.len());
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) || keep.contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

/// Copy of a registry document with an absolute `$id` and absolute
/// `$ref`s.
fn absolutize(
    registry: &SchemaRegistry,
    uris: &HashMap<&str, String>,
    id: &str,
    document: &Value,
) -> Value {
    let mut document = document.clone();
    rewrite_refs(registry, uris, id, &mut document);
    if let (Value::Object(map), Some(uri)) = (&mut document, uris.get(id)) {
        map.insert("$id".to_string(), Value::String(uri.clone()));
    }
    document
}

fn rewrite_refs(
    registry: &SchemaRegistry,
    uris: &HashMap<&str, String>,
    document_id: &str,
    node: &mut Value,
) {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get_mut("$ref") {
                if let Some(absolute) = absolute_reference(registry, uris, document_id, reference) {
                    *reference = absolute;
                }
            }
            for (key, child) in map.iter_mut() {
                match key.as_str() {
                    "$ref" => {}
                    k if DATA_KEYWORDS.contains(&k) => {}
                    k if SCHEMA_MAPS.contains(&k) => {
                        let Some(entries) = child.as_object_mut() else {
                            continue;
                        };
                        for schema in entries.values_mut() {
                            rewrite_refs(registry, uris, document_id, schema);
                        }
                    }
                    _ => rewrite_refs(registry, uris, document_id, child),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_refs(registry, uris, document_id, item);
            }
        }
        _ => {}
    }
}

/// `reference` pointed at the absolute URI of the document it names.
/// `None` for anchors and identifiers the registry does not know.
fn absolute_reference(
    registry: &SchemaRegistry,
    uris: &HashMap<&str, String>,
    document_id: &str,
    reference: &str,
) -> Option<String> {
    let (identifier, fragment) = reference.split_once('#').unwrap_or((reference, ""));
    if !fragment.is_empty() && !fragment.starts_with('/') {
        return None;
    }
    let target = if identifier.is_empty() {
        document_id
    } else {
        registry.lookup_id(identifier)?
    };
    let uri = uris.get(target)?;
    Some(format!("{uri}#{}", encode_uri(fragment, b":/?@!$&'()*+,;=%")))
}

/// Error during schema validation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The document did not conform to the schema.
    #[error("validation failed against schema '{schema_id}':\n{violations}")]
    Failed {
        /// Identifier of the schema that was validated against.
        schema_id: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The compiled validator could not be built (e.g., invalid schema or
    /// unresolvable external reference).
    #[error("validator build error for schema '{schema_id}': {reason}")]
    Build {
        /// Schema identifier.
        schema_id: String,
        /// Reason the validator could not be built.
        reason: String,
    },
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Human-readable message of every violation, in report order.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl From<Vec<Violation>> for ValidationViolations {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A compiled validator for the root schema of a [`SchemaRegistry`].
///
/// Compiled once at construction; `Send + Sync`.
pub struct SchemaValidator {
    /// Identifier of the root schema.
    schema_id: String,
    /// Compiled Draft 2020-12 validator.
    validator: Validator,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema_id", &self.schema_id)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Compile the registry's root schema.
    ///
    /// Every loaded schema is rewritten onto an absolute base URI and
    /// registered with the retriever under that URI and its file name, so
    /// that cross-schema `$ref`s resolve locally.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Build`] if the schema cannot be compiled.
    pub fn new(registry: &SchemaRegistry) -> Result<Self, ValidationError> {
        let uris: HashMap<&str, String> = registry
            .documents()
            .map(|(id, _)| (id, document_uri(id)))
            .collect();

        let mut absolute: HashMap<&str, Value> = HashMap::new();
        for (id, value) in registry.documents() {
            absolute.insert(id, absolutize(registry, &uris, id, value));
        }

        let mut schemas_by_uri: HashMap<String, Value> = HashMap::new();
        for (id, value) in &absolute {
            if let Some(uri) = uris.get(id) {
                schemas_by_uri.insert(uri.clone(), value.clone());
            }
        }
        for (filename, id) in registry.aliases() {
            if let Some(value) = absolute.get(id) {
                schemas_by_uri.insert(filename.to_string(), value.clone());
            }
        }

        let schema_id = registry.root_id().to_string();
        let root = absolute
            .get(schema_id.as_str())
            .cloned()
            .unwrap_or_else(|| registry.root().clone());
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .with_retriever(LocalSchemaRetriever { schemas_by_uri })
            .build(&root)
            .map_err(|e| ValidationError::Build {
                schema_id: schema_id.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            schema = %schema_id,
            documents = uris.len(),
            "compiled root schema validator"
        );
        Ok(Self {
            schema_id,
            validator,
        })
    }

    /// Identifier of the schema this validator checks against.
    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    /// Validate a finished document.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Failed`] with every violation if the
    /// document does not conform.
    pub fn validate_document(&self, instance: &Value) -> Result<(), ValidationError> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            tracing::debug!(
                schema = %self.schema_id,
                count = violations.len(),
                "document failed validation"
            );
            Err(ValidationError::Failed {
                schema_id: self.schema_id.clone(),
                violations: violations.into(),
            })
        }
    }
}
