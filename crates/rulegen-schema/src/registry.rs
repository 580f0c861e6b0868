//! # Schema Registry
//!
//! Loads every `*.json` file that sits next to the root schema and indexes
//! each one by identifier, so that `$ref`s between sibling files resolve
//! without touching the filesystem again.
//!
//! ## Identifiers
//!
//! A schema is registered under its `$id` when it declares one, otherwise
//! under `file://<canonical path>`. Every schema is additionally reachable
//! by its bare file name (`time.schema.json`), and the root schema by the
//! sentinel [`ROOT_SENTINEL`].
//!
//! ## Reference Lookup
//!
//! The identifier part of a `$ref` is matched in this order:
//!
//! 1. empty or `"."`: the document containing the reference (the root,
//!    for [`SchemaRegistry::resolve_reference`]),
//! 2. exact identifier,
//! 3. file name alias,
//! 4. last URI segment of a registered identifier or alias.
//!
//! The pointer part is a JSON Pointer walked through object keys and array
//! positions.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::SchemaError;

/// Key under which the root schema is always reachable.
pub const ROOT_SENTINEL: &str = ".";

static NULL_SCHEMA: Value = Value::Null;

/// All schema documents of one schema directory, indexed by identifier.
///
/// Immutable after construction. One registry belongs to one root schema;
/// registries for different roots share nothing.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    /// Directory the schemas were loaded from (empty for in-memory registries).
    schema_dir: PathBuf,
    /// Identifier of the root schema.
    root_id: String,
    /// Map from identifier to parsed schema document.
    documents: BTreeMap<String, Value>,
    /// Map from file name (e.g. `time.schema.json`) to identifier.
    filename_to_id: HashMap<String, String>,
}

impl SchemaRegistry {
    /// Load the root schema and every sibling `*.json` file.
    ///
    /// The directory is taken from `root_schema_path` itself; the process
    /// working directory is neither consulted nor changed.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::SchemaLoad`] if the root schema or its
    /// directory cannot be read, if any sibling file is not valid JSON, or
    /// if two files declare the same identifier.
    pub fn load(root_schema_path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let root_path = root_schema_path.as_ref();
        let root_canonical =
            std::fs::canonicalize(root_path).map_err(|e| SchemaError::SchemaLoad {
                schema: root_path.display().to_string(),
                reason: format!("cannot read root schema: {e}"),
            })?;
        let schema_dir = root_canonical
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| SchemaError::SchemaLoad {
                schema: root_path.display().to_string(),
                reason: "root schema has no parent directory".to_string(),
            })?;

        let entries = std::fs::read_dir(&schema_dir).map_err(|e| SchemaError::SchemaLoad {
            schema: schema_dir.display().to_string(),
            reason: format!("cannot read schema directory: {e}"),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        if !paths.contains(&root_canonical) {
            // A root without the `.json` extension is still the root.
            paths.push(root_canonical.clone());
        }
        paths.sort();

        let mut registry = Self {
            schema_dir,
            root_id: String::new(),
            documents: BTreeMap::new(),
            filename_to_id: HashMap::new(),
        };

        for path in &paths {
            let id = registry.load_file(path)?;
            if *path == root_canonical {
                registry.root_id = id;
            }
        }

        tracing::debug!(
            schema_dir = %registry.schema_dir.display(),
            root = %registry.root_id,
            count = registry.documents.len(),
            "loaded schema registry"
        );

        Ok(registry)
    }

    /// Read, parse, and register one schema file. Returns its identifier.
    fn load_file(&mut self, path: &Path) -> Result<String, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::SchemaLoad {
            schema: path.display().to_string(),
            reason: format!("cannot read file: {e}"),
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|e| SchemaError::SchemaLoad {
            schema: path.display().to_string(),
            reason: format!("invalid JSON: {e}"),
        })?;

        let id = match value.get("$id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => format!("file://{}", path.display()),
        };

        if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
            self.filename_to_id.insert(filename.to_string(), id.clone());
        }
        self.insert(id.clone(), value)?;
        tracing::trace!(schema = %id, path = %path.display(), "registered schema");
        Ok(id)
    }

    fn insert(&mut self, id: String, value: Value) -> Result<(), SchemaError> {
        if self.documents.contains_key(&id) {
            return Err(SchemaError::SchemaLoad {
                schema: id,
                reason: "identifier is declared by more than one schema".to_string(),
            });
        }
        self.documents.insert(id, value);
        Ok(())
    }

    /// Build a registry from in-memory documents.
    ///
    /// Documents are keyed by the identifiers given; identifiers ending in
    /// `.json` are also reachable by their last path segment.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::SchemaLoad`] on a duplicate identifier or if
    /// `root_id` is not among the documents.
    pub fn from_documents<I>(root_id: impl Into<String>, documents: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let root_id = root_id.into();
        let mut registry = Self {
            schema_dir: PathBuf::new(),
            root_id: root_id.clone(),
            documents: BTreeMap::new(),
            filename_to_id: HashMap::new(),
        };
        for (id, value) in documents {
            if id.ends_with(".json") {
                let tail = last_segment(&id).to_string();
                registry.filename_to_id.insert(tail, id.clone());
            }
            registry.insert(id, value)?;
        }
        if !registry.documents.contains_key(&root_id) {
            return Err(SchemaError::SchemaLoad {
                schema: root_id,
                reason: "root schema not found".to_string(),
            });
        }
        Ok(registry)
    }

    /// Returns the directory the schemas were loaded from.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Identifier of the root schema.
    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// The root schema document.
    pub fn root(&self) -> &Value {
        // `root_id` is checked against `documents` at construction.
        self.documents.get(&self.root_id).unwrap_or(&NULL_SCHEMA)
    }

    /// Look up a document by identifier, alias, or [`ROOT_SENTINEL`].
    pub fn get(&self, identifier: &str) -> Option<&Value> {
        self.lookup_id(identifier).and_then(|id| self.documents.get(id))
    }

    /// All registered identifiers, sorted.
    pub fn ids(&self) -> Vec<&str> {
        self.documents.keys().map(String::as_str).collect()
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True if no schemas are registered.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterate over `(identifier, document)` pairs.
    pub fn documents(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.documents.iter().map(|(id, v)| (id.as_str(), v))
    }

    /// Iterate over `(file name, identifier)` aliases.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filename_to_id
            .iter()
            .map(|(name, id)| (name.as_str(), id.as_str()))
    }

    /// Map an identifier as written in a `$ref` to a registered identifier.
    pub fn lookup_id(&self, identifier: &str) -> Option<&str> {
        if identifier.is_empty() || identifier == ROOT_SENTINEL {
            return Some(&self.root_id);
        }
        if let Some((id, _)) = self.documents.get_key_value(identifier) {
            return Some(id);
        }
        if let Some(id) = self.filename_to_id.get(identifier) {
            return Some(id);
        }
        let tail = last_segment(identifier);
        if let Some(id) = self.filename_to_id.get(tail) {
            return Some(id);
        }
        self.documents
            .keys()
            .find(|id| last_segment(id) == tail)
            .map(String::as_str)
    }

    /// Resolve `<identifierOrEmpty>#<pointer>` with an empty identifier
    /// meaning the root schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Reference`] if the identifier is not
    /// registered or a pointer segment is missing.
    pub fn resolve_reference(&self, reference: &str) -> Result<&Value, SchemaError> {
        self.resolve_reference_from(&self.root_id, reference)
            .map(|(_, fragment)| fragment)
    }

    /// Resolve a reference found inside the document `base_id`.
    ///
    /// An empty identifier refers to `base_id` itself. Returns the
    /// identifier of the document the fragment lives in together with the
    /// fragment, so that references nested inside it can in turn be
    /// resolved relative to the right document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Reference`] if the identifier is not
    /// registered or a pointer segment is missing.
    pub fn resolve_reference_from<'a>(
        &'a self,
        base_id: &str,
        reference: &str,
    ) -> Result<(&'a str, &'a Value), SchemaError> {
        let (identifier, pointer) = reference.split_once('#').unwrap_or((reference, ""));
        let target = if identifier.is_empty() { base_id } else { identifier };

        let (doc_id, document) = self
            .lookup_id(target)
            .and_then(|id| self.documents.get_key_value(id))
            .ok_or_else(|| SchemaError::Reference {
                reference: reference.to_string(),
                reason: format!("schema '{target}' is not registered"),
            })?;

        let fragment = walk_pointer(document, pointer).map_err(|reason| SchemaError::Reference {
            reference: reference.to_string(),
            reason,
        })?;

        Ok((doc_id.as_str(), fragment))
    }
}

/// Walk a JSON Pointer (`/a/b/0`) through a document.
fn walk_pointer<'a>(document: &'a Value, pointer: &str) -> Result<&'a Value, String> {
    if pointer.is_empty() {
        return Ok(document);
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(format!("unsupported fragment '#{pointer}' (expected a JSON Pointer)"));
    };

    let mut current = document;
    for raw in rest.split('/') {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
        .ok_or_else(|| format!("pointer segment '{segment}' not found"))?;
    }
    Ok(current)
}

/// The part of a URI or path after the last `/`.
fn last_segment(identifier: &str) -> &str {
    identifier
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(identifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_documents(
            "root.json",
            vec![
                (
                    "root.json".to_string(),
                    json!({
                        "$defs": {"a/b": {"type": "string"}, "tilde~": {"type": "integer"}},
                        "properties": {"mode": {"$ref": "child#"}},
                        "oneOf": [{"type": "null"}, {"type": "boolean"}]
                    }),
                ),
                (
                    "child".to_string(),
                    json!({"$id": "child", "type": "string", "enum": ["x", "y"]}),
                ),
                (
                    "https://example.org/schemas/limits.json".to_string(),
                    json!({"$defs": {"max": {"type": "integer"}}}),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn empty_identifier_resolves_against_root() {
        let reg = registry();
        let v = reg.resolve_reference("#/properties/mode").unwrap();
        assert_eq!(v, &json!({"$ref": "child#"}));
    }

    #[test]
    fn whole_document_reference() {
        let reg = registry();
        assert_eq!(reg.resolve_reference("child#").unwrap()["type"], "string");
        assert_eq!(reg.resolve_reference("child").unwrap()["type"], "string");
    }

    #[test]
    fn pointer_segments_are_unescaped() {
        let reg = registry();
        assert_eq!(reg.resolve_reference("#/$defs/a~1b").unwrap()["type"], "string");
        assert_eq!(reg.resolve_reference("#/$defs/tilde~0").unwrap()["type"], "integer");
    }

    #[test]
    fn pointer_walks_array_positions() {
        let reg = registry();
        assert_eq!(reg.resolve_reference("#/oneOf/1").unwrap()["type"], "boolean");
    }

    #[test]
    fn lookup_by_file_name_and_last_segment() {
        let reg = registry();
        assert_eq!(
            reg.resolve_reference("limits.json#/$defs/max").unwrap()["type"],
            "integer"
        );
        assert_eq!(
            reg.resolve_reference("https://other.host/limits.json#/$defs/max")
                .unwrap()["type"],
            "integer"
        );
    }

    #[test]
    fn relative_reference_uses_base_document() {
        let reg = registry();
        let (doc, v) = reg
            .resolve_reference_from("https://example.org/schemas/limits.json", "#/$defs/max")
            .unwrap();
        assert_eq!(doc, "https://example.org/schemas/limits.json");
        assert_eq!(v["type"], "integer");
    }

    #[test]
    fn unknown_identifier_is_reference_error() {
        let reg = registry();
        let err = reg.resolve_reference("missing.json#/a").unwrap_err();
        assert!(matches!(err, SchemaError::Reference { .. }), "got {err}");
    }

    #[test]
    fn missing_pointer_segment_is_reference_error() {
        let reg = registry();
        let err = reg.resolve_reference("#/$defs/nope").unwrap_err();
        match err {
            SchemaError::Reference { reason, .. } => assert!(reason.contains("nope")),
            other => panic!("expected Reference, got {other}"),
        }
    }

    #[test]
    fn anchor_fragment_is_rejected() {
        let reg = registry();
        assert!(reg.resolve_reference("#anchor").is_err());
    }

    #[test]
    fn root_reachable_under_sentinel() {
        let reg = registry();
        assert_eq!(reg.get(ROOT_SENTINEL), Some(reg.root()));
        assert_eq!(reg.root_id(), "root.json");
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn from_documents_requires_root() {
        let err = SchemaRegistry::from_documents("nope", vec![("a".to_string(), json!({}))])
            .unwrap_err();
        assert!(matches!(err, SchemaError::SchemaLoad { .. }));
    }

    #[test]
    fn load_reads_all_siblings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("root.json"),
            r#"{"properties": {"mode": {"$ref": "child#"}}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("child.json"), r#"{"$id": "child", "type": "string"}"#)
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a schema").unwrap();

        let reg = SchemaRegistry::load(dir.path().join("root.json")).unwrap();
        assert_eq!(reg.len(), 2);
        assert!(reg.root_id().starts_with("file://"));
        assert!(reg.root_id().ends_with("root.json"));
        assert!(reg.get("child").is_some());
        assert!(reg.get("child.json").is_some());
        assert_eq!(reg.resolve_reference("child#").unwrap()["type"], "string");
    }

    #[test]
    fn load_rejects_invalid_sibling() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("root.json"), "{}").unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let err = SchemaRegistry::load(dir.path().join("root.json")).unwrap_err();
        match err {
            SchemaError::SchemaLoad { schema, reason } => {
                assert!(schema.ends_with("broken.json"));
                assert!(reason.contains("invalid JSON"));
            }
            other => panic!("expected SchemaLoad, got {other}"),
        }
    }

    #[test]
    fn load_rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"$id": "same"}"#).unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{"$id": "same"}"#).unwrap();
        let err = SchemaRegistry::load(dir.path().join("a.json")).unwrap_err();
        assert!(matches!(err, SchemaError::SchemaLoad { .. }));
    }

    #[test]
    fn load_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = SchemaRegistry::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SchemaError::SchemaLoad { .. }));
    }
}
