//! Integration test: load the game rule schemas under `schemas/` and check
//! that path resolution, the form outline, and validation agree on them.
//!
//! The fixture set mixes `$id`-identified files with one that
//! has no `$id` (`time.schema.json`), cross-file references with relative
//! ones inside a sibling, and `oneOf`/`anyOf`/`type`-array unions.

use rulegen_core::{JsonKind, PathExpression, ResolvedType};
use rulegen_schema::{
    FormOutline, SchemaRegistry, SchemaValidator, TypeResolver, ValidationError,
};
use std::path::PathBuf;

/// Find the repository root.
fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

fn root_schema() -> PathBuf {
    repo_root().join("schemas").join("game.rule.schema.json")
}

fn base_rule() -> serde_json::Value {
    let text = std::fs::read_to_string(repo_root().join("rules").join("base.json"))
        .expect("Failed to read rules/base.json");
    serde_json::from_str(&text).expect("rules/base.json is not valid JSON")
}

fn resolve(registry: &SchemaRegistry, path: &str) -> ResolvedType {
    TypeResolver::new(registry)
        .resolve_type(&PathExpression::parse(path).unwrap())
        .unwrap_or_else(|e| panic!("failed to resolve {path}: {e}"))
}

#[test]
fn test_load_all_fixture_schemas() {
    let registry = SchemaRegistry::load(root_schema()).expect("Failed to load schemas");
    assert_eq!(registry.len(), 5, "ids: {:?}", registry.ids());
    assert_eq!(
        registry.root_id(),
        "https://rules.pitpal.example/schemas/game.rule.schema.json"
    );
    assert!(registry.get("time.schema.json").is_some());
}

#[test]
fn test_resolve_fixture_paths() {
    let registry = SchemaRegistry::load(root_schema()).unwrap();

    let expectations = [
        ("name", ResolvedType::Single(JsonKind::String)),
        ("variant", ResolvedType::Single(JsonKind::String)),
        ("players.min", ResolvedType::Single(JsonKind::Integer)),
        ("players.seats", ResolvedType::Single(JsonKind::Array)),
        ("players.seats[0].color", ResolvedType::Single(JsonKind::String)),
        (
            "players.seats[3].handicap",
            ResolvedType::union([JsonKind::Integer, JsonKind::Null]),
        ),
        ("timeSupport.enabled", ResolvedType::Single(JsonKind::Boolean)),
        ("timeSupport.options[0]", ResolvedType::Single(JsonKind::Integer)),
        (
            "timeSupport.increment",
            ResolvedType::union([JsonKind::Integer, JsonKind::Null]),
        ),
        ("timeSupport.mode", ResolvedType::Single(JsonKind::String)),
        ("scoring", ResolvedType::union([JsonKind::Object])),
        ("tags", ResolvedType::union([JsonKind::Array, JsonKind::Null])),
        ("tags[0]", ResolvedType::Single(JsonKind::String)),
        ("debugMode", ResolvedType::Single(JsonKind::Boolean)),
    ];

    for (path, expected) in expectations {
        assert_eq!(resolve(&registry, path), expected, "path {path}");
    }
}

#[test]
fn test_base_rule_validates() {
    let registry = SchemaRegistry::load(root_schema()).unwrap();
    let validator = SchemaValidator::new(&registry).expect("Failed to compile root schema");
    validator.validate_document(&base_rule()).unwrap();
}

#[test]
fn test_cross_file_violations_are_reported() {
    let registry = SchemaRegistry::load(root_schema()).unwrap();
    let validator = SchemaValidator::new(&registry).unwrap();

    let mut doc = base_rule();
    doc["variant"] = serde_json::json!("chaos");
    doc["timeSupport"]["mode"] = serde_json::json!("hourglass");
    doc["players"]["seats"][0]["color"] = serde_json::json!(7);

    let err = validator.validate_document(&doc).unwrap_err();
    match err {
        ValidationError::Failed { violations, .. } => {
            let paths: Vec<&str> = violations
                .violations()
                .iter()
                .map(|v| v.instance_path.as_str())
                .collect();
            assert!(paths.contains(&"/variant"), "got {paths:?}");
            assert!(paths.contains(&"/timeSupport/mode"), "got {paths:?}");
            assert!(paths.contains(&"/players/seats/0/color"), "got {paths:?}");
        }
        other => panic!("Expected Failed, got: {other}"),
    }
}

#[test]
fn test_fixture_outline_keys_resolve() {
    let registry = SchemaRegistry::load(root_schema()).unwrap();
    let outline = FormOutline::build(&registry).unwrap();

    let sections: Vec<&str> = outline.sections.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        sections,
        vec!["name", "variant", "players", "timeSupport", "scoring", "tags", "debugMode"]
    );

    let keys = outline.keys();
    assert!(keys.contains(&"scoring.points"));
    assert!(keys.contains(&"scoring.cap"), "keys: {keys:?}");

    // Every outline key is a path the resolver accepts.
    let resolver = TypeResolver::new(&registry);
    for key in outline.keys() {
        let path = PathExpression::parse(key).unwrap();
        resolver
            .resolve_type(&path)
            .unwrap_or_else(|e| panic!("outline key {key} does not resolve: {e}"));
    }
}
