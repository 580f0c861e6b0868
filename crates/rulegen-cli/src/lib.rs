//! # rulegen-cli: Rule File Generator
//!
//! Provides the `rulegen` command-line interface.
//!
//! ## Subcommands
//!
//! - `rulegen generate`: Base document + patch + `--set`/`--unset` edits,
//!   typed by the schema, validated, written as JSON.
//! - `rulegen validate`: Validate an existing document.
//! - `rulegen outline`: List the sections and fields the schema offers.
//! - `rulegen resolve`: Show the type the schema declares at dotted paths.
//!
//! ```bash
//! rulegen generate --schema schemas/game.rule.schema.json \
//!     --sample rules/base.json --patch blitz.yaml \
//!     --set timeSupport.enabled=true --set 'timeSupport.options=[3, 5]' \
//!     --unset tags --output out/blitz.json
//! ```

pub mod config;
pub mod document;
pub mod generate;
pub mod outline;
pub mod resolve;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use rulegen_schema::SchemaRegistry;

/// Load the root schema and its sibling schema files.
pub fn load_registry(schema: &Path) -> Result<SchemaRegistry> {
    let registry = SchemaRegistry::load(schema)
        .with_context(|| format!("failed to load schemas from {}", schema.display()))?;
    tracing::info!(
        root = registry.root_id(),
        schemas = registry.len(),
        "loaded schema registry"
    );
    Ok(registry)
}
