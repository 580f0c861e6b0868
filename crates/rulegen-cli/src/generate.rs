//! # Generate Subcommand
//!
//! Builds a rule file from a base document:
//!
//! 1. deep-merge the `--patch` document, if any;
//! 2. apply each `--set path=value`, typed by the schema;
//! 3. apply each `--unset path`;
//! 4. validate the result against the root schema and write it.
//!
//! Malformed `--set`/`--unset` arguments are rejected before any file is
//! read. Schema, path, and conversion errors abort before anything is
//! written. Validation failures follow the [`ValidationPolicy`].

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use rulegen_engine::{MutationOp, RuleEngine};
use rulegen_schema::{SchemaValidator, ValidationError};
use serde_json::Value;

use crate::config::{RulegenConfig, ValidationPolicy};
use crate::document::{load_document, write_document};
use crate::load_registry;
use crate::validate::report_violations;

/// Arguments for the generate subcommand.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Root schema file; sibling `*.json` files are loaded for `$ref`s.
    #[arg(long)]
    pub schema: PathBuf,

    /// Base document to start from (JSON, or YAML by extension).
    #[arg(long)]
    pub sample: PathBuf,

    /// Patch object deep-merged into the base before any --set.
    #[arg(long)]
    pub patch: Option<PathBuf>,

    /// Assignment `path=value`; the value is converted per the schema type.
    /// Repeatable, applied in order.
    #[arg(long = "set", value_name = "PATH=VALUE")]
    pub sets: Vec<String>,

    /// Path to remove after all assignments. Repeatable.
    #[arg(long = "unset", value_name = "PATH")]
    pub unsets: Vec<String>,

    /// Where to write the generated document.
    #[arg(long, short)]
    pub output: PathBuf,

    /// Override the configured validation policy.
    #[arg(long, value_enum)]
    pub on_invalid: Option<ValidationPolicy>,
}

/// Execute the generate subcommand.
pub fn run_generate(args: &GenerateArgs, config: &RulegenConfig) -> Result<u8> {
    let mut edits = Vec::with_capacity(args.sets.len() + args.unsets.len());
    for entry in &args.sets {
        let op = MutationOp::parse_set(entry)
            .with_context(|| format!("invalid --set '{entry}'"))?;
        edits.push(op);
    }
    for entry in &args.unsets {
        let op = MutationOp::parse_unset(entry)
            .with_context(|| format!("invalid --unset '{entry}'"))?;
        edits.push(op);
    }

    let registry = load_registry(&args.schema)?;
    let engine = RuleEngine::new(&registry);

    let mut document = load_document(&args.sample)?;
    let mut ops = Vec::with_capacity(edits.len() + 1);
    if let Some(patch_path) = &args.patch {
        match load_document(patch_path)? {
            Value::Object(patch) => ops.push(MutationOp::Merge(patch)),
            other => bail!(
                "patch {} must be an object, found {}",
                patch_path.display(),
                rulegen_core::JsonKind::of(&other)
            ),
        }
    }
    ops.extend(edits);

    let applied = engine.apply_all(&mut document, ops)?;
    tracing::info!(applied, "applied mutations");

    let validator = SchemaValidator::new(&registry)?;
    let policy = args.on_invalid.unwrap_or(config.validation.on_invalid);
    let trailing_newline = config.output.trailing_newline;

    match validator.validate_document(&document) {
        Ok(()) => {
            write_document(&args.output, &document, trailing_newline)?;
            tracing::info!(output = %args.output.display(), "wrote rule file");
            println!("Generated {}", args.output.display());
            Ok(0)
        }
        Err(ValidationError::Failed { violations, .. }) => {
            match policy {
                ValidationPolicy::Advisory => {
                    write_document(&args.output, &document, trailing_newline)?;
                    tracing::warn!(
                        output = %args.output.display(),
                        violations = violations.len(),
                        "wrote rule file that fails validation"
                    );
                }
                ValidationPolicy::Blocking => {
                    tracing::warn!(
                        output = %args.output.display(),
                        violations = violations.len(),
                        "validation failed; rule file not written"
                    );
                }
            }
            report_violations(&args.output, &violations);
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}
