//! # Validate Subcommand
//!
//! Validates an existing rule document against the root schema and prints
//! every violation.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use rulegen_schema::{SchemaValidator, ValidationError, ValidationViolations};

use crate::document::load_document;
use crate::load_registry;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Root schema file; sibling `*.json` files are loaded for `$ref`s.
    #[arg(long)]
    pub schema: PathBuf,

    /// Document to validate (JSON, or YAML by extension).
    pub document: PathBuf,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let registry = load_registry(&args.schema)?;
    let validator = SchemaValidator::new(&registry)?;
    let document = load_document(&args.document)?;

    match validator.validate_document(&document) {
        Ok(()) => {
            println!("OK: {}", args.document.display());
            Ok(0)
        }
        Err(ValidationError::Failed { violations, .. }) => {
            report_violations(&args.document, &violations);
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}

/// Print a failure header and one line per violation.
pub fn report_violations(path: &Path, violations: &ValidationViolations) {
    println!(
        "FAIL: {} ({} violation{})",
        path.display(),
        violations.len(),
        if violations.len() == 1 { "" } else { "s" }
    );
    for violation in violations.violations() {
        println!("{violation}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_schema(dir: &Path) -> PathBuf {
        let path = dir.join("root.json");
        std::fs::write(
            &path,
            r#"{"type": "object", "properties": {"n": {"type": "integer"}}, "required": ["n"]}"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn valid_document_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write_schema(dir.path());
        let document = dir.path().join("doc.yaml");
        std::fs::write(&document, "n: 3\n").unwrap();
        let code = run_validate(&ValidateArgs { schema, document }).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn invalid_document_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write_schema(dir.path());
        let document = dir.path().join("doc.yml");
        std::fs::write(&document, "n: three\n").unwrap();
        let code = run_validate(&ValidateArgs { schema, document }).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn unreadable_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write_schema(dir.path());
        let document = dir.path().join("missing.json");
        assert!(run_validate(&ValidateArgs { schema, document }).is_err());
    }
}
