//! # Resolve Subcommand
//!
//! Prints the type the schema declares at each dotted path, which is the
//! type a `--set` at that path is converted to.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rulegen_core::{JsonKind, PathExpression, ResolvedType};
use rulegen_schema::TypeResolver;

use crate::load_registry;

/// Arguments for the resolve subcommand.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Root schema file.
    #[arg(long)]
    pub schema: PathBuf,

    /// Dotted paths such as `players.seats[0].color`.
    #[arg(required = true)]
    pub paths: Vec<String>,
}

/// Execute the resolve subcommand. Exits 1 if any path fails to resolve.
pub fn run_resolve(args: &ResolveArgs) -> Result<u8> {
    let registry = load_registry(&args.schema)?;
    let resolver = TypeResolver::new(&registry);

    let mut failures = 0;
    for text in &args.paths {
        match describe(&resolver, text) {
            Ok(line) => println!("{text}: {line}"),
            Err(e) => {
                failures += 1;
                println!("{text}: error: {e:#}");
            }
        }
    }
    Ok(u8::from(failures > 0))
}

fn describe(resolver: &TypeResolver<'_>, text: &str) -> Result<String> {
    let path = PathExpression::parse(text)?;
    let resolved = resolver.resolve_type(&path)?;
    if resolved.contains(JsonKind::Array) {
        let items = resolver.resolve_item_type(&path)?;
        if items != ResolvedType::Unknown {
            return Ok(format!("{resolved} (items: {items})"));
        }
    }
    Ok(resolved.to_string())
}
