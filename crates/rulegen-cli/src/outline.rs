//! # Outline Subcommand
//!
//! Prints the sections and typed fields of the root schema: the keys a
//! `--set` can target, with their defaults and choices.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rulegen_schema::{Field, FormOutline};

use crate::load_registry;

/// Arguments for the outline subcommand.
#[derive(Args, Debug)]
pub struct OutlineArgs {
    /// Root schema file.
    #[arg(long)]
    pub schema: PathBuf,

    /// Emit the outline as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Execute the outline subcommand.
pub fn run_outline(args: &OutlineArgs) -> Result<u8> {
    let registry = load_registry(&args.schema)?;
    let outline = FormOutline::build(&registry)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outline)?);
    } else {
        print!("{}", render_text(&outline));
    }
    Ok(0)
}

/// Plain-text rendering, one line per field.
pub fn render_text(outline: &FormOutline) -> String {
    let mut out = String::new();
    for section in &outline.sections {
        match &section.description {
            Some(description) => {
                let _ = writeln!(out, "[{}] {description}", section.name);
            }
            None => {
                let _ = writeln!(out, "[{}]", section.name);
            }
        }
        for field in &section.fields {
            let _ = writeln!(out, "  {}", render_field(field));
        }
    }
    out
}

fn render_field(field: &Field) -> String {
    let mut line = format!("{:<32} {}", field.key, field.kinds);
    if let Some(items) = &field.item_kinds {
        let _ = write!(line, " of {items}");
    }
    if let Some(constant) = &field.constant {
        let _ = write!(line, "  const={constant}");
    }
    if let Some(default) = &field.default {
        let _ = write!(line, "  default={default}");
    }
    if let Some(choices) = &field.enum_values {
        let choices: Vec<String> = choices.iter().map(ToString::to_string).collect();
        let _ = write!(line, "  one of [{}]", choices.join(", "));
    }
    line.trim_end().to_string()
}
