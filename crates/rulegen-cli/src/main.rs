//! # rulegen CLI entry point
//!
//! Parses command-line arguments, loads the optional configuration file,
//! and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rulegen_cli::config::RulegenConfig;
use rulegen_cli::generate::{run_generate, GenerateArgs};
use rulegen_cli::outline::{run_outline, OutlineArgs};
use rulegen_cli::resolve::{run_resolve, ResolveArgs};
use rulegen_cli::validate::{run_validate, ValidateArgs};

/// Schema-driven rule file generator.
///
/// Starts from a base rule document, applies a patch and typed `--set` /
/// `--unset` edits, validates the result against a JSON Schema, and writes
/// it out.
#[derive(Parser, Debug)]
#[command(name = "rulegen", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a rule file from a base document and edits.
    Generate(GenerateArgs),

    /// Validate a rule document against the schema.
    Validate(ValidateArgs),

    /// List the sections and fields the schema defines.
    Outline(OutlineArgs),

    /// Show the schema type at dotted paths.
    Resolve(ResolveArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("rulegen {} starting", env!("CARGO_PKG_VERSION"));

    let result = RulegenConfig::load(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Generate(args) => run_generate(args, &config),
        Commands::Validate(args) => run_validate(args),
        Commands::Outline(args) => run_outline(args),
        Commands::Resolve(args) => run_resolve(args),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulegen_cli::config::ValidationPolicy;

    #[test]
    fn cli_parse_generate_minimal() {
        let cli = Cli::try_parse_from([
            "rulegen",
            "generate",
            "--schema",
            "schemas/game.rule.schema.json",
            "--sample",
            "rules/base.json",
            "--output",
            "out.json",
        ])
        .unwrap();
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.schema, PathBuf::from("schemas/game.rule.schema.json"));
        assert_eq!(args.sample, PathBuf::from("rules/base.json"));
        assert_eq!(args.output, PathBuf::from("out.json"));
        assert!(args.patch.is_none());
        assert!(args.sets.is_empty());
        assert!(args.unsets.is_empty());
        assert!(args.on_invalid.is_none());
    }

    #[test]
    fn cli_parse_generate_repeated_edits_keep_order() {
        let cli = Cli::try_parse_from([
            "rulegen",
            "generate",
            "--schema",
            "s.json",
            "--sample",
            "b.json",
            "-o",
            "out.json",
            "--patch",
            "p.yaml",
            "--set",
            "b=2",
            "--set",
            "a=1",
            "--unset",
            "c",
            "--unset",
            "d",
            "--on-invalid",
            "blocking",
        ])
        .unwrap();
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.patch, Some(PathBuf::from("p.yaml")));
        assert_eq!(args.sets, vec!["b=2", "a=1"]);
        assert_eq!(args.unsets, vec!["c", "d"]);
        assert_eq!(args.on_invalid, Some(ValidationPolicy::Blocking));
    }

    #[test]
    fn cli_parse_generate_requires_output() {
        let result = Cli::try_parse_from([
            "rulegen", "generate", "--schema", "s.json", "--sample", "b.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_invalid_policy_errors() {
        let result = Cli::try_parse_from([
            "rulegen",
            "generate",
            "--schema",
            "s.json",
            "--sample",
            "b.json",
            "-o",
            "o.json",
            "--on-invalid",
            "sometimes",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_validate() {
        let cli = Cli::try_parse_from(["rulegen", "validate", "--schema", "s.json", "rule.json"])
            .unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.document, PathBuf::from("rule.json"));
    }

    #[test]
    fn cli_parse_outline_json() {
        let cli = Cli::try_parse_from(["rulegen", "outline", "--schema", "s.json", "--json"])
            .unwrap();
        let Commands::Outline(args) = cli.command else {
            panic!("expected outline");
        };
        assert!(args.json);
    }

    #[test]
    fn cli_parse_resolve_requires_a_path() {
        assert!(Cli::try_parse_from(["rulegen", "resolve", "--schema", "s.json"]).is_err());
        let cli = Cli::try_parse_from([
            "rulegen",
            "resolve",
            "--schema",
            "s.json",
            "players.min",
            "tags[0]",
        ])
        .unwrap();
        let Commands::Resolve(args) = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(args.paths, vec!["players.min", "tags[0]"]);
    }

    #[test]
    fn cli_parse_verbose_levels() {
        let cli0 = Cli::try_parse_from(["rulegen", "outline", "--schema", "s.json"]).unwrap();
        assert_eq!(cli0.verbose, 0);

        let cli2 = Cli::try_parse_from(["rulegen", "-vv", "outline", "--schema", "s.json"])
            .unwrap();
        assert_eq!(cli2.verbose, 2);

        let cli3 = Cli::try_parse_from(["rulegen", "outline", "--schema", "s.json", "-vvv"])
            .unwrap();
        assert_eq!(cli3.verbose, 3);
    }

    #[test]
    fn cli_parse_config_option() {
        let cli = Cli::try_parse_from([
            "rulegen",
            "--config",
            "rulegen.yaml",
            "outline",
            "--schema",
            "s.json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("rulegen.yaml")));
    }

    #[test]
    fn cli_parse_no_subcommand_errors() {
        assert!(Cli::try_parse_from(["rulegen"]).is_err());
    }
}
