//! toml-schema CLI
//!
//! Validates a TOML document against a schema file.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use toml_schema::{from_file, read_document, LoadError, Settings};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "toml-schema", version)]
#[command(about = "Validate a TOML document against a TOML schema")]
struct Cli {
    /// Schema file
    schema_file: PathBuf,

    /// TOML document to validate
    toml_file: PathBuf,

    /// Settings file (defaults: ./toml-schema.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print errors as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load_from(cli.config.as_deref())
        .with_context(|| "Error loading settings")
    {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli, &settings) {
        Ok(()) => {
            println!("TOML schema validated.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            if cli.json {
                eprintln!("{}", error_json(&e));
            } else {
                eprintln!("{e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, settings: &Settings) -> Result<(), LoadError> {
    let schema = from_file(&cli.schema_file)?;
    let document = read_document(&cli.toml_file)?;
    tracing::debug!(
        schema = %cli.schema_file.display(),
        document = %cli.toml_file.display(),
        "validating"
    );
    schema.validate_with(&document, &settings.validate_options())?;
    Ok(())
}

fn error_json(error: &LoadError) -> serde_json::Value {
    match error {
        LoadError::Schema(e) => json!({
            "error": e.to_string(),
            "kind": e.kind,
            "location": e.location,
            "message": e.message,
        }),
        other => json!({
            "error": other.to_string(),
            "kind": "load",
            "message": other.detail(),
        }),
    }
}
