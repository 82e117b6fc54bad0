//! Command surface of the `keygate` binary.
//!
//! Kept in a library so the command handling can be exercised without
//! spawning a process.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use keygate_license::{ValidationEngine, ValidationError, ValidatorConfig};
use serde_json::{Value, json};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Exit status for a valid key.
pub const EXIT_VALID: u8 = 0;
/// Exit status for a rejected key.
pub const EXIT_REJECTED: u8 = 1;
/// Exit status for configuration problems.
pub const EXIT_CONFIG: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "keygate")]
#[command(about = "Validate license keys against issued entitlements")]
pub struct Cli {
    /// Path to the validator config file
    #[arg(short, long, default_value = "license_config.json")]
    pub config: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a key and print the outcome
    Validate {
        /// License key, or `-` to read it from stdin
        key: String,
        /// Evaluate as of this epoch second instead of now
        #[arg(long)]
        at: Option<i64>,
    },
    /// Print the license summary for a valid key
    Info {
        /// License key, or `-` to read it from stdin
        key: String,
        /// Evaluate as of this epoch second instead of now
        #[arg(long)]
        at: Option<i64>,
    },
    /// Print which validation mode is active
    Describe,
}

/// JSON to print and the process exit status.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub body: Value,
    pub exit_code: u8,
}

/// Loads the config file and builds an engine from it.
pub fn build_engine(config_path: &Path) -> Result<ValidationEngine> {
    let config = ValidatorConfig::load(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let engine_config = config
        .into_engine_config()
        .context("failed to prepare license engine")?;
    Ok(ValidationEngine::new(engine_config))
}

/// Returns the key argument, reading stdin when it is `-`.
pub fn resolve_key(arg: &str, mut stdin: impl Read) -> Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut key = String::new();
    stdin
        .read_to_string(&mut key)
        .context("failed to read license key from stdin")?;
    Ok(key)
}

fn evaluation_time(at: Option<i64>) -> Result<DateTime<Utc>> {
    match at {
        None => Ok(Utc::now()),
        Some(secs) => {
            DateTime::from_timestamp(secs, 0).ok_or_else(|| anyhow!("--at {secs} is out of range"))
        }
    }
}

fn rejection(err: &ValidationError) -> Report {
    let exit_code = if err.is_configuration_error() {
        EXIT_CONFIG
    } else {
        EXIT_REJECTED
    };
    Report {
        body: json!({
            "valid": false,
            "kind": err.kind(),
            "message": err.to_string(),
        }),
        exit_code,
    }
}

/// Runs one command against `engine`. `key` is the resolved key for the
/// commands that take one.
pub fn execute(engine: &ValidationEngine, command: &Command, key: Option<&str>) -> Result<Report> {
    match command {
        Command::Describe => Ok(Report {
            body: serde_json::to_value(engine.describe_config())?,
            exit_code: EXIT_VALID,
        }),
        Command::Validate { at, .. } => {
            let now = evaluation_time(*at)?;
            let key = key.unwrap_or_default();
            match engine.license_info(key, now) {
                Ok(summary) => Ok(Report {
                    body: json!({ "valid": true, "summary": summary }),
                    exit_code: EXIT_VALID,
                }),
                Err(err) => Ok(rejection(&err)),
            }
        }
        Command::Info { at, .. } => {
            let now = evaluation_time(*at)?;
            let key = key.unwrap_or_default();
            match engine.license_info(key, now) {
                Ok(summary) => Ok(Report {
                    body: serde_json::to_value(summary)?,
                    exit_code: EXIT_VALID,
                }),
                Err(err) => Ok(rejection(&err)),
            }
        }
    }
}
