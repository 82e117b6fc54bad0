//! keygate license validator
//!
//! Usage:
//!   keygate --config license_config.json validate <KEY>
//!   keygate info <KEY> --at 1767225600
//!   keygate describe
//!
//! Results go to stdout as JSON; logs go to stderr.

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use keygate_cli::{Cli, Command, EXIT_CONFIG, build_engine, execute, resolve_key};
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_CONFIG)
        }
    }
}

fn run(cli: &Cli) -> Result<u8> {
    let engine = build_engine(&cli.config)?;
    debug!(config = %cli.config.display(), "engine ready");

    let key = match &cli.command {
        Command::Validate { key, .. } | Command::Info { key, .. } => {
            Some(resolve_key(key, io::stdin().lock())?)
        }
        Command::Describe => None,
    };

    let report = execute(&engine, &cli.command, key.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&report.body)?);
    Ok(report.exit_code)
}
