//! Command-line surface: `--config`, `--log-level`, `--port`, and a
//! `validate-config` subcommand that type-checks configuration without
//! starting the server (fail fast in CI).

use clap::{Parser, Subcommand};

/// HEC-compatible ingestion endpoint for the Telhawk SIEM data plane.
#[derive(Parser, Debug)]
#[command(name = "ingest-server")]
#[command(version)]
pub struct Cli {
    /// Configuration file path (TOML or YAML).
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Override `server.port` from the command line.
    #[arg(long)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load and type-check configuration, then exit without starting the server.
    ValidateConfig,
}
