//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's
//! derive macros. It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Routepost -- nginx proxy route manager for LLM backends.
///
/// Use `routepost <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "routepost", version, about, long_about = None)]
pub struct Cli {
    /// Path to the routepost.toml configuration file.
    #[arg(short, long, default_value = "routepost.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a proxy rule and reload nginx.
    Add(AddArgs),

    /// Remove a proxy rule and reload nginx.
    Remove(RemoveArgs),

    /// List all user-managed proxy rules.
    List,

    /// Show container status, rule count and config validity.
    Status,

    /// Validate and reload the nginx configuration.
    Reload,

    /// Show nginx container logs.
    Logs(LogsArgs),
}

// ---- add ----

/// Add a new proxy rule.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Local endpoint path (e.g. /claude).
    #[arg(short, long)]
    pub endpoint: String,

    /// Target base URL (e.g. https://api.anthropic.com).
    #[arg(short, long)]
    pub target: String,

    /// Optional display name for the rule.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Add even when a rule for this endpoint already exists.
    #[arg(long)]
    pub force: bool,
}

// ---- remove ----

/// Remove an existing proxy rule.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Endpoint to remove (e.g. /claude).
    #[arg(short, long)]
    pub endpoint: String,

    /// Remove without the confirmation prompt.
    #[arg(long)]
    pub force: bool,
}

// ---- logs ----

/// Show container log tail.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Number of log lines to show.
    #[arg(long, default_value_t = 50)]
    pub tail: u32,
}
