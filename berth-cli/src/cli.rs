//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Berth -- game server container lifecycle manager.
///
/// Use `berth <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "berth", version, about, long_about = None)]
pub struct Cli {
    /// Path to the berth.toml configuration file.
    #[arg(short, long, default_value = "berth.toml")]
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
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new server instance on a free port.
    Create(CreateArgs),

    /// Recreate a container for an existing data directory.
    Recreate(RecreateArgs),

    /// Start an instance (or `*` for all).
    Start(TargetArgs),

    /// Stop an instance (or `*` for all).
    Stop(TargetArgs),

    /// Restart an instance (or `*` for all).
    Restart(TargetArgs),

    /// Remove an instance's container, keeping its data (or `*` for all).
    Remove(TargetArgs),

    /// List managed containers.
    List,

    /// Show ONLINE/OFFLINE for one instance.
    Status(StatusArgs),

    /// Read commands line by line from stdin.
    Console(ConsoleArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- create / recreate ----

/// Parameters shared by create and recreate.
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Server software (paper, vanilla, forge, ...).
    pub platform: String,

    /// Server version.
    pub version: String,

    /// Memory hint in megabytes.
    pub memory: Option<u32>,

    /// Extra environment, `KEY=VALUE` entries separated by `;`.
    pub flags: Option<String>,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[command(flatten)]
    pub server: ServerArgs,
}

#[derive(Args, Debug)]
pub struct RecreateArgs {
    /// Instance id (UUID) of an existing data directory.
    pub instance_id: String,

    #[command(flatten)]
    pub server: ServerArgs,
}

// ---- start / stop / restart / remove ----

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Container name, bare instance id, or `*`.
    pub name: String,
}

// ---- status ----

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Container name or bare instance id.
    pub name: String,
}

// ---- console ----

#[derive(Args, Debug)]
pub struct ConsoleArgs {
    /// Do not print the prompt (useful when piping commands in).
    #[arg(long)]
    pub no_prompt: bool,
}

// ---- config ----

/// Manage configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file.
    Validate,
    /// Show the effective configuration.
    Show {
        /// Show only one section (general, manager).
        #[arg(long)]
        section: Option<String>,
    },
}
