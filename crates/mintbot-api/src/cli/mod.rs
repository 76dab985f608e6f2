//! CLI command definitions for the `mintbot` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod config;
pub mod idea;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Telegram bot that launches SPL tokens on Solana.
#[derive(Parser)]
#[command(name = "mintbot", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to `{config_dir}/mintbot/config.toml`).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Telegram bot (long polling).
    Run,

    /// Start the HTTP conversation API.
    Serve {
        /// Port to listen on (overrides config).
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind to (overrides config).
        #[arg(long)]
        host: Option<String>,
    },

    /// Print one generated token idea.
    Idea,

    /// Show the resolved configuration with secrets masked.
    Config,
}
