//! Command-line argument surface.
//!
//! A much smaller-scale mirror of the teacher's `llmspell-cli::cli::Cli`:
//! one binary, one long-running command, a handful of global flags an
//! operator reaches for without editing the config file.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ragforge", version, about = "Two-pipeline RAG ingestion/retrieval service")]
pub struct Cli {
    /// Path to a TOML config file. Falls back to `RAGFORGE_CONFIG` / the
    /// discovery search path documented in `ragforge_config::RagForgeConfig::load`.
    #[arg(long, global = true, env = "RAGFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server and serve until SIGTERM/SIGINT drains it.
    Serve {
        /// Overrides `server.bind_addr` from the loaded config.
        #[arg(long)]
        bind_addr: Option<String>,
    },
    /// Load and validate configuration, then exit without binding a port.
    CheckConfig,
}
