//! Entry point: parse flags, initialize tracing, load config, wire the
//! component graph, then either serve or validate-and-exit.
//!
//! Exit codes (§6): `0` on clean shutdown (drain completed or
//! `check-config` succeeded), non-zero on unrecoverable init failure
//! (bad config, unreachable vector store at start is surfaced the same
//! way a config error is — both fail before the listener binds).

mod cli;
mod wiring;

use clap::Parser;
use cli::{Cli, Command, LogFormat};
use ragforge_config::RagForgeConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_tracing(cli.log_format);

    if let Err(err) = run(cli).await {
        tracing::error!(error = %err, "ragforge exited with an unrecoverable error");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => RagForgeConfig::load_file(path)?,
        None => RagForgeConfig::load()?,
    };

    match cli.command {
        Command::CheckConfig => {
            tracing::info!("configuration loaded and validated successfully");
            Ok(())
        }
        Command::Serve { bind_addr } => {
            if let Some(bind_addr) = bind_addr {
                config.server.bind_addr = bind_addr;
            }

            let state = wiring::build_state(config);
            ragforge_server::serve(state).await
        }
    }
}

/// Tracing output goes to stderr so stdout stays free for any future
/// machine-readable command output (mirrors the teacher's rationale in
/// `llmspell-cli::main::setup_tracing`).
fn setup_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}
