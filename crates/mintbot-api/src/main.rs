//! mintbot CLI, Telegram runner and HTTP API entry point.
//!
//! Binary name: `mintbot`
//!
//! Parses CLI arguments, loads configuration, then runs the Telegram bot,
//! the HTTP server, or a one-shot command.

mod cli;
mod http;
mod runner;
mod state;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use mintbot_infra::config::load_config;
use mintbot_infra::telegram::TelegramClient;
use mintbot_observe::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = TracingOptions::for_verbosity(cli.verbose, cli.quiet)
        .with_json(cli.log_json)
        .with_otel(cli.otel);
    init_tracing(&options).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = dispatch(cli).await;
    shutdown_tracing();
    result
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())
        .await
        .context("failed to load configuration")?;

    match cli.command {
        Commands::Run => {
            let client = Arc::new(TelegramClient::new(&config.telegram)?);
            let cancel = CancellationToken::new();
            let state = AppState::init(config, cancel.clone());

            if !cli.quiet {
                println!();
                println!(
                    "  {} mintbot polling Telegram (Ctrl+C to stop)",
                    console::style("🚀").bold()
                );
                println!();
            }

            let poller = tokio::spawn(runner::run_telegram(state, client));
            shutdown_signal().await;
            tracing::info!("shutdown requested");
            cancel.cancel();
            poller.await.context("telegram runner panicked")?;

            println!("\n  Bot stopped.");
        }

        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| config.http.host.clone());
            let port = port.unwrap_or(config.http.port);
            if config.http.api_key.is_none() {
                tracing::warn!("MINTBOT_HTTP_API_KEY not set; the HTTP API accepts unauthenticated requests");
            }

            let cancel = CancellationToken::new();
            let state = AppState::init(config, cancel.clone());
            let router = http::router::build_router(state);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;

            if !cli.quiet {
                println!();
                println!(
                    "  {} mintbot API listening on {}",
                    console::style("🚀").bold(),
                    console::style(format!("http://{addr}")).cyan().underlined()
                );
                println!();
            }

            let shutdown = cancel.clone();
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_signal().await;
                    shutdown.cancel();
                })
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Idea => {
            cli::idea::print_idea(&config.ideas, cli.json).await?;
        }

        Commands::Config => {
            cli::config::show_config(&config, cli.json)?;
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
