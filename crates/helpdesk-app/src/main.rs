//! Helpdesk application binary - composition root.
//!
//! 1. Parse CLI flags and read the configuration file
//! 2. Initialise tracing, then apply env and flag overrides
//! 3. Build the retrieval index over the documents directory
//! 4. Start the axum REST API server

mod cli;

use std::sync::Arc;

use clap::Parser;

use helpdesk_api::routes;
use helpdesk_api::state::AppState;
use helpdesk_core::config::HelpdeskConfig;
use helpdesk_vector::LocalRetriever;

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config file first; its load error is reported once tracing is up.
    let config_file = args.resolve_config_path();
    let (mut config, load_error) = HelpdeskConfig::load_or_default(&config_file);
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Helpdesk v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        None => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
    }

    // Env overrides, then flags.
    config.apply_env_overrides();
    config.general.port = args.resolve_port(config.general.port);
    if let Some(dir) = args.resolve_docs_dir() {
        config.retrieval.docs_dir = dir;
    }

    // Retrieval index. A failed build is retried lazily on the first query.
    let retriever = Arc::new(LocalRetriever::from_config(&config.retrieval));
    match retriever.warm_up().await {
        Ok(chunks) => tracing::info!(
            docs_dir = %config.retrieval.docs_dir,
            chunks,
            "Retrieval index ready"
        ),
        Err(e) => tracing::warn!(
            docs_dir = %config.retrieval.docs_dir,
            error = %e,
            "Retrieval index not built"
        ),
    }

    let state = AppState::new(config.clone(), retriever);
    routes::start_server(&config, state).await?;

    Ok(())
}
