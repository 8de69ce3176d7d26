//! Macro Data Gateway
//!
//! An HTTP gateway in front of the Bank of Korea ECOS statistics API, an
//! OpenAI-compatible chat endpoint and the Yahoo Finance chart API. Upstream
//! keys are read from the environment and never leave the server.
//!
//! # Architecture
//!
//! - **Domain**: series types, ECOS wire models and the `PageSource` seam
//! - **Application**: paged series fetching, chat defaults, market transforms
//! - **Infrastructure**: the shared upstream HTTP client and per-upstream clients
//! - **API**: HTTP handlers, routing, OpenAPI and middleware
//!
//! # Configuration
//!
//! `config.yaml` (path overridable with `CONFIG_PATH`) plus environment:
//! - `BOK_API_KEY`: ECOS key, required for the statistics endpoints
//! - `OPENAI_API_KEY`, `OPENAI_BASE_URL`: chat completion upstream
//! - `APP_SHARED_KEY`: shared key expected in `X-App-Key` on `/v1/ai/prompt`
//! - `PORT`, `ALLOWED_ORIGINS`: server overrides
//! - `RUST_LOG`, `LOG_FORMAT`: logging (default `info`, `text`)
//!
//! # Quick Start
//!
//! ```bash
//! export BOK_API_KEY="your_key_here"
//! cargo run --release
//!
//! curl http://localhost:3010/health
//! curl "http://localhost:3010/v1/ecos/stat-search?statCode=722Y001&cycle=D&startDate=20240101&endDate=20240105&itemCode1=0101000"
//! ```

use anyhow::Context;
use macro_data_gateway::api::routes::create_router;
use macro_data_gateway::api::state::AppState;
use macro_data_gateway::config::AppConfig;
use macro_data_gateway::infrastructure::Secrets;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = EnvFilter::new(
        env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load Config
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let mut config = AppConfig::load(&config_path)?;
    config.apply_env_overrides();

    let secrets = Secrets::from_env();
    secrets.log_status();

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let state = AppState::build(&config, secrets, metrics)?;
    let app = create_router(state.clone(), config.server.allowed_origins.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", addr))?;
    tracing::info!("Macro data gateway running at http://{}", addr);
    tracing::info!(
        "ECOS: {} (page size {}, {} pages in flight)",
        config.ecos.base_url,
        config.ecos.page_size,
        config.ecos.max_in_flight
    );

    // Graceful shutdown handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error during operation")?;

    state.shutdown();
    tracing::info!("Upstream client closed, bye");

    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C) to initiate graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
