mod config;
mod db;
mod errors;
mod interview;
mod llm_client;
mod models;
mod report;
mod resume;
mod routes;
mod scheduler;
mod state;
mod store;
mod transcription;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{LlmBackend, LlmClient};
use crate::routes::build_router;
use crate::scheduler::{spawn_poller, QuestionScheduler, ReportScheduler};
use crate::state::AppState;
use crate::store::{postgres::PgStore, InterviewStore};
use crate::transcription::WhisperClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (migrations run here)
    let db = create_pool(&config.database_url).await?;
    let store: Arc<dyn InterviewStore> = Arc::new(PgStore::new(db));

    // Initialize generation and transcription clients
    let llm = LlmClient::new(
        config.llm_api_key.clone(),
        &config.llm_base_url,
        config.llm_model.clone(),
        config.upstream_timeout,
    )?;
    info!("LLM client initialized (model: {})", llm.model());
    let llm: Arc<dyn LlmBackend> = Arc::new(llm);

    let transcriber = Arc::new(WhisperClient::new(
        config.transcription_api_key.clone(),
        &config.transcription_base_url,
        config.transcription_model.clone(),
        config.transcription_language.clone(),
        config.upstream_timeout,
    )?);
    info!(
        "Transcription client initialized (model: {})",
        config.transcription_model
    );

    // Background schedulers
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pollers = vec![
        spawn_poller(
            Arc::new(QuestionScheduler::new(
                store.clone(),
                llm.clone(),
                config.question_count,
                config.scheduler_lease,
            )),
            config.scheduler_interval,
            shutdown_rx.clone(),
        ),
        spawn_poller(
            Arc::new(ReportScheduler::new(
                store.clone(),
                llm,
                config.scheduler_lease,
            )),
            config.scheduler_interval,
            shutdown_rx,
        ),
    ];

    // Build app state
    let state = AppState {
        store,
        transcriber,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, waiting for schedulers");
    let _ = shutdown_tx.send(true);
    for poller in pollers {
        if let Err(e) = poller.await {
            warn!("Scheduler task ended abnormally: {e}");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
