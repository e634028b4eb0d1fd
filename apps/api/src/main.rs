mod config;
mod errors;
mod llm_client;
mod models;
mod recommendation;
mod resume;
mod routes;
mod search;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, RecommenderBackend};
use crate::llm_client::LlmClient;
use crate::recommendation::{KeywordRecommender, LlmRecommender, Recommender};
use crate::routes::build_router;
use crate::search::LlmJobSearcher;
use crate::session::store::{spawn_idle_sweep, SessionStore};
use crate::state::AppState;

const IDLE_SWEEP_EVERY: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job search API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Search always goes through the LLM; the recommender is swappable via RECOMMENDER.
    let searcher = Arc::new(LlmJobSearcher(llm.clone()));
    let recommender: Arc<dyn Recommender> = match config.recommender {
        RecommenderBackend::Llm => Arc::new(LlmRecommender(llm)),
        RecommenderBackend::Keyword => Arc::new(KeywordRecommender),
    };
    info!("Recommender backend: {:?}", config.recommender);

    let sessions = Arc::new(SessionStore::new(searcher, recommender));
    spawn_idle_sweep(sessions.clone(), config.session_idle_ttl, IDLE_SWEEP_EVERY);
    info!("Idle sessions expire after {}s", config.session_idle_ttl.as_secs());

    let state = AppState {
        sessions,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
