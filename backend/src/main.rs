mod config;
mod game;
mod models;
mod routes;
mod session;
mod websocket;
mod words;

use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Router};
use chrono::{DateTime, Utc};
use config::Config;
use session::SessionRegistry;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use words::CompoundWordTable;

/// Application state shared across all handlers
pub struct AppState {
    pub config: Config,
    /// Rooms and the connections seated in them
    pub sessions: SessionRegistry,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config, table: CompoundWordTable) -> Self {
        let sessions = SessionRegistry::new(Arc::new(table), config.rules());
        Self {
            config,
            sessions,
            started_at: Utc::now(),
        }
    }

    pub fn with_builtin_table(config: Config) -> Self {
        Self::new(config, CompoundWordTable::builtin())
    }
}

/// Build the router: WebSocket endpoint, API routes, static fallback
pub fn app(state: Arc<AppState>) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let frontend_service = ServeDir::new(&state.config.server.static_dir);

    Router::new()
        .route("/ws", get(websocket::handle_websocket))
        .merge(routes::create_routes())
        .fallback_service(frontend_service)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "compound_cards=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Compound Cards server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Load compound word table
    let table = match CompoundWordTable::load(&config.game.compound_words_path).await {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!(
                "Failed to load compound words: {}. Using built-in table.",
                e
            );
            tracing::warn!(
                "Provide a word list at {} to customise the deck",
                config.game.compound_words_path
            );
            CompoundWordTable::builtin()
        }
    };

    let state = Arc::new(AppState::new(config.clone(), table));
    let app = app(state);

    // Start server
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("WebSocket endpoint: ws://{}/ws", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
