//! HTTP server assembly.

use crate::config::ServerConfig;
use crate::routes;
use crate::storage::Storage;
use anyhow::Result;
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers. Built once at startup and
/// injected; handlers hold no other state.
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self {
            store,
            start_time: Instant::now(),
        }
    }
}

/// Build the full router: `/api` surface, permissive CORS, request tracing,
/// and optionally the game's static assets for everything else.
pub fn router(state: Arc<AppState>, static_dir: Option<PathBuf>) -> Router {
    let api = Router::new()
        .merge(routes::score_routes())
        .merge(routes::stats_routes())
        .merge(routes::health_routes())
        .fallback(routes::api_not_found)
        .with_state(state);

    let mut app = Router::new().nest("/api", api);
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until the process is stopped.
pub async fn run(config: &ServerConfig, store: Arc<dyn Storage>) -> Result<()> {
    let state = Arc::new(AppState::new(store));
    let app = router(state, config.static_dir.clone());

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("  Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
