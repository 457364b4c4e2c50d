mod handlers;
pub mod page;
pub mod session;
mod state;
mod static_files;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::location::{provider_budget, LocationResolver};

pub use state::AppState;

/// Runtime settings for the report server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deadline for a whole lookup; each provider request gets a share of it.
    pub lookup_timeout: Duration,
    pub session_ttl: Duration,
    pub primary_url: String,
    pub fallback_url: String,
}

impl ServerConfig {
    pub fn resolver(&self) -> LocationResolver {
        LocationResolver::with_endpoints(
            &self.primary_url,
            &self.fallback_url,
            provider_budget(self.lookup_timeout),
        )
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/location", post(handlers::locate))
        .route("/report", post(handlers::submit_report))
        .route("/style.css", get(handlers::style))
        .route("/healthz", get(handlers::healthz))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}

pub async fn start(config: ServerConfig) -> std::io::Result<()> {
    let state = Arc::new(AppState::new(
        config.resolver(),
        config.lookup_timeout,
        config.session_ttl,
    ));
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Disaster report form listening on http://{}", addr);
    tracing::info!("Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
}
