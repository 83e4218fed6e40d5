//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all page handlers
//! - Wire up middleware (request scope, timeout, tracing)
//! - Bind the server to a listener and serve until shutdown
//!
//! # Design Decisions
//! - The upstream request scope is a middleware layer: it travels in
//!   request extensions and is finished after the handler, so sign-off
//!   runs on every exit path
//! - One inbound request maps to at most one upstream session; nothing
//!   is shared across requests

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{any, get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{CredentialsConfig, PortalConfig, UpstreamConfig};
use crate::http::handlers::{assets, auth, reports, schedules, tickets};
use crate::render::Renderer;
use crate::upstream::RequestScope;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: UpstreamConfig,
    pub credentials: CredentialsConfig,
    pub templates: Arc<Renderer>,
}

/// HTTP server for the portal.
pub struct PortalServer {
    router: Router,
    config: PortalConfig,
}

impl PortalServer {
    /// Create a new server with the given configuration.
    pub fn new(config: PortalConfig) -> Result<Self, minijinja::Error> {
        let state = AppState {
            upstream: config.upstream.clone(),
            credentials: config.credentials.clone(),
            templates: Arc::new(Renderer::new()?),
        };
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &PortalConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(auth::index))
            .route("/login", post(auth::login))
            .route("/logout", get(auth::logout))
            .route("/home", get(auth::home))
            .route("/reports", get(reports::list_reports))
            .route("/reports/run/{name}", get(reports::run_report))
            .route("/reports/defer/{name}", post(reports::defer_report))
            .route("/tickets", get(tickets::list_tickets))
            .route("/tickets/{name}", get(tickets::ticket_detail))
            .route("/tickets/{name}/delete", post(tickets::delete_ticket))
            .route("/schedules", get(schedules::list_schedules))
            .route("/schedules/{name}", get(schedules::schedule_detail))
            .route("/schedules/{name}/log", get(schedules::schedule_log))
            .route("/assets/{*path}", any(assets::proxy_asset))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                upstream_scope_middleware,
            ))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }
}

/// Attach a fresh [`RequestScope`] to the request and guarantee it is
/// finished once the handler completes, whatever the outcome.
async fn upstream_scope_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let scope = Arc::new(RequestScope::new(
        state.upstream.clone(),
        state.credentials.clone(),
    ));
    request.extensions_mut().insert(scope.clone());

    let response = next.run(request).await;

    // Runs for success and error responses alike; aborted requests
    // fall back to the scope's Drop path.
    scope.finish().await;
    response
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
