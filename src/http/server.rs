//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the guard's own endpoints
//! - Wrap any application router in the admission middleware
//! - Wire up ambient layers (request id, tracing, timeout, CORS, body limit)
//! - Run the expired-entry sweeper alongside the server
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GuardConfig;
use crate::http::handlers;
use crate::http::middleware::guard_middleware;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::security::headers::cors_layer;
use crate::security::{RequestGuard, Sweeper};

/// Path of the CSRF issuance endpoint.
pub const CSRF_TOKEN_PATH: &str = "/api/csrf-token";

/// HTTP server fronted by the request guard.
pub struct HttpServer {
    router: Router,
    guard: Arc<RequestGuard>,
}

impl HttpServer {
    /// Create a server exposing only the guard's own endpoints.
    pub fn new(config: GuardConfig) -> Self {
        Self::with_routes(config, Router::new())
    }

    /// Create a server that admits requests to `routes` through the guard.
    pub fn with_routes(config: GuardConfig, routes: Router) -> Self {
        let guard = Arc::new(RequestGuard::new(config));
        let router = build_router(guard.clone(), routes);
        Self { router, guard }
    }

    pub fn guard(&self) -> Arc<RequestGuard> {
        self.guard.clone()
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = Sweeper::new(self.guard.clone());
        let sweeper_shutdown = shutdown.resubscribe();
        let sweeper_handle = tokio::spawn(sweeper.run(sweeper_shutdown));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        if let Err(e) = sweeper_handle.await {
            tracing::error!(error = %e, "Sweeper task failed");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Guard endpoints merged with `routes`, all behind the admission middleware.
/// Timeout, CORS and body limit sit inside the guard so their responses are
/// decorated too.
#[allow(deprecated)]
pub fn build_router(guard: Arc<RequestGuard>, routes: Router) -> Router {
    let config = guard.config();
    let request_timeout = Duration::from_secs(config.timeouts.request_secs);
    let max_body_size = config.security.max_body_size;
    let cors = cors_layer(&config.cors);

    let own_routes = Router::new()
        .route("/health", get(handlers::health))
        .route(CSRF_TOKEN_PATH, get(handlers::issue_csrf_token))
        .with_state(guard.clone());

    own_routes
        .merge(routes)
        .fallback(handlers::not_found)
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(cors)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn_with_state(guard, guard_middleware))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}
