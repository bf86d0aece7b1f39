//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use request_guard::{GuardConfig, HttpServer, Shutdown};
use tokio::net::TcpListener;

/// Start a guarded server on an ephemeral port. Dropping the returned
/// `Shutdown` does not stop it; call `trigger`.
pub async fn start_server(config: GuardConfig, routes: Router) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::with_routes(config, routes);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

/// Client without connection pooling or system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
