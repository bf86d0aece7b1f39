//! Request guard service.
//!
//! Admission control in front of the learning platform's HTTP surface.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────────┐
//!                     │                  REQUEST GUARD                    │
//!                     │                                                   │
//!  Client Request     │  ┌──────────┐   ┌────────────────────────────┐    │
//!  ───────────────────┼─▶│  http    │──▶│ guard middleware           │    │
//!                     │  │ server   │   │ origin → rate → size →     │    │
//!                     │  └──────────┘   │ session → csrf             │    │
//!                     │                 └─────────────┬──────────────┘    │
//!                     │                               ▼                   │
//!  Client Response    │  ┌──────────┐   ┌────────────────────────────┐    │
//!  ◀──────────────────┼──│ security │◀──│ handlers / app routes      │    │
//!                     │  │ headers  │   └────────────────────────────┘    │
//!                     │  └──────────┘                                     │
//!                     │                                                   │
//!                     │  ┌───────────┐ ┌────────────┐ ┌───────────────┐   │
//!                     │  │  config   │ │ observa-   │ │  sweeper      │   │
//!                     │  │ toml+env  │ │ bility     │ │ (hourly)      │   │
//!                     │  └───────────┘ └────────────┘ └───────────────┘   │
//!                     └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use request_guard::config::load_startup_config;
use request_guard::lifecycle::{signals, Shutdown};
use request_guard::observability::{logging, metrics};
use request_guard::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "request-guard")]
#[command(about = "Rate limiting, CSRF and security headers for the learning platform")]
struct Args {
    /// Optional TOML configuration file. GUARD_* environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_startup_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);

    tracing::info!("request-guard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit_window_ms = config.rate_limit.window_ms,
        rate_limit_max_requests = config.rate_limit.max_requests,
        allowed_origins = ?config.cors.allowed_origins,
        csrf_token_ttl_secs = config.csrf.token_ttl_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config);

    let signal_task = tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;
    signal_task.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
