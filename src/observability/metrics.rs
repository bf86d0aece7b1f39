//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_requests_total` (counter): admission outcomes by `outcome`
//! - `guard_rejections_total` (counter): rejections by `code`
//! - `guard_suspicious_clients_total` (counter): flagged user agents
//! - `guard_csrf_tokens_issued_total` (counter)
//! - `guard_sweep_removed_total` (counter): swept entries by `store`
//! - `guard_rate_windows`, `guard_csrf_entries` (gauges): live entries
//!
//! Recording goes through the `metrics` facade and is a no-op until
//! `init_metrics` installs the Prometheus exporter.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_admitted() {
    counter!("guard_requests_total", "outcome" => "admitted").increment(1);
}

pub fn record_rejected(code: &'static str) {
    counter!("guard_requests_total", "outcome" => "rejected").increment(1);
    counter!("guard_rejections_total", "code" => code).increment(1);
}

pub fn record_suspicious_client() {
    counter!("guard_suspicious_clients_total").increment(1);
}

pub fn record_csrf_issued() {
    counter!("guard_csrf_tokens_issued_total").increment(1);
}

pub fn record_sweep(store: &'static str, removed: usize) {
    counter!("guard_sweep_removed_total", "store" => store).increment(removed as u64);
}

pub fn record_store_sizes(rate_windows: usize, csrf_entries: usize) {
    gauge!("guard_rate_windows").set(rate_windows as f64);
    gauge!("guard_csrf_entries").set(csrf_entries as f64);
}
