//! End-to-end admission tests against a bound listener.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::{routing::{get, post}, Router};
use request_guard::GuardConfig;

mod common;

fn config() -> GuardConfig {
    let mut config = GuardConfig::default();
    config.cors.allowed_origins = vec!["https://learn.example.com".into()];
    config.rate_limit.max_requests = 3;
    config.rate_limit.window_ms = 60_000;
    config
}

#[tokio::test]
async fn test_peer_address_is_rate_limited() {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let routes = Router::new().route(
        "/courses",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "courses"
            }
        }),
    );

    let (addr, shutdown) = common::start_server(config(), routes).await;
    let client = common::client();
    let url = format!("http://{}/courses", addr);

    let mut remaining = Vec::new();
    for _ in 0..3 {
        let res = client.get(&url).send().await.expect("server unreachable");
        assert_eq!(res.status(), 200);
        remaining.push(
            res.headers()["x-ratelimit-remaining"]
                .to_str()
                .unwrap()
                .parse::<u32>()
                .unwrap(),
        );
    }
    assert_eq!(remaining, vec![2, 1, 0]);

    // Forwarded headers are ignored unless trusted, so spoofing does not help.
    let res = client
        .get(&url)
        .header("x-forwarded-for", "203.0.113.9")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 429);
    assert!(res.headers().contains_key("retry-after"));
    assert_eq!(res.headers()["x-frame-options"], "DENY");

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "rate_limited");
    assert!(body["error"]["retry_after_secs"].as_u64().unwrap() >= 1);

    // The rejected request never reached the handler.
    assert_eq!(hits.load(Ordering::SeqCst), 3);

    shutdown.trigger();
}

#[tokio::test]
async fn test_csrf_round_trip() {
    let routes = Router::new().route("/api/messages", post(|| async { "sent" }));
    let (addr, shutdown) = common::start_server(GuardConfig::default(), routes).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/api/csrf-token", addr))
        .header("cookie", "sb-access-token=student-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let header_token = res.headers()["x-csrf-token"].to_str().unwrap().to_string();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["token"], header_token.as_str());
    assert_eq!(body["expires_in_secs"], 3600);

    let send = |token: &str| {
        client
            .post(format!("http://{}/api/messages", addr))
            .header("cookie", "sb-access-token=student-42")
            .header("x-csrf-token", token.to_string())
            .send()
    };

    let res = send(&header_token).await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "sent");

    // Reusable until it expires.
    assert_eq!(send(&header_token).await.unwrap().status(), 200);

    let res = send("forged-token").await.unwrap();
    assert_eq!(res.status(), 403);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "invalid_csrf_token");

    shutdown.trigger();
}

#[tokio::test]
async fn test_cors_for_allowed_origin() {
    let routes = Router::new().route("/courses", get(|| async { "courses" }));
    let (addr, shutdown) = common::start_server(config(), routes).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/courses", addr))
        .header("origin", "https://learn.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()["access-control-allow-origin"],
        "https://learn.example.com"
    );
    assert!(res.headers()["vary"]
        .to_str()
        .unwrap()
        .to_ascii_lowercase()
        .contains("origin"));

    let res = client
        .get(format!("http://{}/courses", addr))
        .header("origin", "https://phish.example.net")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    assert!(res.headers().get("access-control-allow-origin").is_none());

    shutdown.trigger();
}
