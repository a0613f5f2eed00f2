//! End-to-end tests for the defense pipeline ordering and short-circuits.

use listing_gateway::config::GatewayConfig;
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_standard_headers_on_every_response() {
    let addr = common::spawn_gateway(GatewayConfig::default()).await;
    let res = common::client()
        .get(format!("http://{}/api/home-stats", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let headers = res.headers();
    assert_eq!(headers["x-api-version"], "1.0");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-xss-protection"], "1; mode=block");
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-max-age"], "86400");
    // The rate limiter ran and reported the budget.
    assert_eq!(headers["x-ratelimit-limit"], "60");
    assert!(headers.contains_key("x-ratelimit-remaining"));
    assert!(headers.contains_key("x-ratelimit-reset"));
}

#[tokio::test]
async fn test_options_preflight_short_circuits() {
    let addr = common::spawn_gateway(GatewayConfig::default()).await;
    let res = common::client()
        .request(
            reqwest::Method::OPTIONS,
            format!("http://{}/api/inquiries", addr),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let headers = res.headers();
    assert_eq!(
        headers["access-control-allow-methods"],
        "POST,GET,OPTIONS,PUT,DELETE"
    );
    assert_eq!(headers["access-control-allow-credentials"], "true");
    // Short-circuited before the rate limiter: no budget headers.
    assert!(!headers.contains_key("x-ratelimit-limit"));
}

#[tokio::test]
async fn test_rate_limit_rejects_after_budget() {
    let mut config = GatewayConfig::default();
    config.rate_limit.max_requests = 2;
    config.rate_limit.window_secs = 60;
    let addr = common::spawn_gateway(config).await;
    let client = common::client();
    let url = format!("http://{}/api/home-stats", addr);

    let first = client.get(&url).send().await.unwrap();
    assert_eq!(first.status(), 200);
    assert_eq!(first.headers()["x-ratelimit-remaining"], "1");

    let second = client.get(&url).send().await.unwrap();
    assert_eq!(second.status(), 200);
    assert_eq!(second.headers()["x-ratelimit-remaining"], "0");

    let third = client.get(&url).send().await.unwrap();
    assert_eq!(third.status(), 429);
    // Rejections still carry the standard header set.
    assert_eq!(third.headers()["x-frame-options"], "DENY");
    let body: Value = third.json().await.unwrap();
    assert_eq!(body["retry_after"], 60);
}

#[tokio::test]
async fn test_rate_limit_window_resets() {
    let mut config = GatewayConfig::default();
    config.rate_limit.max_requests = 1;
    config.rate_limit.window_secs = 1;
    let addr = common::spawn_gateway(config).await;
    let client = common::client();
    let url = format!("http://{}/api/home-stats", addr);

    assert_eq!(client.get(&url).send().await.unwrap().status(), 200);
    assert_eq!(client.get(&url).send().await.unwrap().status(), 429);

    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
    assert_eq!(client.get(&url).send().await.unwrap().status(), 200);
}

#[tokio::test]
async fn test_suspicious_payload_rejected_generically() {
    let addr = common::spawn_gateway(GatewayConfig::default()).await;
    let res = common::client()
        .post(format!("http://{}/api/inquiries", addr))
        .json(&json!({
            "name": "visitor",
            "message": "' OR '1'='1 union select password from users"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid request");
    // Never echo which pattern matched.
    assert!(body.get("errors").is_none());
    assert!(!body.to_string().to_lowercase().contains("sql"));
}

#[tokio::test]
async fn test_sanitizer_cleans_strings_on_non_exempt_routes() {
    let addr = common::spawn_gateway(GatewayConfig::default()).await;
    let res = common::client()
        .post(format!("http://{}/api/inquiries", addr))
        .json(&json!({
            "name": "  Erika\u{0000} Muster\u{0007}mann  ",
            "message": "viewing request"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["inquiry"]["name"], "Erika Mustermann");
}

#[tokio::test]
async fn test_allow_listed_route_skips_inspection() {
    let addr = common::spawn_gateway(GatewayConfig::default()).await;
    // A description that would trip the SQL family passes untouched on the
    // property routes.
    let form = reqwest::multipart::Form::new()
        .text("property_type", "apartment")
        .text("description", "price negotiable where 1=1; see notes");
    let res = common::client()
        .post(format!("http://{}/api/properties", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["property"]["description"],
        "price negotiable where 1=1; see notes"
    );
}
