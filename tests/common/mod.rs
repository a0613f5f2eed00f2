//! Shared utilities for integration testing.

use std::net::SocketAddr;

use listing_gateway::config::GatewayConfig;
use listing_gateway::http::HttpServer;
use tokio::net::TcpListener;

/// Start a gateway on an ephemeral port and return its address.
pub async fn spawn_gateway(config: GatewayConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    addr
}

/// A client that never reuses pooled connections between tests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
