//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire the pipeline stages in order: response decorator → rate limiter →
//!   sanitizer → [uploads: upload guard] → media validation → normalization
//! - Bind the server to a listener with graceful shutdown
//!
//! # Design Decisions
//! - Middleware layers are ordered so every response, including inner-stage
//!   rejections, passes back through the decorator.
//! - The upload rate limit is a route layer on the upload endpoint only.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::handlers;
use crate::http::request::request_id_middleware;
use crate::media::MediaValidator;
use crate::security::headers::response_decorator_middleware;
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter, RateLimiterState};
use crate::security::sanitizer::{sanitize_middleware, SanitizePolicy, SanitizerState};
use crate::security::store::{CounterStore, InMemoryCounterStore};
use crate::security::upload_guard::{
    upload_rate_limit_middleware, UploadGuard, UploadLimiterState,
};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub media_validator: Arc<MediaValidator>,
    pub upload_guard: Arc<UploadGuard>,
}

/// HTTP server for the listing gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and the
    /// in-process counter store.
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryCounterStore::new()))
    }

    /// Create a server over an externally provided counter store (e.g. a
    /// distributed one for multi-instance deployments).
    pub fn with_store(config: GatewayConfig, store: Arc<dyn CounterStore>) -> Self {
        let state = AppState {
            media_validator: Arc::new(MediaValidator::new(config.media.clone())),
            upload_guard: Arc::new(UploadGuard::new(config.upload.clone())),
        };

        let rate_limiter = Arc::new(RateLimiterState {
            limiter: RateLimiter::new(store.clone()),
            policy: config.rate_limit.clone(),
        });
        let upload_limiter = Arc::new(UploadLimiterState {
            limiter: RateLimiter::new(store),
            policy: config.upload.clone(),
        });
        let sanitizer = Arc::new(SanitizerState {
            policy: SanitizePolicy::new(&config.sanitizer),
            max_json_body_bytes: config.listener.max_json_body_bytes,
        });

        let router = Self::build_router(&config, state, rate_limiter, upload_limiter, sanitizer);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        config: &GatewayConfig,
        state: AppState,
        rate_limiter: Arc<RateLimiterState>,
        upload_limiter: Arc<UploadLimiterState>,
        sanitizer: Arc<SanitizerState>,
    ) -> Router {
        Router::new()
            .route("/api/properties", post(handlers::create_property))
            .route("/api/properties/{id}", put(handlers::update_property))
            .route(
                "/api/uploads/images",
                post(handlers::upload_image)
                    .route_layer(from_fn_with_state(upload_limiter, upload_rate_limit_middleware)),
            )
            .route("/api/inquiries", post(handlers::create_inquiry))
            .route("/api/home-stats", get(handlers::home_stats))
            .with_state(state)
            // Innermost → outermost: sanitizer, rate limiter, decorator.
            .layer(from_fn_with_state(sanitizer, sanitize_middleware))
            .layer(from_fn_with_state(rate_limiter, rate_limit_middleware))
            .layer(from_fn(response_decorator_middleware))
            .layer(from_fn(request_id_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(
                config.listener.max_multipart_body_bytes,
            ))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install shutdown handler");
    }
}
