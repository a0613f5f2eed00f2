//! Listing Gateway Library
//!
//! Request defense and media-ingestion pipeline for a real-estate listing
//! platform. Every inbound API call passes, in order, through the response
//! decorator, the rate limiter, the content sanitizer, and — for upload
//! endpoints — the upload guard, media validation, and field normalization
//! before it reaches business logic.

pub mod config;
pub mod http;
pub mod media;
pub mod normalize;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use http::HttpServer;
