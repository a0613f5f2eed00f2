//! Configuration subsystem.
//!
//! # Responsibilities
//! - Define the configuration schema (schema.rs)
//! - Load TOML config files with environment overrides (loader.rs)
//! - Semantic validation before acceptance (validation.rs)

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{
    GatewayConfig, ListenerConfig, MediaConfig, ObservabilityConfig, RateLimitConfig,
    SanitizerConfig, TimeoutConfig, UploadConfig,
};
