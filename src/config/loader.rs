//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
///
/// Environment overrides are applied after parsing, before validation.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: GatewayConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment-variable overrides for the media ceilings.
///
/// Deployments tune these per environment without shipping a new config file.
/// Unparseable values are ignored with a warning rather than aborting startup.
pub fn apply_env_overrides(config: &mut GatewayConfig) {
    override_u64("MAX_IMAGES_PER_PROPERTY", &mut config.media.max_images);
    override_u64("MAX_IMAGE_UPLOAD_BYTES", &mut config.media.max_image_bytes);
    override_u64("MAX_VIDEOS_PER_PROPERTY", &mut config.media.max_videos);
    override_u64("MAX_VIDEO_UPLOAD_BYTES", &mut config.media.max_video_bytes);
}

fn override_u64(var: &str, target: &mut u64) {
    if let Ok(raw) = std::env::var(var) {
        match raw.parse::<u64>() {
            Ok(value) => *target = value,
            Err(_) => {
                tracing::warn!(variable = var, value = %raw, "Ignoring unparseable override");
            }
        }
    }
}
