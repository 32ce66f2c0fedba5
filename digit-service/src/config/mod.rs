use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEFAULT_MAX_REQUEST_BYTES: usize = 2 * 1024 * 1024;
const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 2048;

#[derive(Debug, Clone, Deserialize)]
pub struct DigitConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub model: ModelConfig,
    pub limits: LimitsConfig,
    pub frontend: FrontendConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Named MessagePack record holding the CNN weights.
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Upper bound on the JSON body of `/predict`.
    pub max_request_bytes: usize,
    /// Decoded images wider or taller than this are refused.
    pub max_image_dimension: u32,
    pub reject_blank_images: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrontendConfig {
    pub static_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl DigitConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(DigitConfig {
            common: common_config,
            model: ModelConfig {
                path: get_env("MODEL_PATH", Some("model/mnist_cnn.mpk"), is_prod)?,
            },
            limits: LimitsConfig {
                max_request_bytes: parse_env(
                    "MAX_REQUEST_BYTES",
                    DEFAULT_MAX_REQUEST_BYTES,
                )?,
                max_image_dimension: parse_env(
                    "MAX_IMAGE_DIMENSION",
                    DEFAULT_MAX_IMAGE_DIMENSION,
                )?,
                reject_blank_images: parse_env("REJECT_BLANK_IMAGES", true)?,
            },
            frontend: FrontendConfig {
                static_dir: get_env("STATIC_DIR", Some("digit-service/static"), false)?,
            },
            observability: ObservabilityConfig {
                log_level: get_env("LOG_LEVEL", Some("info"), false)?,
                otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Optional typed setting: unset means `default`, a value that does not parse is an error.
fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, val, e))
        }),
        Err(_) => Ok(default),
    }
}
