//! Server configuration.
//!
//! Values are layered with `figment`: built-in defaults, then an optional
//! `taskapi.toml` in the working directory, then `TASKAPI_*` environment
//! variables. Nested keys use a double underscore, so
//! `TASKAPI_RATE_LIMIT__MAX_REQUESTS=120` sets `rate_limit.max_requests`.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "taskapi.toml";
pub const ENV_PREFIX: &str = "TASKAPI_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 60,
            window_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    /// `EnvFilter` directives; `RUST_LOG` wins when set.
    pub log_filter: String,
    pub log_format: LogFormat,
    /// Name stored with every issued access token.
    pub token_name: String,
    pub rate_limit: RateLimitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://taskapi.db?mode=rwc".to_owned(),
            bind_address: "0.0.0.0:3000".to_owned(),
            log_filter: "info,sea_orm=warn".to_owned(),
            log_format: LogFormat::Compact,
            token_name: "auth-token".to_owned(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load the layered configuration.
    ///
    /// # Errors
    ///
    /// Fails when the config file or an environment variable holds a value
    /// of the wrong type.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}
