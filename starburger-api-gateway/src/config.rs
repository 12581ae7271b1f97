use std::time::Duration;

use dotenvy::dotenv;
use starburger_distances::geocoder::YANDEX_GEOCODER_URL;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub yandex_api_key: String,
    pub manager_token: String,
    pub geocoder_base_url: String,
    pub geocoder_timeout: Duration,
    pub listen_addr: String,
    pub static_url: String,
    pub log_level: String,
}

impl Config {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let optional =
            |name: &'static str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let geocoder_timeout = match lookup("GEOCODER_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    name: "GEOCODER_TIMEOUT_SECS",
                    value,
                })?,
            None => Duration::from_secs(10),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            yandex_api_key: required("YANDEX_API_KEY")?,
            manager_token: required("MANAGER_TOKEN")?,
            geocoder_base_url: optional("GEOCODER_BASE_URL", YANDEX_GEOCODER_URL),
            geocoder_timeout,
            listen_addr: optional("LISTEN_ADDR", "0.0.0.0:8000"),
            static_url: optional("STATIC_URL", "/static/"),
            log_level: optional("LOG_LEVEL", "info"),
        })
    }
}
