//! Configuration management for the Smart Companion backend.
//!
//! Configuration can be set via environment variables (a `.env` file in the
//! working directory is loaded first by the binary):
//! - `GROQ_API_KEY` - Required. API key for the LLM provider.
//! - `LLM_MODEL` - Optional. Model identifier. Defaults to `groq/compound-mini`.
//! - `LLM_API_URL` - Optional. Chat-completions endpoint. Defaults to Groq's OpenAI-compatible URL.
//! - `LLM_TEMPERATURE` - Optional. Sampling temperature in `0.0..=2.0`. Defaults to `0.3`.
//! - `LLM_TIMEOUT_SECS` - Optional. HTTP timeout for the provider call. Unset means no timeout.
//! - `DATABASE_PATH` - Optional. SQLite file. Defaults to `users.db`.
//! - `STORE_BACKEND` - Optional. `sqlite` (default) or `memory`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `CORS_ORIGIN` - Optional. The one browser origin allowed to call the API.
//!   Defaults to `http://localhost:3000`.

use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::decompose::gateway::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::llm::GROQ_API_URL;
use crate::store::StoreType;

pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Server configuration.
#[derive(Clone)]
pub struct Config {
    /// LLM provider API key
    pub api_key: String,

    /// Model identifier sent with each completion request
    pub model: String,

    /// Chat-completions endpoint
    pub api_url: String,

    /// Sampling temperature for decomposition calls
    pub temperature: f64,

    /// Provider request timeout (none by default)
    pub llm_timeout: Option<Duration>,

    /// SQLite database file
    pub database_path: PathBuf,

    pub store_type: StoreType,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Trusted browser origin for CORS
    pub cors_origin: HeaderValue,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("temperature", &self.temperature)
            .field("llm_timeout", &self.llm_timeout)
            .field("database_path", &self.database_path)
            .field("store_type", &self.store_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cors_origin", &self.cors_origin)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `GROQ_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GROQ_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("GROQ_API_KEY".to_string()))?;

        let model = lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_url = lookup("LLM_API_URL").unwrap_or_else(|| GROQ_API_URL.to_string());

        let temperature = match lookup("LLM_TEMPERATURE") {
            Some(raw) => {
                let value: f64 = raw.trim().parse().map_err(|e| {
                    ConfigError::InvalidValue("LLM_TEMPERATURE".to_string(), format!("{}", e))
                })?;
                if !(0.0..=2.0).contains(&value) {
                    return Err(ConfigError::InvalidValue(
                        "LLM_TEMPERATURE".to_string(),
                        format!("{} is outside 0.0..=2.0", value),
                    ));
                }
                value
            }
            None => DEFAULT_TEMPERATURE,
        };

        let llm_timeout = lookup("LLM_TIMEOUT_SECS")
            .map(|raw| {
                raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidValue("LLM_TIMEOUT_SECS".to_string(), format!("{}", e))
                })
            })
            .transpose()?;

        let database_path = lookup("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("users.db"));

        let store_type = lookup("STORE_BACKEND")
            .map(|s| StoreType::from_str(&s))
            .unwrap_or_default();

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let cors_origin = lookup("CORS_ORIGIN")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
        let cors_origin = HeaderValue::from_str(cors_origin.trim_end_matches('/'))
            .map_err(|e| ConfigError::InvalidValue("CORS_ORIGIN".to_string(), format!("{}", e)))?;

        Ok(Self {
            api_key,
            model,
            api_url,
            temperature,
            llm_timeout,
            database_path,
            store_type,
            host,
            port,
            cors_origin,
        })
    }

    /// Create a config with default values (useful for testing).
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            api_url: GROQ_API_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            llm_timeout: None,
            database_path: PathBuf::from("users.db"),
            store_type: StoreType::default(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origin: HeaderValue::from_static(DEFAULT_CORS_ORIGIN),
        }
    }
}
