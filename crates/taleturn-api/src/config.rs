//! Server configuration read from the environment.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use taleturn_generation::ChatCompletionsConfig;

use crate::error::AppError;

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Generation backend settings.
    pub backend: ChatCompletionsConfig,
}

impl ServerConfig {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, applying defaults for unset keys.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = ChatCompletionsConfig::default();
        let backend = ChatCompletionsConfig {
            base_url: lookup("TALETURN_BACKEND_URL").unwrap_or(defaults.base_url),
            model: lookup("TALETURN_MODEL").unwrap_or(defaults.model),
            api_key: lookup("TALETURN_API_KEY").filter(|key| !key.is_empty()),
            temperature: parse_var(&lookup, "TALETURN_TEMPERATURE", defaults.temperature)?,
            request_timeout: Duration::from_secs(parse_var(
                &lookup,
                "TALETURN_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            history_window: parse_var(&lookup, "TALETURN_HISTORY_WINDOW", defaults.history_window)?,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "PORT", 3000)?,
            backend,
        })
    }

    /// The socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `host:port` is not a valid address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
        None => Ok(default),
    }
}
