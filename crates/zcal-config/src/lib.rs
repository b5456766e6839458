//! Runtime configuration for the z-cal server.
//!
//! Settings come from environment variables (optionally seeded from a `.env`
//! file by the binary):
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `OPENAI_API_KEY` | required | Provider API key |
//! | `PORT` | `8000` | Listen port |
//! | `HOST` | `0.0.0.0` | Listen address |
//! | `OPENAI_MODEL` | `gpt-4o` | Model used by every agent |
//! | `OPENAI_API_BASE` | unset | OpenAI-compatible endpoint override |
//! | `MAX_IMAGE_MB` | `5` | Largest accepted food image |
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use zcal_config::AppConfig;
//!
//! let env: HashMap<&str, &str> = [("OPENAI_API_KEY", "sk-test"), ("PORT", "9000")].into();
//! let config = AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
//!
//! assert_eq!(config.port, 9000);
//! assert_eq!(config.model, "gpt-4o");
//! ```

use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub use zcal_core::{DEFAULT_MAX_IMAGE_MB, DEFAULT_MODEL};

/// Errors that can occur when loading configuration.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("{key} environment variable is required")]
    Missing { key: &'static str },

    /// A variable is set but cannot be parsed.
    #[error("Invalid value '{value}' for {key}: {message}")]
    Invalid {
        key: &'static str,
        value: String,
        message: String,
    },
}

impl ConfigError {
    /// Creates a parse error with key context.
    pub fn invalid(key: &'static str, value: impl Into<String>, message: impl ToString) -> Self {
        Self::Invalid {
            key,
            value: value.into(),
            message: message.to_string(),
        }
    }
}

/// Fully resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_key: String,
    pub host: String,
    pub port: u16,
    pub model: String,
    pub api_base: Option<String>,
    pub max_image_mb: u32,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::Missing { key: "OPENAI_API_KEY" })?;

        Ok(Self {
            api_key,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base: get("OPENAI_API_BASE"),
            max_image_mb: parse_or("MAX_IMAGE_MB", get("MAX_IMAGE_MB"), DEFAULT_MAX_IMAGE_MB)?,
        })
    }

    /// Address string suitable for `TcpListener::bind`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, value.clone(), e)),
    }
}
