use actix_web::cookie::Key;
use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::time::Duration;

/// actix's cookie `Key` needs at least this much material.
pub const MIN_SESSION_SECRET_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid(key, why) => write!(f, "{} is invalid: {}", key, why),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub session_secret: String,
    pub api_base_url: String,
    pub bind_address: String,
    pub cookie_secure: bool,
    pub api_timeout: Duration,
}

impl AppConfig {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_secret = lookup("SESSION_SECRET").ok_or(ConfigError::Missing("SESSION_SECRET"))?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::Invalid(
                "SESSION_SECRET",
                format!("needs at least {} bytes", MIN_SESSION_SECRET_LEN),
            ));
        }

        let api_base_url = lookup("API_BASE_URL").ok_or(ConfigError::Missing("API_BASE_URL"))?;
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(
                "API_BASE_URL",
                "must start with http:// or https://".into(),
            ));
        }

        let bind_address = lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:8080".to_string());

        let cookie_secure = match lookup("COOKIE_SECURE").as_deref() {
            None => true,
            Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(other) => {
                return Err(ConfigError::Invalid("COOKIE_SECURE", format!("'{}' is not a boolean", other)))
            }
        };

        let api_timeout = match lookup("API_TIMEOUT_SECS") {
            None => Duration::from_secs(30),
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::Invalid("API_TIMEOUT_SECS", e.to_string()))?,
        };

        Ok(AppConfig {
            session_secret,
            api_base_url,
            bind_address,
            cookie_secure,
            api_timeout,
        })
    }

    pub fn cookie_key(&self) -> Key {
        Key::from(self.session_secret.as_bytes())
    }
}
