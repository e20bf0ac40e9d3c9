//! Configuration management utilities
//!
//! Process configuration is read from environment variables, after loading a
//! `.env` file from the working directory when one exists.

use crate::LogFormat;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    /// A variable is set to something unparsable
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key (`GEMINI_API_KEY`)
    pub gemini_api_key: Option<String>,
    /// Gemini API base URL (`GEMINI_API_BASE`)
    pub gemini_api_base: String,
    /// Model identifier (`FINLENS_MODEL`)
    pub model: String,
    /// Budget for a single model call (`FINLENS_REQUEST_TIMEOUT_SECS`)
    pub request_timeout: Duration,
    /// Client-side rate limit (`FINLENS_REQUESTS_PER_MINUTE`)
    pub requests_per_minute: Option<u32>,
    /// How documents reach the model: `inline` or `upload` (`FINLENS_DOCUMENT_TRANSPORT`)
    pub document_transport: String,
    /// Server bind address (`FINLENS_LISTEN_ADDR`)
    pub listen_addr: SocketAddr,
    /// Directory for temporary upload files (`FINLENS_UPLOAD_DIR`)
    pub upload_dir: PathBuf,
    /// CORS allow-list; `*` allows any origin (`FINLENS_CORS_ALLOW_ORIGINS`)
    pub cors_allow: Vec<String>,
    /// Static frontend served as fallback (`FINLENS_STATIC_DIR`)
    pub static_dir: Option<PathBuf>,
    /// Request body limit in bytes (`FINLENS_MAX_UPLOAD_MB`)
    pub max_upload_bytes: usize,
    /// Log output format (`FINLENS_LOG_FORMAT`)
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_api_base: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-pro".to_string(),
            request_timeout: Duration::from_secs(300),
            requests_per_minute: None,
            document_transport: "inline".to_string(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            upload_dir: std::env::temp_dir(),
            cors_allow: vec!["*".to_string()],
            static_dir: None,
            max_upload_bytes: 50 * 1024 * 1024,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Load `.env` (if present) and read configuration from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_secs = parse_var(&get, "FINLENS_REQUEST_TIMEOUT_SECS")?
            .unwrap_or(defaults.request_timeout.as_secs());
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "FINLENS_REQUEST_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let document_transport = get("FINLENS_DOCUMENT_TRANSPORT")
            .map_or(defaults.document_transport, |v| v.trim().to_ascii_lowercase());
        if !matches!(document_transport.as_str(), "inline" | "upload") {
            return Err(ConfigError::Invalid {
                key: "FINLENS_DOCUMENT_TRANSPORT",
                value: document_transport,
                reason: "expected inline or upload".to_string(),
            });
        }

        let log_format = match get("FINLENS_LOG_FORMAT") {
            Some(v) => v.parse().map_err(|reason| ConfigError::Invalid {
                key: "FINLENS_LOG_FORMAT",
                value: v.clone(),
                reason,
            })?,
            None => defaults.log_format,
        };

        let cors_allow = get("FINLENS_CORS_ALLOW_ORIGINS").map_or(defaults.cors_allow, |v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let max_upload_mb: usize =
            parse_var(&get, "FINLENS_MAX_UPLOAD_MB")?.unwrap_or(defaults.max_upload_bytes >> 20);

        Ok(Self {
            gemini_api_key: get("GEMINI_API_KEY").map(|v| v.trim().to_string()),
            gemini_api_base: get("GEMINI_API_BASE")
                .map_or(defaults.gemini_api_base, |v| v.trim_end_matches('/').to_string()),
            model: get("FINLENS_MODEL").unwrap_or(defaults.model),
            request_timeout: Duration::from_secs(timeout_secs),
            requests_per_minute: parse_var(&get, "FINLENS_REQUESTS_PER_MINUTE")?,
            document_transport,
            listen_addr: parse_var(&get, "FINLENS_LISTEN_ADDR")?.unwrap_or(defaults.listen_addr),
            upload_dir: get("FINLENS_UPLOAD_DIR").map_or(defaults.upload_dir, PathBuf::from),
            cors_allow,
            static_dir: get("FINLENS_STATIC_DIR").map(PathBuf::from),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            log_format,
        })
    }

    /// The API key, or an error naming the missing variable
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.gemini_api_key
            .as_deref()
            .ok_or(ConfigError::Missing("GEMINI_API_KEY"))
    }

    /// Whether any origin may call the API
    pub fn cors_allows_any(&self) -> bool {
        self.cors_allow.iter().any(|o| o == "*")
    }
}

fn parse_var<T, G>(get: &G, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}
