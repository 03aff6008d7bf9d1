//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SCHOOLSOFT_API_URL` - Backend base URL including the API prefix
//!   (e.g., `http://localhost:5000/api`)
//!
//! ## Optional
//! - `SCHOOLSOFT_STATE_DIR` - Directory for the local session store (default: `~/.schoolsoft`)
//! - `SCHOOLSOFT_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! - `SCHOOLSOFT_PRINT_COMMAND` - Command used to print invoices (default: `lp`)
//! - `SCHOOLSOFT_VIEW_COMMAND` - Command used to preview invoices (default: `xdg-open`)
//! - `SCHOOLSOFT_LOG_JSON` - Emit JSON logs when set to `1` or `true`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry traces sample rate (default: 0.0)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_PRINT_COMMAND: &str = "lp";
const DEFAULT_VIEW_COMMAND: &str = "xdg-open";
const STATE_DIR_NAME: &str = ".schoolsoft";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Dashboard configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Backend API base URL. Always ends with `/` so relative joins keep the prefix.
    pub api_base_url: Url,
    /// Directory holding the local key-value store.
    pub state_dir: PathBuf,
    /// Per-request timeout.
    pub http_timeout: Duration,
    /// Program invoked with the invoice file path to print it.
    pub print_command: String,
    /// Program invoked with the invoice file path to preview it.
    pub view_command: String,
    /// Emit JSON-formatted logs.
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `SCHOOLSOFT_API_URL` is missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`AdminConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("SCHOOLSOFT_API_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("SCHOOLSOFT_API_URL".to_string()))?;
        let api_base_url = parse_base_url(&raw_url)?;

        let state_dir = lookup("SCHOOLSOFT_STATE_DIR").map_or_else(
            || {
                lookup("HOME")
                    .map_or_else(|| PathBuf::from("."), PathBuf::from)
                    .join(STATE_DIR_NAME)
            },
            PathBuf::from,
        );

        let timeout_secs = lookup("SCHOOLSOFT_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SCHOOLSOFT_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        let print_command = lookup("SCHOOLSOFT_PRINT_COMMAND")
            .filter(|cmd| !cmd.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PRINT_COMMAND.to_string());
        let view_command = lookup("SCHOOLSOFT_VIEW_COMMAND")
            .filter(|cmd| !cmd.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_VIEW_COMMAND.to_string());

        let log_json = lookup("SCHOOLSOFT_LOG_JSON")
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true"));

        let sentry_sample_rate = parse_rate(&lookup, "SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = parse_rate(&lookup, "SENTRY_TRACES_SAMPLE_RATE", 0.0)?;

        Ok(Self {
            api_base_url,
            state_dir,
            http_timeout: Duration::from_secs(timeout_secs),
            print_command,
            view_command,
            log_json,
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Path of the JSON file backing the local key-value store.
    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        self.state_dir.join("storage.json")
    }
}

/// Parse the API base URL, forcing a trailing slash.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };

    let url = Url::parse(&with_slash).map_err(|e| {
        ConfigError::InvalidEnvVar("SCHOOLSOFT_API_URL".to_string(), e.to_string())
    })?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "SCHOOLSOFT_API_URL".to_string(),
            "must be an http(s) URL".to_string(),
        ));
    }

    Ok(url)
}

fn parse_rate(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: f32,
) -> Result<f32, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0.0 and 1.0".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_url() {
        let err = AdminConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "SCHOOLSOFT_API_URL"));
    }

    #[test]
    fn test_defaults() {
        let config = AdminConfig::from_lookup(lookup_from(&[
            ("SCHOOLSOFT_API_URL", "http://localhost:5000/api"),
            ("HOME", "/home/clerk"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url.as_str(), "http://localhost:5000/api/");
        assert_eq!(config.state_dir, PathBuf::from("/home/clerk/.schoolsoft"));
        assert_eq!(
            config.storage_path(),
            PathBuf::from("/home/clerk/.schoolsoft/storage.json")
        );
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.print_command, "lp");
        assert_eq!(config.view_command, "xdg-open");
        assert!(!config.log_json);
        assert!(config.sentry_dsn.is_none());
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_overrides() {
        let config = AdminConfig::from_lookup(lookup_from(&[
            ("SCHOOLSOFT_API_URL", "https://school.example.com/api/"),
            ("SCHOOLSOFT_STATE_DIR", "/var/lib/schoolsoft"),
            ("SCHOOLSOFT_HTTP_TIMEOUT_SECS", "5"),
            ("SCHOOLSOFT_PRINT_COMMAND", "lpr"),
            ("SCHOOLSOFT_LOG_JSON", "true"),
            ("SENTRY_SAMPLE_RATE", "0.25"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url.as_str(), "https://school.example.com/api/");
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/schoolsoft"));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.print_command, "lpr");
        assert!(config.log_json);
        assert!((config.sentry_sample_rate - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_invalid_api_url() {
        let err = AdminConfig::from_lookup(lookup_from(&[("SCHOOLSOFT_API_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));

        let err = AdminConfig::from_lookup(lookup_from(&[(
            "SCHOOLSOFT_API_URL",
            "ftp://files.example.com/api",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = AdminConfig::from_lookup(lookup_from(&[
            ("SCHOOLSOFT_API_URL", "http://localhost:5000/api"),
            ("SCHOOLSOFT_HTTP_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "SCHOOLSOFT_HTTP_TIMEOUT_SECS")
        );
    }

    #[test]
    fn test_sample_rate_out_of_range() {
        let err = AdminConfig::from_lookup(lookup_from(&[
            ("SCHOOLSOFT_API_URL", "http://localhost:5000/api"),
            ("SENTRY_SAMPLE_RATE", "2"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }
}
