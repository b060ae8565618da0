//! Client configuration from environment variables.
//!
//! Load configuration using `Config::from_env()` after calling `dotenvy::dotenv()`.

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_SESSION_FILE: &str = ".sms_session.json";

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Backend API root, without trailing slash
    /// Example: https://sms.example.edu/api
    pub api_base_url: Option<String>,

    /// Where the native client persists the session
    pub session_file: Option<String>,

    /// Per-request timeout in seconds. No timeout when unset.
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable timeouts are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let request_timeout_secs = lookup("SMS_REQUEST_TIMEOUT_SECS").and_then(|raw| {
            let parsed = raw.trim().parse().ok();
            if parsed.is_none() {
                tracing::warn!("Ignoring invalid SMS_REQUEST_TIMEOUT_SECS: {}", raw);
            }
            parsed
        });

        Self {
            api_base_url: lookup("SMS_API_BASE_URL"),
            session_file: lookup("SMS_SESSION_FILE"),
            request_timeout_secs,
        }
    }

    /// Check if a backend URL is configured
    pub fn has_api_base_url(&self) -> bool {
        self.api_base_url.is_some()
    }

    /// Check if a request timeout is configured
    pub fn has_request_timeout(&self) -> bool {
        self.request_timeout_secs.is_some()
    }

    /// Configured backend URL or the local development default
    pub fn api_base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn session_file(&self) -> &str {
        self.session_file
            .as_deref()
            .filter(|path| !path.is_empty())
            .unwrap_or(DEFAULT_SESSION_FILE)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    fn empty() -> Config {
        Config {
            api_base_url: None,
            session_file: None,
            request_timeout_secs: None,
        }
    }

    // ========================================================================
    // Config Struct Tests (no env var dependencies - thread safe)
    // ========================================================================

    #[test]
    fn test_config_with_all_fields() {
        let config = config_from(&[
            ("SMS_API_BASE_URL", "https://sms.example.edu/api"),
            ("SMS_SESSION_FILE", "/tmp/session.json"),
            ("SMS_REQUEST_TIMEOUT_SECS", "15"),
        ]);

        assert_eq!(config.api_base_url(), "https://sms.example.edu/api");
        assert_eq!(config.session_file(), "/tmp/session.json");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
        assert!(config.has_api_base_url());
        assert!(config.has_request_timeout());
    }

    #[test]
    fn test_config_with_no_fields() {
        let config = config_from(&[]);

        assert_eq!(config, empty());
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(config.session_file(), DEFAULT_SESSION_FILE);
        assert!(config.request_timeout().is_none());
        assert!(!config.has_api_base_url());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = config_from(&[("SMS_API_BASE_URL", "http://10.0.0.5:8000/api/")]);
        assert_eq!(config.api_base_url(), "http://10.0.0.5:8000/api");
    }

    #[test]
    fn test_config_with_empty_string_values() {
        // Empty strings still count as "having" the config but fall back to defaults
        let config = config_from(&[("SMS_API_BASE_URL", ""), ("SMS_SESSION_FILE", "")]);

        assert!(config.has_api_base_url());
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(config.session_file(), DEFAULT_SESSION_FILE);
    }

    #[test]
    fn test_invalid_timeout_is_ignored() {
        let config = config_from(&[("SMS_REQUEST_TIMEOUT_SECS", "soon")]);
        assert!(!config.has_request_timeout());

        let zero = config_from(&[("SMS_REQUEST_TIMEOUT_SECS", "0")]);
        assert!(zero.has_request_timeout());
        assert!(zero.request_timeout().is_none());
    }

    #[test]
    fn test_config_from_env_returns_config() {
        // Actual values depend on environment, so we don't assert specific values
        let config = Config::from_env();

        assert!(!config.api_base_url().is_empty());
        assert!(!config.session_file().is_empty());
    }

    #[test]
    fn test_config_default_calls_from_env() {
        assert_eq!(Config::default(), Config::from_env());
    }

    #[test]
    fn test_config_debug() {
        let config = Config {
            api_base_url: Some("http://localhost:8000/api".to_string()),
            ..empty()
        };

        let debug_str = format!("{:?}", config);

        assert!(debug_str.contains("Config"));
        assert!(debug_str.contains("api_base_url"));
        assert!(debug_str.contains("localhost:8000"));
    }
}
