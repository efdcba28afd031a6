//! Configuration module for the demo client.
//!
//! Two kinds of configuration live here:
//!
//! - [`Config`]: the four values a user types into the demo form (API key,
//!   activation key, stream key, JSON body). It is an immutable snapshot handed
//!   to every operation.
//! - [`EndpointConfig`]: where requests go and how long they may take, loaded
//!   from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

/// Default base URL of the A2G listener
const DEFAULT_BASE_URL: &str = "https://listen.a2g.io";

/// Path of the edge bot activation endpoint
pub const ACTIVATION_PATH: &str = "/triggeralert/alert";

/// Path of the input stream ingestion endpoint
pub const STREAM_PATH: &str = "/v1/production/inputstream";

/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Minimum request timeout
const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;

/// Maximum request timeout
const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// The values supplied by the demo form.
///
/// No field is validated; an empty key is submitted as-is and the server
/// decides what to make of it.
///
/// Environment variables read by [`Config::from_env`]:
/// - `A2G_API_KEY`: value of the `X-API-KEY` header
/// - `A2G_ACTIVATION_KEY`: edge bot activation key
/// - `A2G_STREAM_KEY`: input stream key
/// - `A2G_JSON_BODY`: free-form JSON body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// API key attached to every request
    pub api_key: String,

    /// Edge bot activation key
    pub activation_key: String,

    /// Input stream key
    pub stream_key: String,

    /// Free-form JSON body, passed through verbatim
    pub json_body: String,
}

impl Config {
    /// Create a config from the four form values.
    pub fn new(
        api_key: impl Into<String>,
        activation_key: impl Into<String>,
        stream_key: impl Into<String>,
        json_body: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            activation_key: activation_key.into(),
            stream_key: stream_key.into(),
            json_body: json_body.into(),
        }
    }

    /// Load the form values from environment variables.
    ///
    /// Missing variables become empty strings.
    pub fn from_env() -> Self {
        let read = |key: &str| env::var(key).unwrap_or_default();

        Self {
            api_key: read("A2G_API_KEY"),
            activation_key: read("A2G_ACTIVATION_KEY"),
            stream_key: read("A2G_STREAM_KEY"),
            json_body: read("A2G_JSON_BODY"),
        }
    }
}

/// Endpoint settings for the HTTP delivery client.
///
/// Environment variables:
/// - `A2G_BASE_URL`: listener base URL (default: https://listen.a2g.io)
/// - `A2G_REQUEST_TIMEOUT_SECS`: HTTP request timeout (default: 30)
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Base URL without trailing slash
    pub base_url: String,

    /// Path of the activation endpoint
    pub activation_path: String,

    /// Path of the stream ingestion endpoint
    pub stream_path: String,

    /// HTTP request timeout duration
    pub request_timeout: Duration,
}

/// Error type for configuration loading failures
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub env_var: Option<String>,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.env_var {
            Some(var) => write!(f, "Configuration error for {}: {}", var, self.message),
            None => write!(f, "Configuration error: {}", self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl EndpointConfig {
    /// Load endpoint settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `A2G_REQUEST_TIMEOUT_SECS` is not a number or
    /// falls outside the accepted range.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("A2G_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();

        let request_timeout = Duration::from_secs(Self::parse_request_timeout()?);

        Ok(Self {
            base_url,
            activation_path: ACTIVATION_PATH.to_string(),
            stream_path: STREAM_PATH.to_string(),
            request_timeout,
        })
    }

    /// Create endpoint settings for a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Full URL of the activation endpoint.
    pub fn activation_url(&self) -> String {
        format!("{}{}", self.base_url, self.activation_path)
    }

    /// Full URL of the stream ingestion endpoint.
    pub fn stream_url(&self) -> String {
        format!("{}{}", self.base_url, self.stream_path)
    }

    fn parse_request_timeout() -> Result<u64, ConfigError> {
        let env_var = "A2G_REQUEST_TIMEOUT_SECS";

        match env::var(env_var) {
            Ok(value) => {
                let secs: u64 = value.parse().map_err(|_| ConfigError {
                    message: format!("'{}' is not a valid number", value),
                    env_var: Some(env_var.to_string()),
                })?;

                if secs < MIN_REQUEST_TIMEOUT_SECS {
                    return Err(ConfigError {
                        message: format!(
                            "request timeout {} is below minimum ({}s)",
                            secs, MIN_REQUEST_TIMEOUT_SECS
                        ),
                        env_var: Some(env_var.to_string()),
                    });
                }

                if secs > MAX_REQUEST_TIMEOUT_SECS {
                    return Err(ConfigError {
                        message: format!(
                            "request timeout {} exceeds maximum ({}s)",
                            secs, MAX_REQUEST_TIMEOUT_SECS
                        ),
                        env_var: Some(env_var.to_string()),
                    });
                }

                Ok(secs)
            }
            Err(_) => Ok(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            activation_path: ACTIVATION_PATH.to_string(),
            stream_path: STREAM_PATH.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Tests in this module mutate process-wide environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct EnvGuard {
        key: String,
        original: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let original = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                original,
            }
        }

        fn remove(key: &str) -> Self {
            let original = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                original,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.original {
                Some(val) => env::set_var(&self.key, val),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn lock() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_default_endpoint_config() {
        let config = EndpointConfig::default();
        assert_eq!(config.base_url, "https://listen.a2g.io");
        assert_eq!(
            config.activation_url(),
            "https://listen.a2g.io/triggeralert/alert"
        );
        assert_eq!(
            config.stream_url(),
            "https://listen.a2g.io/v1/production/inputstream"
        );
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_with_base_url_trims_slash() {
        let config = EndpointConfig::with_base_url("http://localhost:9000/");
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(
            config.stream_url(),
            "http://localhost:9000/v1/production/inputstream"
        );
    }

    #[test]
    fn test_endpoint_from_env_with_defaults() {
        let _lock = lock();
        let _guard1 = EnvGuard::remove("A2G_BASE_URL");
        let _guard2 = EnvGuard::remove("A2G_REQUEST_TIMEOUT_SECS");

        let config = EndpointConfig::from_env().expect("Should load with defaults");
        assert_eq!(config.base_url, "https://listen.a2g.io");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_endpoint_from_env_custom_values() {
        let _lock = lock();
        let _guard1 = EnvGuard::set("A2G_BASE_URL", "http://custom:9000/");
        let _guard2 = EnvGuard::set("A2G_REQUEST_TIMEOUT_SECS", "10");

        let config = EndpointConfig::from_env().expect("Should load custom values");
        assert_eq!(config.base_url, "http://custom:9000");
        assert_eq!(
            config.activation_url(),
            "http://custom:9000/triggeralert/alert"
        );
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_request_timeout() {
        let _lock = lock();
        let _guard = EnvGuard::set("A2G_REQUEST_TIMEOUT_SECS", "soon");

        let err = EndpointConfig::from_env().unwrap_err();
        assert!(err.message.contains("not a valid number"));
        assert_eq!(err.env_var.as_deref(), Some("A2G_REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn test_request_timeout_out_of_range() {
        let _lock = lock();
        {
            let _guard = EnvGuard::set("A2G_REQUEST_TIMEOUT_SECS", "0");
            let err = EndpointConfig::from_env().unwrap_err();
            assert!(err.message.contains("below minimum"));
        }
        {
            let _guard = EnvGuard::set("A2G_REQUEST_TIMEOUT_SECS", "999");
            let err = EndpointConfig::from_env().unwrap_err();
            assert!(err.message.contains("exceeds maximum"));
        }
    }

    #[test]
    fn test_config_from_env_missing_values_are_empty() {
        let _lock = lock();
        let _guard1 = EnvGuard::set("A2G_API_KEY", "k");
        let _guard2 = EnvGuard::remove("A2G_ACTIVATION_KEY");
        let _guard3 = EnvGuard::set("A2G_STREAM_KEY", "s");
        let _guard4 = EnvGuard::remove("A2G_JSON_BODY");

        let config = Config::from_env();
        assert_eq!(config, Config::new("k", "", "s", ""));
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError {
            message: "test error".to_string(),
            env_var: Some("TEST_VAR".to_string()),
        };
        assert_eq!(
            format!("{}", error),
            "Configuration error for TEST_VAR: test error"
        );

        let error_no_var = ConfigError {
            message: "general error".to_string(),
            env_var: None,
        };
        assert_eq!(
            format!("{}", error_no_var),
            "Configuration error: general error"
        );
    }
}
