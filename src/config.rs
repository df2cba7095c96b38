//! Configuration management for svcscope
//!
//! Settings are loaded from environment variables with sensible defaults;
//! command-line flags override them afterwards.
//!
//! # Environment Variables
//!
//! - `SVCSCOPE_FUZZY_THRESHOLD`: Minimum similarity (0-100) for a fuzzy key match - default: "70"
//! - `SVCSCOPE_FUZZY_FALLBACK`: Run the fuzzy resolver for fields the structural walk missed (true|false) - default: "true"
//! - `SVCSCOPE_LOG_LEVEL`: Logging level - default: "info"
//! - `SVCSCOPE_REQUEST_TIMEOUT`: Timeout in seconds for remote sources - default: "30"
//! - `SVCSCOPE_BITBUCKET_API`: Bitbucket Cloud API base URL - default: "https://api.bitbucket.org/2.0"
//!
//! # Example
//!
//! ```no_run
//! use svcscope::{ExtractorConfig, ServiceExtractor};
//!
//! let config = ExtractorConfig::default();
//! config.validate().expect("Invalid configuration");
//!
//! let extractor = ServiceExtractor::from(&config);
//! ```

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default values for configuration
pub const DEFAULT_FUZZY_THRESHOLD: u8 = crate::extraction::fuzzy::DEFAULT_THRESHOLD;
const DEFAULT_FUZZY_FALLBACK: bool = true;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BITBUCKET_API: &str = "https://api.bitbucket.org/2.0";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Runtime configuration for extraction and remote sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Minimum similarity score for fuzzy key matches
    pub fuzzy_threshold: u8,

    /// Whether empty categories fall back to the fuzzy resolver
    pub fuzzy_fallback: bool,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Base URL of the Bitbucket Cloud REST API
    pub bitbucket_api: String,
}

impl Default for ExtractorConfig {
    /// Loads SVCSCOPE_* environment variables, falling back to defaults
    ///
    /// Unparseable values are ignored here; use [`ExtractorConfig::from_env`]
    /// to surface them as errors.
    fn default() -> Self {
        let fuzzy_threshold = env::var("SVCSCOPE_FUZZY_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<u8>().ok())
            .unwrap_or(DEFAULT_FUZZY_THRESHOLD);

        let fuzzy_fallback = env::var("SVCSCOPE_FUZZY_FALLBACK")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(DEFAULT_FUZZY_FALLBACK);

        let log_level = env::var("SVCSCOPE_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let request_timeout_secs = env::var("SVCSCOPE_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let bitbucket_api = env::var("SVCSCOPE_BITBUCKET_API")
            .unwrap_or_else(|_| DEFAULT_BITBUCKET_API.to_string());

        Self {
            fuzzy_threshold,
            fuzzy_fallback,
            log_level,
            request_timeout_secs,
            bitbucket_api,
        }
    }
}

impl ExtractorConfig {
    /// Like `Default`, but rejects values that are set and unparseable
    pub fn from_env() -> Result<Self, ConfigError> {
        parse_env::<u8>("SVCSCOPE_FUZZY_THRESHOLD")?;
        parse_env::<bool>("SVCSCOPE_FUZZY_FALLBACK")?;
        parse_env::<u64>("SVCSCOPE_REQUEST_TIMEOUT")?;
        Ok(Self::default())
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any value is out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fuzzy_threshold > 100 {
            return Err(ConfigError::ValidationFailed(format!(
                "Fuzzy threshold must be between 0 and 100, got {}",
                self.fuzzy_threshold
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        if !self.bitbucket_api.starts_with("http://") && !self.bitbucket_api.starts_with("https://")
        {
            return Err(ConfigError::ValidationFailed(format!(
                "Bitbucket API URL must be http(s): {}",
                self.bitbucket_api
            )));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Converts configuration to a display map for output formatting
    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert(
            "fuzzy_threshold".to_string(),
            self.fuzzy_threshold.to_string(),
        );
        map.insert("fuzzy_fallback".to_string(), self.fuzzy_fallback.to_string());
        map.insert("log_level".to_string(), self.log_level.clone());
        map.insert(
            "request_timeout_secs".to_string(),
            self.request_timeout_secs.to_string(),
        );
        map.insert("bitbucket_api".to_string(), self.bitbucket_api.clone());

        map
    }
}

fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::ParseError {
                field: key.to_string(),
                error: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

impl fmt::Display for ExtractorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Svcscope Configuration:")?;
        writeln!(f, "  Fuzzy Threshold: {}", self.fuzzy_threshold)?;
        writeln!(f, "  Fuzzy Fallback: {}", self.fuzzy_fallback)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Bitbucket API: {}", self.bitbucket_api)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn sample() -> ExtractorConfig {
        ExtractorConfig {
            fuzzy_threshold: 70,
            fuzzy_fallback: true,
            log_level: "info".to_string(),
            request_timeout_secs: 30,
            bitbucket_api: DEFAULT_BITBUCKET_API.to_string(),
        }
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = vec![
            EnvGuard::unset("SVCSCOPE_FUZZY_THRESHOLD"),
            EnvGuard::unset("SVCSCOPE_FUZZY_FALLBACK"),
            EnvGuard::unset("SVCSCOPE_LOG_LEVEL"),
            EnvGuard::unset("SVCSCOPE_REQUEST_TIMEOUT"),
            EnvGuard::unset("SVCSCOPE_BITBUCKET_API"),
        ];

        let config = ExtractorConfig::default();

        assert_eq!(config, sample());
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = vec![
            EnvGuard::set("SVCSCOPE_FUZZY_THRESHOLD", "85"),
            EnvGuard::set("SVCSCOPE_FUZZY_FALLBACK", "false"),
            EnvGuard::set("SVCSCOPE_LOG_LEVEL", "DEBUG"),
            EnvGuard::set("SVCSCOPE_REQUEST_TIMEOUT", "60"),
            EnvGuard::set("SVCSCOPE_BITBUCKET_API", "http://localhost:9999"),
        ];

        let config = ExtractorConfig::default();

        assert_eq!(config.fuzzy_threshold, 85);
        assert!(!config.fuzzy_fallback);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.bitbucket_api, "http://localhost:9999");
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_fall_back_in_default() {
        let _guards = vec![
            EnvGuard::set("SVCSCOPE_FUZZY_THRESHOLD", "high"),
            EnvGuard::set("SVCSCOPE_FUZZY_FALLBACK", "maybe"),
        ];

        let config = ExtractorConfig::default();
        assert_eq!(config.fuzzy_threshold, DEFAULT_FUZZY_THRESHOLD);
        assert!(config.fuzzy_fallback);
    }

    #[test]
    #[serial]
    fn test_from_env_reports_parse_errors() {
        let _guard = EnvGuard::set("SVCSCOPE_FUZZY_THRESHOLD", "high");

        match ExtractorConfig::from_env() {
            Err(ConfigError::ParseError { field, .. }) => {
                assert_eq!(field, "SVCSCOPE_FUZZY_THRESHOLD")
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_configuration_validation_invalid_threshold() {
        let mut config = sample();
        config.fuzzy_threshold = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configuration_validation_invalid_timeout() {
        let mut config = sample();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configuration_validation_invalid_log_level() {
        let mut config = sample();
        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configuration_validation_invalid_api_url() {
        let mut config = sample();
        config.bitbucket_api = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_display_map() {
        let map = sample().to_display_map();
        assert_eq!(map.get("fuzzy_threshold").map(String::as_str), Some("70"));
        assert_eq!(map.get("fuzzy_fallback").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_config_display() {
        let display = format!("{}", sample());
        assert!(display.contains("Svcscope Configuration:"));
        assert!(display.contains("Fuzzy Threshold: 70"));
    }
}
