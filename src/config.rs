//! Configuration management for SmartMeal
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, SmartMealError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for SmartMeal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote service settings
    #[serde(default)]
    pub service: ServiceConfig,
    /// Where the session is persisted
    #[serde(default)]
    pub session: SessionConfig,
    /// View and controller behavior
    #[serde(default)]
    pub ui: UiConfig,
}

/// Remote service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL every endpoint is resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    ///
    /// `None` means requests may wait indefinitely, which is how the
    /// service has always been called.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Send the saved token as a bearer header on scan and plan requests
    ///
    /// Off by default: the service has never received the token on those
    /// endpoints, and turning this on changes what goes over the wire.
    #[serde(default)]
    pub attach_token: bool,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: None,
            attach_token: false,
        }
    }
}

/// Session persistence backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackendKind {
    /// Plain JSON file in the user's data directory
    #[default]
    File,
    /// OS native credential store
    Keyring,
    /// In-process only; forgotten on exit
    Memory,
}

impl std::str::FromStr for SessionBackendKind {
    type Err = SmartMealError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            other => Err(SmartMealError::Config(format!(
                "Invalid session backend: {}. Must be one of: file, keyring, memory",
                other
            ))),
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Backend holding the `token` and `username` entries
    #[serde(default)]
    pub backend: SessionBackendKind,

    /// Override for the file backend location
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// What a controller does with a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Write the failure to the log only; the view shows nothing
    #[default]
    Log,
    /// Log the failure and keep its message for the view to display
    Surface,
}

impl std::str::FromStr for ErrorPolicy {
    type Err = SmartMealError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "surface" => Ok(Self::Surface),
            other => Err(SmartMealError::Config(format!(
                "Invalid error policy: {}. Must be one of: log, surface",
                other
            ))),
        }
    }
}

/// View and controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Failure handling for food scans
    #[serde(default)]
    pub capture_errors: ErrorPolicy,

    /// Failure handling for plan generation
    #[serde(default)]
    pub plan_errors: ErrorPolicy,

    /// Initial value of the plan target input
    #[serde(default = "default_calorie_target")]
    pub default_calorie_target: u32,

    /// Initial value of the sign-up goal field
    #[serde(default = "default_calorie_target")]
    pub default_calorie_goal: u32,
}

fn default_calorie_target() -> u32 {
    2000
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            capture_errors: ErrorPolicy::default(),
            plan_errors: ErrorPolicy::default(),
            default_calorie_target: default_calorie_target(),
            default_calorie_goal: default_calorie_target(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SmartMealError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| SmartMealError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("SMARTMEAL_BASE_URL") {
            self.service.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("SMARTMEAL_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.service.timeout_seconds = Some(value);
            } else {
                tracing::warn!("Invalid SMARTMEAL_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(attach) = std::env::var("SMARTMEAL_ATTACH_TOKEN") {
            if let Ok(value) = attach.parse() {
                self.service.attach_token = value;
            } else {
                tracing::warn!("Invalid SMARTMEAL_ATTACH_TOKEN: {}", attach);
            }
        }

        if let Ok(backend) = std::env::var("SMARTMEAL_SESSION_BACKEND") {
            match backend.parse() {
                Ok(value) => self.session.backend = value,
                Err(e) => tracing::warn!("Ignoring SMARTMEAL_SESSION_BACKEND: {}", e),
            }
        }

        if let Ok(path) = std::env::var("SMARTMEAL_SESSION_PATH") {
            self.session.path = Some(PathBuf::from(path));
        }

        if let Ok(policy) = std::env::var("SMARTMEAL_CAPTURE_ERRORS") {
            match policy.parse() {
                Ok(value) => self.ui.capture_errors = value,
                Err(e) => tracing::warn!("Ignoring SMARTMEAL_CAPTURE_ERRORS: {}", e),
            }
        }

        if let Ok(policy) = std::env::var("SMARTMEAL_PLAN_ERRORS") {
            match policy.parse() {
                Ok(value) => self.ui.plan_errors = value,
                Err(e) => tracing::warn!("Ignoring SMARTMEAL_PLAN_ERRORS: {}", e),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.base_url {
            tracing::debug!("Using base URL override: {}", base_url);
            self.service.base_url = base_url.clone();
        }

        if cli.ephemeral {
            tracing::debug!("Ephemeral session requested");
            self.session.backend = SessionBackendKind::Memory;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.service.base_url).map_err(|e| {
            SmartMealError::Config(format!(
                "Invalid service.base_url {}: {}",
                self.service.base_url, e
            ))
        })?;

        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(SmartMealError::Config(format!(
                "service.base_url must be an http(s) URL, got {}",
                self.service.base_url
            ))
            .into());
        }

        if self.service.timeout_seconds == Some(0) {
            return Err(SmartMealError::Config(
                "service.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.ui.default_calorie_target == 0 {
            return Err(SmartMealError::Config(
                "ui.default_calorie_target must be greater than 0".to_string(),
            )
            .into());
        }

        if self.ui.default_calorie_goal == 0 {
            return Err(SmartMealError::Config(
                "ui.default_calorie_goal must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn cli() -> crate::cli::Cli {
        crate::cli::Cli::default()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.service.timeout_seconds, None);
        assert!(!config.service.attach_token);
        assert_eq!(config.session.backend, SessionBackendKind::File);
        assert_eq!(config.ui.capture_errors, ErrorPolicy::Log);
        assert_eq!(config.ui.plan_errors, ErrorPolicy::Log);
        assert_eq!(config.ui.default_calorie_target, 2000);
        assert_eq!(config.ui.default_calorie_goal, 2000);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_bad_url() {
        let mut config = Config::default();
        config.service.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.service.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.service.timeout_seconds = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_target() {
        let mut config = Config::default();
        config.ui.default_calorie_target = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
service:
  base_url: "https://meals.example.com"
  timeout_seconds: 30
  attach_token: true
session:
  backend: keyring
ui:
  capture_errors: surface
  default_calorie_target: 1800
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.service.base_url, "https://meals.example.com");
        assert_eq!(config.service.timeout_seconds, Some(30));
        assert!(config.service.attach_token);
        assert_eq!(config.session.backend, SessionBackendKind::Keyring);
        assert_eq!(config.ui.capture_errors, ErrorPolicy::Surface);
        assert_eq!(config.ui.plan_errors, ErrorPolicy::Log);
        assert_eq!(config.ui.default_calorie_target, 1800);
        assert_eq!(config.ui.default_calorie_goal, 2000);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.service.base_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn test_parse_error_policy() {
        assert_eq!("LOG".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::Log);
        assert_eq!(
            "surface".parse::<ErrorPolicy>().unwrap(),
            ErrorPolicy::Surface
        );
        assert!("shout".parse::<ErrorPolicy>().is_err());
    }

    #[test]
    fn test_parse_session_backend() {
        assert_eq!(
            "memory".parse::<SessionBackendKind>().unwrap(),
            SessionBackendKind::Memory
        );
        assert!("cookie".parse::<SessionBackendKind>().is_err());
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        let config = Config::load("nonexistent.yaml", &cli()).unwrap();
        assert_eq!(config.ui.default_calorie_target, 2000);
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_overrides_fields() {
        std::env::set_var("SMARTMEAL_BASE_URL", "http://10.0.0.2:9000");
        std::env::set_var("SMARTMEAL_TIMEOUT_SECONDS", "15");
        std::env::set_var("SMARTMEAL_ATTACH_TOKEN", "true");
        std::env::set_var("SMARTMEAL_SESSION_BACKEND", "memory");
        std::env::set_var("SMARTMEAL_PLAN_ERRORS", "surface");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("SMARTMEAL_BASE_URL");
        std::env::remove_var("SMARTMEAL_TIMEOUT_SECONDS");
        std::env::remove_var("SMARTMEAL_ATTACH_TOKEN");
        std::env::remove_var("SMARTMEAL_SESSION_BACKEND");
        std::env::remove_var("SMARTMEAL_PLAN_ERRORS");

        assert_eq!(config.service.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.service.timeout_seconds, Some(15));
        assert!(config.service.attach_token);
        assert_eq!(config.session.backend, SessionBackendKind::Memory);
        assert_eq!(config.ui.plan_errors, ErrorPolicy::Surface);
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_are_ignored() {
        std::env::set_var("SMARTMEAL_TIMEOUT_SECONDS", "soon");
        std::env::set_var("SMARTMEAL_CAPTURE_ERRORS", "scream");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("SMARTMEAL_TIMEOUT_SECONDS");
        std::env::remove_var("SMARTMEAL_CAPTURE_ERRORS");

        assert_eq!(config.service.timeout_seconds, None);
        assert_eq!(config.ui.capture_errors, ErrorPolicy::Log);
    }

    #[test]
    fn test_cli_overrides() {
        let mut cli = cli();
        cli.base_url = Some("http://localhost:1234".to_string());
        cli.ephemeral = true;

        let mut config = Config::default();
        config.apply_cli_overrides(&cli);

        assert_eq!(config.service.base_url, "http://localhost:1234");
        assert_eq!(config.session.backend, SessionBackendKind::Memory);
    }
}
