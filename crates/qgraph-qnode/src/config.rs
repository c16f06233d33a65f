//! Configuration for quantum nodes.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with QGRAPH_ prefix)
//! 3. .env files
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::gradient::{DEFAULT_FINITE_DIFF_STEP, DEFAULT_SHIFT, DiffMethod, GradientOptions};

/// Complete quantum node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QNodeConfig {
    /// Gradient method.
    #[serde(default)]
    pub diff_method: DiffMethod,

    /// Shift of the parameter-shift rule.
    #[serde(default = "default_shift")]
    pub shift: f64,

    /// Step of the central finite difference.
    #[serde(default = "default_finite_diff_step")]
    pub finite_diff_step: f64,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "console" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_shift() -> f64 {
    DEFAULT_SHIFT
}

fn default_finite_diff_step() -> f64 {
    DEFAULT_FINITE_DIFF_STEP
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

impl Default for QNodeConfig {
    fn default() -> Self {
        Self {
            diff_method: DiffMethod::default(),
            shift: default_shift(),
            finite_diff_step: default_finite_diff_step(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl QNodeConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: QNodeConfig = serde_yaml_ng::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load .env file if it exists
    /// 2. Load from file if provided
    /// 3. Apply environment variable overrides
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = if let Some(path) = config_file {
            Self::from_file(path)?
        } else {
            QNodeConfig::default()
        };

        let config = config.merge_env();

        config.validate()?;
        Ok(config)
    }

    /// Merge environment variables into this configuration.
    ///
    /// Only variables that are set override the current values. Values that
    /// fail to parse are ignored.
    fn merge_env(mut self) -> Self {
        if let Ok(v) = std::env::var("QGRAPH_DIFF_METHOD") {
            if let Ok(method) = v.parse() {
                self.diff_method = method;
            }
        }
        if let Ok(v) = std::env::var("QGRAPH_SHIFT") {
            if let Ok(val) = v.parse() {
                self.shift = val;
            }
        }
        if let Ok(v) = std::env::var("QGRAPH_FINITE_DIFF_STEP") {
            if let Ok(val) = v.parse() {
                self.finite_diff_step = val;
            }
        }
        if let Ok(v) = std::env::var("QGRAPH_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("QGRAPH_LOG_FORMAT") {
            self.logging.format = v;
        }
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // sin(s) is the denominator of the shift rule
        if !self.shift.is_finite() || self.shift.sin().abs() < 1e-6 {
            return Err(ConfigError::ValidationError(format!(
                "Invalid parameter shift: {}",
                self.shift
            )));
        }

        if !self.finite_diff_step.is_finite() || self.finite_diff_step <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "finite_diff_step must be positive, got {}",
                self.finite_diff_step
            )));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {other}"
                )));
            }
        }

        match self.logging.format.as_str() {
            "console" | "json" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {other}"
                )));
            }
        }

        Ok(())
    }

    /// Gradient options described by this configuration.
    pub fn gradient_options(&self) -> GradientOptions {
        GradientOptions {
            method: self.diff_method,
            shift: self.shift,
            finite_diff_step: self.finite_diff_step,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
