//! Configuration management for the rainfall predictor

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Environment variable overriding the configuration file location
pub const CONFIG_PATH_ENV: &str = "RAINFALL_CONFIG";

/// Classifier artifact format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// Pick from the file extension (`.onnx` or `.json`)
    #[default]
    Auto,
    /// ONNX export run through ONNX Runtime
    Onnx,
    /// Native JSON logistic model
    Native,
}

/// Page layout
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Sidebar inputs, single result area
    #[default]
    Classic,
    /// Column cards with decorative animations and a per-session result
    Animated,
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub ui: UiConfig,
    pub animations: AnimationConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

/// Classifier artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the classifier artifact
    pub path: PathBuf,
    #[serde(default)]
    pub format: ModelFormat,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub layout: Layout,
    /// Page title
    pub title: String,
    /// Maximum number of sessions whose last result is kept
    #[serde(default = "default_session_capacity")]
    pub session_capacity: usize,
}

fn default_session_capacity() -> usize {
    1024
}

/// Decorative animation sources (animated layout only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    pub enabled: bool,
    pub rain_url: String,
    pub sun_url: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Seconds before a failed fetch is attempted again
    #[serde(default = "default_retry_after_secs")]
    pub retry_after_secs: u64,
}

fn default_retry_after_secs() -> u64 {
    60
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between periodic summaries, 0 disables them
    pub report_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from `$RAINFALL_CONFIG` or the default path.
    ///
    /// Missing files fall back to the built-in defaults; `RAINFALL__SECTION__KEY`
    /// environment variables override both.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from_path(path),
            Err(_) => Self::build(File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false)),
        }
    }

    /// Load configuration from a specific path, which must exist
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::build(File::from(path.as_ref()).required(true))
    }

    fn build(file: File<config::FileSourceFile, config::FileFormat>) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("Failed to serialize default configuration")?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(Environment::with_prefix("RAINFALL").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8501,
            },
            model: ModelConfig {
                path: PathBuf::from("models/rainfall_prediction_model.json"),
                format: ModelFormat::Auto,
                onnx_threads: 1,
            },
            ui: UiConfig {
                layout: Layout::Classic,
                title: "Rainfall Prediction Web App".to_string(),
                session_capacity: default_session_capacity(),
            },
            animations: AnimationConfig {
                enabled: true,
                rain_url: "https://assets2.lottiefiles.com/packages/lf20_jmBauI.json".to_string(),
                sun_url: "https://assets9.lottiefiles.com/packages/lf20_xlky4kvh.json".to_string(),
                timeout_ms: 2000,
                retry_after_secs: default_retry_after_secs(),
            },
            metrics: MetricsConfig {
                report_interval_secs: 300,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.model.format, ModelFormat::Auto);
        assert_eq!(config.ui.layout, Layout::Classic);
        assert!(config.animations.enabled);
        assert_eq!(config.server.bind_addr().unwrap().port(), 8501);
    }

    #[test]
    fn test_load_from_path_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9000

[model]
path = "models/custom.onnx"

[ui]
layout = "animated"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.model.path, PathBuf::from("models/custom.onnx"));
        assert_eq!(config.ui.layout, Layout::Animated);
        assert_eq!(config.ui.session_capacity, 1024);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_explicit_path_fails() {
        assert!(AppConfig::load_from_path("config/does-not-exist.toml").is_err());
    }
}
