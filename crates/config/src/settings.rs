//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation
    #[default]
    Development,
    /// Staging mode
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Model artifact configuration
    #[serde(default)]
    pub models: ModelConfig,

    /// Upload handling configuration
    #[serde(default)]
    pub upload: UploadConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enforce the configured CORS origin list
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (empty = localhost fallback)
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum accepted upload body size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Model artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Directory holding the per-field ONNX models, the vectorizer,
    /// the label encoders and `metadata.json`
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,

    /// Intra-op threads per ONNX session
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
}

fn default_artifact_dir() -> String {
    "model_artifacts".to_string()
}

fn default_intra_threads() -> usize {
    1
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            intra_threads: default_intra_threads(),
        }
    }
}

/// Upload handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded documents are persisted under
    #[serde(default = "default_upload_dir")]
    pub dir: String,

    /// Strip path components and unsafe characters from client filenames.
    /// Disabling this reproduces the historical verbatim-filename behavior
    /// and its path-traversal exposure; keep it on outside of tests.
    #[serde(default = "default_true")]
    pub sanitize_filenames: bool,
}

fn default_upload_dir() -> String {
    "static/uploads".to_string()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            sanitize_filenames: true,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.artifact_dir.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "models.artifact_dir".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if self.models.intra_threads == 0 {
            return Err(ConfigError::InvalidValue {
                field: "models.intra_threads".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.upload.dir.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "upload.dir".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_upload_bytes".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.environment.is_production() && !self.upload.sanitize_filenames {
            return Err(ConfigError::InvalidValue {
                field: "upload.sanitize_filenames".to_string(),
                message: "must not be disabled in production".to_string(),
            });
        }

        Ok(())
    }
}

/// Load settings from files and environment
///
/// Priority: env vars > `config/{env}.toml` > `config/default.toml` > defaults.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("WIRE_EXTRACT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.models.artifact_dir, "model_artifacts");
        assert_eq!(settings.upload.dir, "static/uploads");
        assert!(settings.upload.sanitize_filenames);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_artifact_dir() {
        let mut settings = Settings::default();
        settings.models.artifact_dir = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_upload_limit() {
        let mut settings = Settings::default();
        settings.server.max_upload_bytes = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_production_requires_sanitized_filenames() {
        let mut settings = Settings::default();
        settings.upload.sanitize_filenames = false;
        assert!(settings.validate().is_ok());

        settings.environment = RuntimeEnvironment::Production;
        assert!(settings.validate().is_err());
    }
}
