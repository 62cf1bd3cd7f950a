//! Configuration for the validator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (toml-schema.toml)
//! - Environment variables (TOML_SCHEMA__*)
//!
//! ## Example config file (toml-schema.toml):
//! ```toml
//! [validation]
//! max_depth = 128
//! render_limit = 80
//!
//! [logging]
//! filter = "warn"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::{ValidateOptions, DEFAULT_MAX_DEPTH, DEFAULT_RENDER_LIMIT};

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Validation settings
    #[serde(default)]
    pub validation: ValidationSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Maximum nesting of schema elements entered while validating
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Schema renderings longer than this are left out of error messages
    #[serde(default = "default_render_limit")]
    pub render_limit: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_render_limit() -> usize {
    DEFAULT_RENDER_LIMIT
}

fn default_filter() -> String {
    "warn".to_string()
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            render_limit: default_render_limit(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl Settings {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a required file on top of the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["toml-schema", ".toml-schema"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(dirs) = directories::ProjectDirs::from("dev", "toml-schema", "toml-schema") {
            let xdg_config = dirs.config_dir().join("toml-schema.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // TOML_SCHEMA__VALIDATION__MAX_DEPTH=64
        builder = builder.add_source(
            Environment::with_prefix("TOML_SCHEMA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Validation options carrying these settings
    pub fn validate_options(&self) -> ValidateOptions {
        ValidateOptions::default()
            .with_max_depth(self.validation.max_depth)
            .with_render_limit(self.validation.render_limit)
    }
}
