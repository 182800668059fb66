use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the config store, analytics and certificates
    pub data: String,
    /// Directory holding content type definitions
    pub content: String,
}

/// Settings for the external compile step used by `ponzu build` and `ponzu run`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// File name of the compiled server binary
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Package path handed to the compiler
    #[serde(default = "default_package")]
    pub package: String,
}

fn default_binary() -> String {
    "ponzu-server".to_string()
}

fn default_package() -> String {
    "./cmd/ponzu".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            package: default_package(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Fixed local port for self-signed development HTTPS
    #[serde(default = "default_dev_port")]
    pub dev_port: u16,
    /// Certificate directory (empty = `<data>/tls`)
    #[serde(default)]
    pub cert_dir: String,
}

fn default_dev_port() -> u16 {
    10443
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            dev_port: default_dev_port(),
            cert_dir: String::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether `serve` writes its log to `<data>/logs` instead of stderr
    #[serde(default)]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
        }
    }
}

impl Config {
    /// Path to the project config file in the working directory
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("ponzu.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so ponzu works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let project_config = Self::project_config_path();
        if project_config.exists() {
            builder = builder.add_source(config::File::from(project_config));
        }

        // User config in ~/.config/ponzu/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("ponzu").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with PONZU_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("PONZU")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Get absolute path to the data directory
    pub fn data_path(&self) -> PathBuf {
        absolute(&self.paths.data)
    }

    /// Get absolute path to the content directory
    pub fn content_path(&self) -> PathBuf {
        absolute(&self.paths.content)
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.data_path().join("logs")
    }

    /// File backing the config store
    pub fn store_path(&self) -> PathBuf {
        self.data_path().join("system.json")
    }

    pub fn analytics_path(&self) -> PathBuf {
        self.data_path().join("analytics")
    }

    pub fn cert_path(&self) -> PathBuf {
        if self.tls.cert_dir.is_empty() {
            self.data_path().join("tls")
        } else {
            absolute(&self.tls.cert_dir)
        }
    }
}

fn absolute(path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                data: ".ponzu".to_string(),
                content: "content".to_string(),
            },
            build: BuildConfig::default(),
            tls: TlsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
