use config::{self, File};
use log::{debug, error, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use crate::converter::ExpansionPolicy;
use crate::error::{PromRemoteError, Result};
use crate::label::LabelPair;

/// Environment variable prefix, e.g. `PROMREMOTE_WRITE_URL`
pub const ENV_PREFIX: &str = "PROMREMOTE";

/// Default remote write endpoint
pub const DEFAULT_WRITE_URL: &str = "http://localhost:7201/api/v1/prom/remote/write";

/// Application configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Remote write endpoint
    pub write_url: String,
    /// Logging level
    pub log_level: LogLevel,
    /// How histograms and summaries are expanded
    pub expansion: ExpansionPolicy,
    /// Labels for the manual datapoint
    pub labels: Vec<LabelPair>,
    /// Headers to set on write requests
    pub headers: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            write_url: DEFAULT_WRITE_URL.to_string(),
            log_level: LogLevel::default(),
            expansion: ExpansionPolicy::default(),
            labels: Vec::new(),
            headers: HashMap::new(),
        }
    }
}

/// Logging level
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

/// Source of configuration
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// File path, format taken from the extension
    File(String),
    /// Environment variables with a prefix
    Environment(String),
    /// TOML string
    Toml(String),
    /// Default configuration
    Defaults,
}

fn file_format(path: &Path) -> Result<config::FileFormat> {
    let extension = match path.extension() {
        Some(ext) => ext.to_string_lossy().to_lowercase(),
        None => {
            error!("Configuration file has no extension");
            return Err(PromRemoteError::Config(format!(
                "Configuration file has no extension: {}",
                path.display()
            )));
        }
    };

    match extension.as_str() {
        "toml" => Ok(config::FileFormat::Toml),
        "json" => Ok(config::FileFormat::Json),
        "yaml" | "yml" => Ok(config::FileFormat::Yaml),
        format => {
            error!("Unsupported configuration format: {}", format);
            Err(PromRemoteError::Config(format!(
                "Unsupported config format: {}",
                format
            )))
        }
    }
}

/// Load configuration from sources, later sources overriding earlier ones.
///
/// Missing files are skipped with a warning.
pub fn load_config<T>(sources: Vec<ConfigSource>) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Debug,
{
    let mut builder = config::Config::builder();

    for source in sources {
        match source {
            ConfigSource::File(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    warn!("Configuration file not found: {}", path.display());
                    continue;
                }

                debug!("Loading configuration from file: {}", path.display());
                let format = file_format(&path)?;
                builder = builder.add_source(File::with_name(&path.to_string_lossy()).format(format));
            }
            ConfigSource::Environment(prefix) => {
                debug!("Loading configuration from environment with prefix: {}", prefix);
                builder = builder.add_source(
                    config::Environment::with_prefix(&prefix)
                        .prefix_separator("_")
                        .separator("__")
                        .try_parsing(true),
                );
            }
            ConfigSource::Toml(toml_str) => {
                debug!("Loading configuration from TOML string");
                builder = builder.add_source(File::from_str(&toml_str, config::FileFormat::Toml));
            }
            ConfigSource::Defaults => {
                debug!("Using default configuration values");
            }
        }
    }

    let config = builder
        .build()
        .map_err(|e| PromRemoteError::Config(format!("Failed to build configuration: {}", e)))?;

    let result = config.try_deserialize().map_err(|e| {
        PromRemoteError::Config(format!("Failed to deserialize configuration: {}", e))
    })?;

    debug!("Configuration loaded successfully: {:?}", result);

    Ok(result)
}

/// Load application configuration from a single file.
///
/// Unlike [`load_config`], a missing file is an error.
pub fn load_config_file<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    debug!("Loading configuration from {}", path.display());

    if !path.exists() {
        error!("Configuration file {} does not exist", path.display());
        return Err(PromRemoteError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }
    file_format(path)?;

    load_config(vec![ConfigSource::File(
        path.to_string_lossy().to_string(),
    )])
}

/// Configuration builder
pub struct ConfigBuilder<T: for<'de> Deserialize<'de>> {
    sources: Vec<ConfigSource>,
    _marker: std::marker::PhantomData<T>,
}

impl<T: for<'de> Deserialize<'de> + Debug> ConfigBuilder<T> {
    /// Create a new config builder
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Add a file source
    pub fn add_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sources
            .push(ConfigSource::File(path.as_ref().to_string_lossy().to_string()));
        self
    }

    /// Add environment variables
    pub fn add_env(mut self, prefix: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Environment(prefix.into()));
        self
    }

    /// Add TOML string
    pub fn add_toml(mut self, toml: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Toml(toml.into()));
        self
    }

    /// Use default values
    pub fn use_defaults(mut self) -> Self {
        self.sources.push(ConfigSource::Defaults);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<T> {
        load_config::<T>(self.sources)
    }
}

impl<T: for<'de> Deserialize<'de> + Debug> Default for ConfigBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults() {
        let config = ConfigBuilder::<AppConfig>::new().use_defaults().build().unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.write_url, DEFAULT_WRITE_URL);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.expansion, ExpansionPolicy::Decompose);
    }

    #[test]
    fn test_load_from_toml_string() {
        let toml_str = r#"
        write_url = "http://prometheus:9090/api/v1/write"
        log_level = "debug"
        expansion = "sum_only"

        [[labels]]
        name = "__name__"
        value = "manual"

        [headers]
        x-scope-orgid = "tenant-1"
        "#;

        let config = ConfigBuilder::<AppConfig>::new()
            .add_toml(toml_str)
            .build()
            .unwrap();

        assert_eq!(config.write_url, "http://prometheus:9090/api/v1/write");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.expansion, ExpansionPolicy::SumOnly);
        assert_eq!(config.labels, vec![LabelPair::new("__name__", "manual")]);
        assert_eq!(config.headers["x-scope-orgid"], "tenant-1");
    }

    #[test]
    fn test_multiple_sources() {
        let toml_str1 = r#"
        write_url = "http://first/write"
        log_level = "warn"
        "#;

        let toml_str2 = r#"
        write_url = "http://second/write"
        "#;

        let config = ConfigBuilder::<AppConfig>::new()
            .add_toml(toml_str1)
            .add_toml(toml_str2)
            .build()
            .unwrap();

        assert_eq!(config.write_url, "http://second/write");
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"write_url": "http://json/write", "log_level": "trace"}}"#).unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.write_url, "http://json/write");
        assert_eq!(config.log_level, LogLevel::Trace);
    }

    #[test]
    fn test_missing_file_is_skipped_by_builder() {
        let config = ConfigBuilder::<AppConfig>::new()
            .add_file("/nonexistent/promremote.toml")
            .build()
            .unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_config_file_errors() {
        let result = load_config_file("/nonexistent/promremote.toml");
        assert!(matches!(result, Err(PromRemoteError::Config(_))));

        let file = Builder::new().suffix(".ini").tempfile().unwrap();
        let result = load_config_file(file.path());
        assert!(matches!(result, Err(PromRemoteError::Config(_))));
    }

    #[test]
    fn test_invalid_log_level() {
        let result = ConfigBuilder::<AppConfig>::new()
            .add_toml(r#"log_level = "loud""#)
            .build();
        assert!(matches!(result, Err(PromRemoteError::Config(_))));
    }
}
