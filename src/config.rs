use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::search::SearchBackend;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Search index settings
#[derive(Debug, Clone, Serialize)]
pub struct SearchConfig {
    pub backend: ConfigValue<SearchBackend>,
    /// SQLite file for the `sqlite` backend
    pub path: ConfigValue<PathBuf>,
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    pub search: SearchConfig,
    /// HTTP port of `cookbook-server`
    pub port: ConfigValue<u16>,
    /// Prefix of the alert headers on REST responses
    pub app_name: ConfigValue<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SearchFile {
    backend: Option<SearchBackend>,
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ServerFile {
    port: Option<u16>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    search: SearchFile,
    server: ServerFile,
    app_name: Option<String>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, |key| std::env::var(key).ok())
    }

    fn load_with_env(
        config_path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let data_dir = Self::default_data_dir();

        // Start with defaults
        let mut database_path =
            ConfigValue::new(data_dir.join("cookbook.db"), ConfigSource::Default);
        let mut search_backend = ConfigValue::new(SearchBackend::default(), ConfigSource::Default);
        let mut search_path = ConfigValue::new(data_dir.join("search.db"), ConfigSource::Default);
        let mut port = ConfigValue::new(8080, ConfigSource::Default);
        let mut app_name = ConfigValue::new("cookbook".to_string(), ConfigSource::Default);
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            if let Some(db_path) = file_config.database_path {
                database_path = ConfigValue::new(resolve(&path, db_path), ConfigSource::File);
            }
            if let Some(backend) = file_config.search.backend {
                search_backend = ConfigValue::new(backend, ConfigSource::File);
            }
            if let Some(index_path) = file_config.search.path {
                search_path = ConfigValue::new(resolve(&path, index_path), ConfigSource::File);
            }
            if let Some(p) = file_config.server.port {
                port = ConfigValue::new(p, ConfigSource::File);
            }
            if let Some(name) = file_config.app_name {
                app_name = ConfigValue::new(name, ConfigSource::File);
            }

            config_file = Some(path);
        }

        // Apply environment variable overrides
        if let Some(db_path) = env("COOKBOOK_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Some(backend) = env("COOKBOOK_SEARCH_BACKEND") {
            let backend = backend
                .parse()
                .map_err(|e| ConfigError::EnvError("COOKBOOK_SEARCH_BACKEND", e))?;
            search_backend = ConfigValue::new(backend, ConfigSource::Environment);
        }
        if let Some(index_path) = env("COOKBOOK_SEARCH_PATH") {
            search_path = ConfigValue::new(PathBuf::from(index_path), ConfigSource::Environment);
        }
        if let Some(p) = env("COOKBOOK_PORT") {
            let p = p.parse().map_err(|_| {
                ConfigError::EnvError("COOKBOOK_PORT", format!("Invalid port '{}'", p))
            })?;
            port = ConfigValue::new(p, ConfigSource::Environment);
        }
        if let Some(name) = env("COOKBOOK_APP_NAME") {
            app_name = ConfigValue::new(name, ConfigSource::Environment);
        }

        Ok(Self {
            database_path,
            search: SearchConfig {
                backend: search_backend,
                path: search_path,
            },
            port,
            app_name,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/cookbook/
    /// - macOS: ~/Library/Application Support/cookbook/
    /// - Windows: %APPDATA%/cookbook/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cookbook")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/cookbook/
    /// - macOS: ~/Library/Application Support/cookbook/
    /// - Windows: %APPDATA%/cookbook/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cookbook")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

/// Resolve relative paths against the config file's directory
fn resolve(config_path: &Path, value: PathBuf) -> PathBuf {
    if value.is_relative() {
        config_path
            .parent()
            .map(|p| p.join(&value))
            .unwrap_or(value)
    } else {
        value
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    EnvError(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::EnvError(var, message) => {
                write!(f, "Invalid value for {}: {}", var, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load_with_env(Some(config_path), no_env).unwrap();
        assert!(config
            .database_path
            .value
            .to_string_lossy()
            .contains("cookbook.db"));
        assert_eq!(config.database_path.source, ConfigSource::Default);
        assert_eq!(config.search.backend.value, SearchBackend::Sqlite);
        assert_eq!(config.port.value, 8080);
        assert_eq!(config.app_name.value, "cookbook");
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path: /custom/path/db.sqlite").unwrap();
        writeln!(file, "app_name: kitchen").unwrap();
        writeln!(file, "search:").unwrap();
        writeln!(file, "  backend: memory").unwrap();
        writeln!(file, "server:").unwrap();
        writeln!(file, "  port: 9000").unwrap();

        let config = Config::load_with_env(Some(config_path.clone()), no_env).unwrap();
        assert_eq!(
            config.database_path.value,
            PathBuf::from("/custom/path/db.sqlite")
        );
        assert_eq!(config.database_path.source, ConfigSource::File);
        assert_eq!(config.search.backend.value, SearchBackend::Memory);
        assert_eq!(config.search.path.source, ConfigSource::Default);
        assert_eq!(config.port.value, 9000);
        assert_eq!(config.app_name.value, "kitchen");
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_paths_resolve_against_config_dir() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path: data/cookbook.db").unwrap();
        writeln!(file, "search:").unwrap();
        writeln!(file, "  path: data/search.db").unwrap();

        let config = Config::load_with_env(Some(config_path), no_env).unwrap();
        assert_eq!(
            config.database_path.value,
            temp_dir.path().join("data/cookbook.db")
        );
        assert_eq!(
            config.search.path.value,
            temp_dir.path().join("data/search.db")
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "app_name: fromfile").unwrap();

        let env = HashMap::from([
            ("COOKBOOK_APP_NAME", "fromenv"),
            ("COOKBOOK_PORT", "3000"),
            ("COOKBOOK_SEARCH_BACKEND", "Memory"),
        ]);
        let config = Config::load_with_env(Some(config_path), |key| {
            env.get(key).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.app_name.value, "fromenv");
        assert_eq!(config.app_name.source, ConfigSource::Environment);
        assert_eq!(config.port.value, 3000);
        assert_eq!(config.search.backend.value, SearchBackend::Memory);
    }

    #[test]
    fn test_invalid_env_value() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let result = Config::load_with_env(Some(config_path), |key| {
            (key == "COOKBOOK_PORT").then(|| "eighty".to_string())
        });
        let err = result.unwrap_err();
        assert!(err.to_string().contains("COOKBOOK_PORT"));
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load_with_env(Some(config_path), no_env);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
