//! Application configuration
//!
//! Settings are read from a YAML file, by default
//! `~/.config/stackx/config.yaml` on Linux. Every section is optional and
//! falls back to its defaults.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheBackend;
use crate::search::DEFAULT_BASE_URL;

/// Errors raised while loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to write config file {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("Could not determine a config directory; pass --config")]
    NoConfigDir,
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Stack Exchange API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Key for a higher request quota, see <https://api.stackexchange.com/docs/throttle>
    pub key: Option<String>,
    /// Site searched when `--site` is not given
    pub default_site: String,
    /// API version segment of the base URL
    pub version: String,
    /// Full API root, overriding `version`
    pub base_url: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            default_site: "stackoverflow".to_string(),
            version: "2.3".to_string(),
            base_url: None,
        }
    }
}

impl ApiConfig {
    /// API root requests are sent to
    pub fn base_url(&self) -> String {
        match self.base_url {
            Some(ref url) => url.clone(),
            None if self.version == "2.3" => DEFAULT_BASE_URL.to_string(),
            None => format!("https://api.stackexchange.com/{}", self.version),
        }
    }
}

/// Result cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub backend: CacheBackend,
    /// Lifetime of file cache entries; unset keeps them until flushed
    pub ttl_hours: Option<u64>,
    /// Directory for the file backend, defaults to the user cache dir
    pub dir: Option<PathBuf>,
    /// Connection URL for the redis backend
    pub redis_url: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::File,
            ttl_hours: None,
            dir: None,
            redis_url: None,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Also write logs to `file`
    pub log_to_file: bool,
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            log_to_file: false,
            file: PathBuf::from("stackx.log"),
        }
    }
}

impl Config {
    /// Default config file location, if a home directory is known
    pub fn default_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "stackx")?;
        Some(project_dirs.config_dir().join("config.yaml"))
    }

    /// Loads configuration
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used if present, and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::from_file(path)
            }
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Reads and parses one YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Writes the configuration as YAML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |message: String| ConfigError::Write {
            path: path.to_path_buf(),
            message,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
        }
        let yaml = serde_yaml::to_string(self).map_err(|e| write_error(e.to_string()))?;
        fs::write(path, yaml).map_err(|e| write_error(e.to_string()))
    }
}

/// Persists `key` as the API key in the config file at `path` (or the default location)
///
/// The file is created when it does not exist yet. Returns the path written.
pub fn set_api_key(path: Option<&Path>, key: &str) -> Result<PathBuf, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path().ok_or(ConfigError::NoConfigDir)?,
    };

    let mut config = if path.is_file() {
        Config::from_file(&path)?
    } else {
        Config::default()
    };
    config.api.key = Some(key.to_string());
    config.save(&path)?;

    tracing::info!(path = %path.display(), "saved API key");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.default_site, "stackoverflow");
        assert_eq!(config.api.base_url(), "https://api.stackexchange.com/2.3");
        assert!(config.api.key.is_none());
        assert!(config.cache.enabled);
        assert_eq!(config.cache.backend, CacheBackend::File);
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.log_to_file);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
api:
  key: "abc(("
  default_site: superuser
cache:
  backend: memory
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.api.key.as_deref(), Some("abc(("));
        assert_eq!(config.api.default_site, "superuser");
        assert_eq!(config.api.version, "2.3");
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert!(config.cache.enabled);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_version_changes_base_url() {
        let api = ApiConfig {
            version: "2.2".to_string(),
            ..Default::default()
        };
        assert_eq!(api.base_url(), "https://api.stackexchange.com/2.2");
    }

    #[test]
    fn test_explicit_base_url_wins() {
        let api = ApiConfig {
            base_url: Some("http://localhost:8080".to_string()),
            ..Default::default()
        };
        assert_eq!(api.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_unknown_backend_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "cache:\n  backend: sqlite\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.yaml");

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");
        let mut config = Config::default();
        config.cache.ttl_hours = Some(12);

        config.save(&path).unwrap();

        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_set_api_key_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");

        let written = set_api_key(Some(&path), "new-key").unwrap();

        assert_eq!(written, path);
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.api.key.as_deref(), Some("new-key"));
    }

    #[test]
    fn test_set_api_key_preserves_other_settings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "api:\n  default_site: askubuntu\n").unwrap();

        set_api_key(Some(&path), "k").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.api.default_site, "askubuntu");
        assert_eq!(config.api.key.as_deref(), Some("k"));
    }
}
