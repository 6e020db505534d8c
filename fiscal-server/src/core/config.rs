use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Default location of the JSON config file
pub const DEFAULT_CONFIG_PATH: &str = "./config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Service configuration
///
/// Loaded in three layers, later layers winning:
///
/// 1. built-in defaults
/// 2. JSON file (`FISCAL_CONFIG`, default `./config.json`)
/// 3. environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HTTP_PORT | 5006 | HTTP listen port |
/// | COM_TIMEOUT_SECONDS | 45 | Per-call device timeout |
/// | RADISON_MODE | false | Append register and receipt numbers to replies |
/// | LOG_LEVEL | info | Default tracing filter (`RUST_LOG` wins) |
/// | LOG_JSON | false | JSON console output |
/// | LOG_DIR | (unset) | Directory for daily rotated log files |
/// | ENVIRONMENT | development | development / production |
///
/// The file keeps the shape deployed registers already carry:
///
/// ```json
/// { "servicePort": { "port": "5006", "radison_error": "off", "com_timeout_seconds": 45 } }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub http_port: u16,
    pub com_timeout_seconds: u64,
    pub radison_mode: bool,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 5006,
            com_timeout_seconds: 45,
            radison_mode: false,
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
            environment: "development".into(),
        }
    }
}

/// Number that older config files may also carry as a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(u64),
    Text(String),
}

impl Lenient {
    fn text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    #[serde(default)]
    service_port: Option<ServicePortSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ServicePortSection {
    #[serde(default)]
    port: Option<Lenient>,
    #[serde(default)]
    radison_error: Option<String>,
    #[serde(default)]
    com_timeout_seconds: Option<Lenient>,
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_timeout(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match parse::<u64>(key, value)? {
        0 => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
        seconds => Ok(seconds),
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

/// Outcome of the file layer, reported once logging is up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// The file did not exist; built-in defaults were kept
    Missing(PathBuf),
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            Self::File(path) => tracing::info!(path = %path.display(), "Config file loaded"),
            Self::Missing(path) => {
                tracing::warn!(path = %path.display(), "Config file not found; using defaults")
            }
        }
    }
}

impl Config {
    /// Load defaults, then the config file, then the process environment
    ///
    /// Runs before logging is initialised, so the file outcome is returned
    /// for the caller to log.
    pub fn load() -> Result<(Self, ConfigSource), ConfigError> {
        let path = std::env::var("FISCAL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = Self::default();
        let source = config.apply_file(Path::new(&path))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok((config, source))
    }

    /// Overlay a JSON config file; a missing file keeps the current values
    pub fn apply_file(&mut self, path: &Path) -> Result<ConfigSource, ConfigError> {
        if !path.exists() {
            return Ok(ConfigSource::Missing(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(section) = file.service_port {
            if let Some(port) = section.port {
                self.http_port = parse("servicePort.port", &port.text())?;
            }
            if let Some(flag) = section.radison_error {
                self.radison_mode = parse_flag("servicePort.radison_error", &flag)?;
            }
            if let Some(timeout) = section.com_timeout_seconds {
                self.com_timeout_seconds =
                    parse_timeout("servicePort.com_timeout_seconds", &timeout.text())?;
            }
        }
        Ok(ConfigSource::File(path.to_path_buf()))
    }

    /// Overlay environment variables read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("HTTP_PORT") {
            self.http_port = parse("HTTP_PORT", &v)?;
        }
        if let Some(v) = lookup("COM_TIMEOUT_SECONDS") {
            self.com_timeout_seconds = parse_timeout("COM_TIMEOUT_SECONDS", &v)?;
        }
        if let Some(v) = lookup("RADISON_MODE") {
            self.radison_mode = parse_flag("RADISON_MODE", &v)?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = lookup("LOG_JSON") {
            self.log_json = parse_flag("LOG_JSON", &v)?;
        }
        if let Some(v) = lookup("LOG_DIR") {
            self.log_dir = (!v.is_empty()).then_some(v);
        }
        if let Some(v) = lookup("ENVIRONMENT") {
            self.environment = v;
        }
        Ok(())
    }

    pub fn com_timeout(&self) -> Duration {
        Duration::from_secs(self.com_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.http_port, 5006);
        assert_eq!(config.com_timeout(), Duration::from_secs(45));
        assert!(!config.radison_mode);
    }

    #[test]
    fn test_file_accepts_string_port_and_on_flag() {
        let file = write_config(
            r#"{ "servicePort": { "port": "7001", "radison_error": "ON", "com_timeout_seconds": 10 } }"#,
        );
        let mut config = Config::default();
        config.apply_file(file.path()).unwrap();
        assert_eq!(config.http_port, 7001);
        assert!(config.radison_mode);
        assert_eq!(config.com_timeout_seconds, 10);
    }

    #[test]
    fn test_file_keeps_defaults_for_absent_keys() {
        let file = write_config(r#"{ "servicePort": { "port": 6000 }, "JsonPathConfig": {} }"#);
        let mut config = Config::default();
        assert_eq!(
            config.apply_file(file.path()).unwrap(),
            ConfigSource::File(file.path().to_path_buf())
        );
        assert_eq!(config.http_port, 6000);
        assert_eq!(config.com_timeout_seconds, 45);
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.json");
        let mut config = Config::default();
        assert_eq!(
            config.apply_file(&absent).unwrap(),
            ConfigSource::Missing(absent.clone())
        );
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let file = write_config("{ not json");
        let mut config = Config::default();
        assert!(matches!(
            config.apply_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("HTTP_PORT", "8080"),
            ("RADISON_MODE", "true"),
            ("LOG_DIR", "/tmp/fiscal-logs"),
        ]);
        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.http_port, 8080);
        assert!(config.radison_mode);
        assert_eq!(config.log_dir.as_deref(), Some("/tmp/fiscal-logs"));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut config = Config::default();
        let result = config.apply_env(|key| (key == "COM_TIMEOUT_SECONDS").then(|| "0".into()));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                key: "COM_TIMEOUT_SECONDS",
                ..
            })
        ));
    }
}
