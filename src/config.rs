use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SourceError};
use crate::http_client::{HttpClientConfig, ReqwestExecutor};

pub const DEFAULT_CONFIG_PATH: &str = "scanmanga.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// log4rs configuration file used by the binary
    #[serde(default = "default_log_config")]
    pub log_config: String,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Timeout for HTTP requests in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Enable gzip/brotli compression
    #[serde(default = "default_true")]
    pub enable_compression: bool,
}

fn default_true() -> bool { true }
fn default_timeout() -> u64 { 30 }
fn default_log_config() -> String { "log4rs.yml".to_string() }

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            enable_compression: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_config: default_log_config(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Read `path`. A missing file yields the defaults; an unreadable or invalid one is an error.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| SourceError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from `path`, falling back to defaults when the file is missing or invalid.
    pub fn load(path: &Path) -> Self {
        Self::read(path).unwrap_or_else(|e| {
            log::warn!("Ignoring config {}: {}", path.display(), e);
            Self::default()
        })
    }
}

impl HttpConfig {
    /// Create the HTTP executor from this configuration
    pub fn create_executor(&self) -> Result<ReqwestExecutor> {
        let config = HttpClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            enable_gzip: self.enable_compression,
        };

        ReqwestExecutor::with_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg: Config = toml::from_str("[http]\ntimeout_secs = 5\n").unwrap();
        assert_eq!(cfg.http.timeout_secs, 5);
        assert!(cfg.http.enable_compression);
        assert_eq!(cfg.log_config, "log4rs.yml");
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let cfg = Config::load(Path::new("does/not/exist.toml"));
        assert_eq!(cfg.http.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let path = std::env::temp_dir().join(format!("scanmanga-invalid-{}.toml", std::process::id()));
        fs::write(&path, "[http]\ntimeout_secs = \"soon\"\n").unwrap();

        let read = Config::read(&path);
        let loaded = Config::load(&path);
        fs::remove_file(&path).unwrap();

        assert!(matches!(read, Err(SourceError::Config(_))));
        assert_eq!(loaded.http.timeout_secs, 30);
    }
}
