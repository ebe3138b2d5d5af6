use std::path::PathBuf;
use std::time::Duration;

use ritmofit_notifications::{FileKeyValueStore, PollingConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.api.base_url.trim().is_empty() {
            return Err("api.base_url must not be empty".into());
        }
        if self.api.request_timeout_secs == 0 {
            return Err("api.request_timeout_secs must be > 0".into());
        }
        if self.polling.interval_secs == 0 {
            return Err("polling.interval_secs must be > 0".into());
        }
        if self.polling.dedup_capacity == 0 {
            return Err("polling.dedup_capacity must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn polling_config(&self) -> PollingConfig {
        let ttl = match self.polling.dedup_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        PollingConfig::new()
            .with_poll_interval(Duration::from_secs(self.polling.interval_secs))
            .with_request_timeout(Duration::from_secs(self.api.request_timeout_secs))
            .with_dedup_capacity(self.polling.dedup_capacity)
            .with_dedup_ttl(ttl)
    }

    /// Session file from config, else `~/.ritmofit/session.json`
    pub fn session_path(&self) -> anyhow::Result<PathBuf> {
        match &self.storage.path {
            Some(path) => Ok(path.clone()),
            None => Ok(FileKeyValueStore::default_path()?),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".into()
}
fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: u64,
    /// 0 keeps delivered ids until evicted by capacity
    #[serde(default = "default_dedup_ttl_secs")]
    pub dedup_ttl_secs: u64,
}

fn default_interval_secs() -> u64 {
    15
}
fn default_dedup_capacity() -> u64 {
    10_000
}
fn default_dedup_ttl_secs() -> u64 {
    12 * 60 * 60
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            dedup_capacity: default_dedup_capacity(),
            dedup_ttl_secs: default_dedup_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if !pathbuf.exists() {
                    return Err(format!("config file not found: {p}"));
                }
                builder = builder.add_source(File::from(pathbuf));
            }
            None => {
                let default_path = PathBuf::from("ritmofit.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., RITMOFIT__POLLING__INTERVAL_SECS=30
        builder = builder.add_source(
            Environment::with_prefix("RITMOFIT")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AppConfig::default();
        cfg.validate().unwrap();

        let polling = cfg.polling_config();
        assert_eq!(polling.poll_interval, Duration::from_secs(15));
        assert_eq!(polling.request_timeout, Duration::from_secs(10));
        assert_eq!(polling.dedup_ttl, Some(Duration::from_secs(43_200)));
    }

    #[test]
    fn test_zero_ttl_disables_expiry() {
        let mut cfg = AppConfig::default();
        cfg.polling.dedup_ttl_secs = 0;
        assert_eq!(cfg.polling_config().dedup_ttl, None);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut cfg = AppConfig::default();
        cfg.polling.interval_secs = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_loads_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"https://ritmofit.example.com/api\"\n\n[polling]\ninterval_secs = 30\n\n[storage]\npath = \"/tmp/ritmofit-session.json\""
        )
        .unwrap();

        let cfg = loader::load_config(file.path().to_str()).unwrap();
        assert_eq!(cfg.api.base_url, "https://ritmofit.example.com/api");
        assert_eq!(cfg.polling.interval_secs, 30);
        assert_eq!(cfg.polling.dedup_capacity, 10_000);
        assert_eq!(
            cfg.session_path().unwrap(),
            PathBuf::from("/tmp/ritmofit-session.json")
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(loader::load_config(Some("/nonexistent/ritmofit.toml")).is_err());
    }
}
