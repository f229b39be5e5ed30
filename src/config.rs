// src/config.rs
//! Monitor configuration
//!
//! Values come from built-in defaults, optionally overridden by a YAML file
//! and then by command line flags. A missing or broken config file is not an
//! error state: the caller logs it and runs with defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::core::classifier::MIN_LANGUAGE_CHARS;
use crate::core::error::ConfigError;
use crate::core::monitor::POLL_INTERVAL;

const APP_DIR: &str = ".clipboard-monitor";

/// Settings consumed by the monitor
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Database file, home directory already expanded
    pub database_path: PathBuf,
    pub poll_interval: Duration,
    pub min_language_chars: usize,
    pub log_level: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            database_path: app_dir().join("clipboard.db"),
            poll_interval: POLL_INTERVAL,
            min_language_chars: MIN_LANGUAGE_CHARS,
            log_level: None,
        }
    }
}

/// On-disk layout; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    database_path: Option<String>,
    poll_interval_ms: Option<u64>,
    min_language_chars: Option<usize>,
    log_level: Option<String>,
}

impl MonitorConfig {
    /// Default config file location (~/.clipboard-monitor/config.yaml)
    pub fn default_path() -> PathBuf {
        app_dir().join("config.yaml")
    }

    /// Parse a YAML config file on top of the defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as unit, not as an empty mapping
        let file: ConfigFile = if content.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(content)?
        };
        Ok(Self::default().merge(file))
    }

    /// Load `path`, falling back to defaults. The error, if any, is handed back for logging.
    pub fn load_or_default(path: &Path) -> (Self, Option<ConfigError>) {
        match Self::from_file(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    fn merge(mut self, file: ConfigFile) -> Self {
        if let Some(path) = file.database_path {
            self.database_path = expand_home(&path);
        }
        if let Some(ms) = file.poll_interval_ms.filter(|ms| *ms > 0) {
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Some(chars) = file.min_language_chars {
            self.min_language_chars = chars;
        }
        if file.log_level.is_some() {
            self.log_level = file.log_level;
        }
        self
    }
}

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Expand a leading `~` or `~/` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };

    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.min_language_chars, 10);
        assert!(config.database_path.ends_with(".clipboard-monitor/clipboard.db"));
    }

    #[test]
    fn test_load_config_reads_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "database_path: /tmp/history/clips.db\npoll_interval_ms: 250\nlog_level: debug\n"
        )
        .unwrap();

        let config = MonitorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/history/clips.db"));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.min_language_chars, 10);
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let config = MonitorConfig::from_yaml_str("log_level: warn\n").unwrap();
        assert_eq!(config.database_path, MonitorConfig::default().database_path);
        assert_eq!(config.poll_interval, POLL_INTERVAL);

        let empty = MonitorConfig::from_yaml_str("").unwrap();
        assert_eq!(empty, MonitorConfig::default());
    }

    #[test]
    fn test_zero_interval_ignored() {
        let config = MonitorConfig::from_yaml_str("poll_interval_ms: 0\n").unwrap();
        assert_eq!(config.poll_interval, POLL_INTERVAL);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let (config, err) = MonitorConfig::load_or_default(&dir.path().join("nope.yaml"));

        assert_eq!(config, MonitorConfig::default());
        assert!(matches!(err, Some(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "poll_interval_ms: [not, a, number]\n").unwrap();

        let (config, err) = MonitorConfig::load_or_default(file.path());
        assert_eq!(config, MonitorConfig::default());
        assert!(matches!(err, Some(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir();
        match home {
            Some(home) => {
                assert_eq!(expand_home("~/clips.db"), home.join("clips.db"));
                assert_eq!(expand_home("~"), home);
            }
            None => assert_eq!(expand_home("~/clips.db"), PathBuf::from("~/clips.db")),
        }
        assert_eq!(expand_home("/var/db/clips.db"), PathBuf::from("/var/db/clips.db"));
        assert_eq!(expand_home("~user/clips.db"), PathBuf::from("~user/clips.db"));
    }
}
