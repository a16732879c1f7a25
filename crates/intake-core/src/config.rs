//! Client configuration.
//!
//! Built explicitly in `main` and injected into the session and client;
//! nothing reads ambient global state at use sites. Resolution order:
//! CLI flags > environment > optional config file > defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::CoreError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_PROGRESS_TICK_MS: u64 = 400;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub api_key: Option<String>,
    pub progress_tick_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            progress_tick_ms: DEFAULT_PROGRESS_TICK_MS,
        }
    }
}

impl Config {
    /// Resolve the effective configuration from CLI overrides, the
    /// `INTAKE_API_URL` / `INTAKE_API_KEY` environment, and the user config
    /// file (`<config dir>/intake/config.toml`, absent is fine).
    pub fn resolve(cli_url: Option<String>, cli_key: Option<String>) -> Result<Self, CoreError> {
        let file = FileConfig::load(default_config_path())?;
        let env_url = std::env::var("INTAKE_API_URL").ok();
        let env_key = std::env::var("INTAKE_API_KEY").ok();
        Ok(Self::merge(cli_url, cli_key, env_url, env_key, file))
    }

    fn merge(
        cli_url: Option<String>,
        cli_key: Option<String>,
        env_url: Option<String>,
        env_key: Option<String>,
        file: FileConfig,
    ) -> Self {
        let defaults = Config::default();
        Config {
            base_url: cli_url
                .or(env_url)
                .or(file.api_url)
                .unwrap_or(defaults.base_url),
            api_key: cli_key.or(env_key).or(file.api_key),
            progress_tick_ms: file.progress_tick_ms.unwrap_or(defaults.progress_tick_ms),
        }
    }

    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms)
    }
}

/// The optional on-disk portion of the configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub progress_tick_ms: Option<u64>,
}

impl FileConfig {
    fn load(path: Option<PathBuf>) -> Result<Self, CoreError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&raw).map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))
    }
}

fn default_config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("intake").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::merge(None, None, None, None, FileConfig::default());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.api_key.is_none());
        assert_eq!(config.progress_tick_ms, DEFAULT_PROGRESS_TICK_MS);
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let file = FileConfig {
            api_url: Some("http://file:1".to_string()),
            api_key: Some("file-key".to_string()),
            progress_tick_ms: Some(100),
        };
        let config = Config::merge(
            Some("http://cli:3".to_string()),
            None,
            Some("http://env:2".to_string()),
            Some("env-key".to_string()),
            file,
        );
        assert_eq!(config.base_url, "http://cli:3");
        assert_eq!(config.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.progress_tick_ms, 100);
    }

    #[test]
    fn file_values_fill_remaining_gaps() {
        let file = FileConfig {
            api_url: Some("http://file:1".to_string()),
            api_key: None,
            progress_tick_ms: None,
        };
        let config = Config::merge(None, None, None, None, file);
        assert_eq!(config.base_url, "http://file:1");
        assert_eq!(config.progress_tick_ms, DEFAULT_PROGRESS_TICK_MS);
    }

    #[test]
    fn file_config_parses_toml() {
        let parsed: FileConfig =
            toml::from_str("api_url = \"http://parser.internal:9000\"\nprogress_tick_ms = 250\n")
                .unwrap();
        assert_eq!(parsed.api_url.as_deref(), Some("http://parser.internal:9000"));
        assert_eq!(parsed.progress_tick_ms, Some(250));
    }
}
