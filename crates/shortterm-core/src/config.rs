//! Client configuration.
//!
//! Values are resolved in order: built-in defaults, then the JSON config
//! file (`<config_dir>/shortterm/config.json`), then environment variables.
//! The command line may override the result further.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::render::DEFAULT_PREVIEW_LEN;
use crate::store::FileStore;
use crate::{Error, Result};

/// Default service endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.shorttermemail.com";

/// Environment variable overriding [`Config::api_base_url`].
pub const ENV_API_BASE_URL: &str = "SHORTTERM_API_BASE_URL";

/// Environment variable overriding [`Config::refresh_interval_secs`].
pub const ENV_REFRESH_SECS: &str = "SHORTTERM_REFRESH_SECS";

/// Client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the temporary email API.
    pub api_base_url: String,
    /// Seconds between inbox refreshes.
    pub refresh_interval_secs: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Characters of body text shown in the inbox preview.
    pub preview_len: usize,
    /// Where session state is kept; defaults to the platform data directory.
    pub storage_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            refresh_interval_secs: 10,
            request_timeout_secs: 30,
            preview_len: DEFAULT_PREVIEW_LEN,
            storage_dir: None,
        }
    }
}

impl Config {
    /// Default location of the config file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shortterm")
            .join("config.json")
    }

    /// Loads configuration from the default file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed, or if the resulting configuration is invalid.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file(&Self::default_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file, falling back to defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), "loading config file");
                Ok(serde_json::from_str(&contents)?)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Applies overrides from environment-style lookups.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric override does not parse.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(secs) = lookup(ENV_REFRESH_SECS) {
            self.refresh_interval_secs = secs.trim().parse().map_err(|_| {
                Error::Config(format!("{ENV_REFRESH_SECS} must be a number, got {secs:?}"))
            })?;
        }
        Ok(())
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a non-HTTP base URL or a zero interval.
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "API base URL must use http or https: {}",
                self.api_base_url
            )));
        }
        if self.refresh_interval_secs == 0 {
            return Err(Error::Config("refresh interval must be positive".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request timeout must be positive".into()));
        }
        Ok(())
    }

    /// Parsed API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse.
    pub fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.api_base_url)?)
    }

    /// Interval between inbox refreshes.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Session store at the configured location.
    #[must_use]
    pub fn store(&self) -> FileStore {
        self.storage_dir
            .as_ref()
            .map_or_else(FileStore::in_data_dir, FileStore::new)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(10));
        assert_eq!(config.preview_len, 120);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"api_base_url":"http://localhost:3001"}"#).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:3001");
        assert_eq!(config.refresh_interval_secs, 10);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("shortterm-no-such-config.json");
        assert_eq!(Config::load_file(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_BASE_URL, "https://mail.example.org"),
            (ENV_REFRESH_SECS, "15"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(ToString::to_string))
            .unwrap();
        assert_eq!(config.api_base_url, "https://mail.example.org");
        assert_eq!(config.refresh_interval(), Duration::from_secs(15));
    }

    #[test]
    fn test_bad_env_number() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == ENV_REFRESH_SECS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validation() {
        let mut config = Config {
            api_base_url: "ftp://example.org".into(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.api_base_url = "not a url".into();
        assert!(matches!(config.validate(), Err(Error::Url(_))));

        config.api_base_url = DEFAULT_API_BASE_URL.into();
        config.refresh_interval_secs = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
