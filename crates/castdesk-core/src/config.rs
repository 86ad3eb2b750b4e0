//! Configuration management for castdesk.
//!
//! Loads configuration from ${CASTDESK_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use toml_edit::DocumentMut;

/// Environment variable that overrides the configured API base URL.
pub const BASE_URL_ENV: &str = "CASTDESK_API_BASE_URL";

/// Commented template written by `castdesk config init`.
const DEFAULT_TEMPLATE: &str = include_str!("../default_config.toml");

pub mod paths {
    //! Path resolution for castdesk configuration and data directories.
    //!
    //! CASTDESK_HOME resolution order:
    //! 1. CASTDESK_HOME environment variable (if set)
    //! 2. ~/.config/castdesk (default)

    use std::path::PathBuf;

    /// Returns the castdesk home directory.
    pub fn castdesk_home() -> PathBuf {
        if let Ok(home) = std::env::var("CASTDESK_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".castdesk"),
            |h| h.join(".config").join("castdesk"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        castdesk_home().join("config.toml")
    }

    /// Returns the path to the persisted credentials file.
    pub fn credentials_path() -> PathBuf {
        castdesk_home().join("credentials.json")
    }

    /// Returns the directory for rolling log files.
    pub fn logs_dir() -> PathBuf {
        castdesk_home().join("logs")
    }
}

/// API connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the REST API.
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: Some(Config::DEFAULT_BASE_URL.to_string()),
            timeout_secs: Config::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Session watch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub expiry_check_interval_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            expiry_check_interval_secs: Config::DEFAULT_EXPIRY_CHECK_SECS,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default `EnvFilter` directive.
    pub level: String,
    /// Also write a daily-rolling log file.
    pub file: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: false,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiSettings,
    pub session: SessionSettings,
    pub log: LogSettings,
}

impl Config {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
    const DEFAULT_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_EXPIRY_CHECK_SECS: u64 = 300;

    /// Reads `$CASTDESK_HOME/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Reads `path`; a missing file yields the defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the API base URL with precedence: env > config > default.
    ///
    /// # Errors
    /// Returns an error if the winning value is not a valid URL.
    pub fn effective_base_url(&self) -> Result<String> {
        let env_value = std::env::var(BASE_URL_ENV).ok();
        resolve_base_url(env_value.as_deref(), self.api.base_url.as_deref())
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.max(1))
    }

    /// Period between expiry checks while a route guard is mounted.
    pub fn expiry_check_interval(&self) -> Duration {
        Duration::from_secs(self.session.expiry_check_interval_secs.max(1))
    }

    /// Writes the commented template to `path`.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }
        write_atomic(path, DEFAULT_TEMPLATE)
    }

    /// Sets `api.base_url` in the file at `path`, keeping every other value
    /// and comment. A missing file starts from the template.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the file cannot be
    /// read, parsed or written.
    pub fn save_base_url_to(path: &Path, base_url: &str) -> Result<()> {
        let url = base_url.trim();
        validate_url(url)?;

        let source = if path.exists() {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?
        } else {
            DEFAULT_TEMPLATE.to_string()
        };
        let mut doc: DocumentMut = source
            .parse()
            .with_context(|| format!("{} is not valid TOML", path.display()))?;

        let api = doc["api"].or_insert(toml_edit::table());
        api["base_url"] = toml_edit::value(url);

        write_atomic(path, &doc.to_string())
    }
}

/// Stages `content` next to `path`, then renames it over `path`.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let staged = path.with_extension("toml.partial");
    fs::write(&staged, content)
        .with_context(|| format!("Failed to stage config at {}", staged.display()))?;
    fs::rename(&staged, path)
        .with_context(|| format!("Failed to move config into place at {}", path.display()))
}

/// Resolves a base URL with precedence: env > config > default.
///
/// Empty or whitespace-only values are treated as unset.
///
/// # Errors
/// Returns an error if the chosen value is not a valid URL.
pub fn resolve_base_url(env_value: Option<&str>, config_value: Option<&str>) -> Result<String> {
    for candidate in [env_value, config_value].into_iter().flatten() {
        let trimmed = candidate.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }
    Ok(Config::DEFAULT_BASE_URL.to_string())
}

fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid API base URL: {url}"))?;
    Ok(())
}
