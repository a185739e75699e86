//! Application configuration for tenderlens.
//!
//! User config lives at `~/.tenderlens/tenderlens.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TenderlensError};
use crate::schema::SiteSchema;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "tenderlens.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".tenderlens";

// ---------------------------------------------------------------------------
// Config structs (matching tenderlens.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Page session (launch) settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Additional site schemas; an entry whose `id` matches a built-in site
    /// replaces it.
    #[serde(default)]
    pub sites: Vec<SiteSchema>,
}

/// `[session]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// User-Agent header sent with every navigation.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Navigation timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Fixed wait after navigation before the page is read, in milliseconds.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Viewport width reported to the portal.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    /// Viewport height reported to the portal.
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Maximum redirects followed per navigation.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            settle_ms: default_settle_ms(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl SessionConfig {
    /// Navigation timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Settle delay for a site, honouring its per-site override.
    pub fn settle_for(&self, site: &SiteSchema) -> Duration {
        Duration::from_millis(site.settle_ms.unwrap_or(self.settle_ms))
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/141.0.0.0 Safari/537.36"
        .into()
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_settle_ms() -> u64 {
    3000
}
fn default_viewport_width() -> u32 {
    1920
}
fn default_viewport_height() -> u32 {
    1080
}
fn default_max_redirects() -> usize {
    10
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.tenderlens/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TenderlensError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.tenderlens/tenderlens.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
///
/// Every declared site schema is validated before the config is returned.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TenderlensError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        TenderlensError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    for site in &config.sites {
        site.validate()?;
    }

    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TenderlensError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TenderlensError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TenderlensError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
