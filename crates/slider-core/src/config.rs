use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "slider.toml";

/// Environment variable that overrides the database path.
pub const DB_ENV: &str = "SLIDER_DB";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: Option<String>,
}

/// Load `slider.toml` from `root`, falling back to defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(root: &Path) -> Result<Config> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Config>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Pick the database path: flag, then `SLIDER_DB`, then config.
///
/// Relative paths are resolved against `root`.
#[must_use]
pub fn resolve_db_path(
    root: &Path,
    cli_db: Option<&Path>,
    env_db: Option<&str>,
    config: &Config,
) -> PathBuf {
    let chosen = cli_db
        .map(Path::to_path_buf)
        .or_else(|| {
            env_db
                .filter(|raw| !raw.trim().is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| config.store.path.clone());

    if chosen.is_absolute() {
        chosen
    } else {
        root.join(chosen)
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".slider/slider.db")
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}
