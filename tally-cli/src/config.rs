use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tally_core::config::{IdentitySettings, SyncSettings};

const APP_DIR: &str = "tally";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyConfig {
    /// Tracing filter used when RUST_LOG is unset, e.g. "info" or "tally_core=debug"
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub identity: IdentitySettings,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            sync: SyncSettings::default(),
            identity: IdentitySettings::default(),
        }
    }
}

pub fn root_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Cannot determine config directory")?
        .join(APP_DIR))
}

impl TallyConfig {
    pub fn config_path() -> Result<PathBuf> {
        Ok(root_path()?.join("config.toml"))
    }

    /// Local timer snapshot and cached identity.
    pub fn state_path() -> Result<PathBuf> {
        Ok(root_path()?.join("state.json"))
    }

    /// Text file mirroring the running timer, for status bars.
    pub fn status_path() -> Result<PathBuf> {
        Ok(root_path()?.join("status"))
    }

    /// Load config from the config file (if any), overridden by TALLY_* variables.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::build(&path, environment())
    }

    fn build(path: &Path, env: ::config::Environment) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(env)
            .build()
            .with_context(|| format!("Failed to read config at {}", path.display()))?;

        settings
            .try_deserialize::<Self>()
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// Write the default config unless a file already exists.
    pub fn ensure_default_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(path, raw)
            .with_context(|| format!("Failed to write config at {}", path.display()))?;
        Ok(())
    }
}

fn environment() -> ::config::Environment {
    ::config::Environment::with_prefix("TALLY")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
