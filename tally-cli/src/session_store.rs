use anyhow::{Context, Result};
use harvest::Credentials;
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::{io::Write, os::unix::fs::OpenOptionsExt};

use crate::config::root_path;

fn credentials_path() -> Result<PathBuf> {
    Ok(root_path()?.join("credentials.json"))
}

fn secure_write(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    {
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?
            .write_all(content.as_bytes())?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, content)?;
    }

    Ok(())
}

fn load_from(path: &Path) -> Result<Option<Credentials>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path).context("Failed to read credentials file")?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let credentials = serde_json::from_str(&raw).context("Failed to parse credentials file")?;
    Ok(Some(credentials))
}

fn save_to(path: &Path, credentials: &Credentials) -> Result<()> {
    let raw = serde_json::to_string_pretty(credentials)?;
    secure_write(path, &raw)
}

fn remove(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

pub fn load_credentials() -> Result<Option<Credentials>> {
    load_from(&credentials_path()?)
}

pub fn save_credentials(credentials: &Credentials) -> Result<()> {
    save_to(&credentials_path()?, credentials)
}

pub fn clear_credentials() -> Result<()> {
    remove(&credentials_path()?)
}

/// Delete a local state file, if present.
pub fn clear_file(path: &Path) -> Result<()> {
    remove(path)
}
