pub mod settings;

pub use settings::{ConfigError, KernelConfig};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the settings file path
///
/// `GPTR_CONFIG_FILE` wins; otherwise `~/.gptr/config.toml`.
pub fn settings_path<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup("GPTR_CONFIG_FILE") {
        return PathBuf::from(path);
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gptr")
        .join("config.toml")
}

/// Read the settings table, or `None` when the file does not exist
pub fn load_settings(path: &Path) -> Result<Option<toml::Table>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
    let table: toml::Table = toml::from_str(&content)
        .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
    Ok(Some(table))
}

/// Persist one key into the settings file, keeping the other entries
pub fn save_setting(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut table = match load_settings(path) {
        Ok(table) => table.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "rewriting unreadable settings file");
            toml::Table::new()
        }
    };

    let entry = if key == "dry_run" {
        // Validated by KernelConfig::set before we get here.
        toml::Value::Boolean(matches!(
            value.to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ))
    } else {
        toml::Value::String(value.to_string())
    };
    table.insert(key.to_string(), entry);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create settings directory")?;
    }

    let content = toml::to_string_pretty(&table).context("Failed to serialize settings")?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write settings file: {}", path.display()))?;
    Ok(())
}

/// Load the kernel configuration from the settings file and an environment lookup
///
/// A settings file that cannot be read or parsed is skipped: the config falls
/// back to defaults plus the lookup, and the error is handed back so the
/// caller can report it once logging is up.
pub fn load_or_defaults<F>(lookup: F) -> (KernelConfig, Option<anyhow::Error>)
where
    F: Fn(&str) -> Option<String>,
{
    let path = settings_path(&lookup);
    match load_settings(&path) {
        Ok(settings) => (KernelConfig::from_sources(settings.as_ref(), lookup), None),
        Err(e) => (KernelConfig::from_sources(None, lookup), Some(e)),
    }
}
