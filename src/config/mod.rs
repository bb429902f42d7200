//! Configuration lives in `<home>/dbchat.toml`. Callers only ever deal in
//! the home directory; the file name stays private to this module.

pub mod schema;

pub use schema::DbChatConfig;

use anyhow::{bail, Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "dbchat.toml";

/// Home directory from `--home` (with `~` expanded), else `~/.dbchat`.
pub fn home_dir(explicit: Option<&str>) -> PathBuf {
    match explicit {
        Some(home) => PathBuf::from(shellexpand::tilde(home).into_owned()),
        None => directories::BaseDirs::new()
            .map(|d| d.home_dir().join(".dbchat"))
            .unwrap_or_else(|| PathBuf::from(".dbchat")),
    }
}

/// Location of the config file under `home`.
pub fn config_path(home: &Path) -> PathBuf {
    home.join(CONFIG_FILE)
}

/// Read the config under `home`. A home without a config file yields the
/// defaults.
pub fn load_config(home: &Path) -> Result<DbChatConfig> {
    let path = config_path(home);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DbChatConfig::default()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    let config: DbChatConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {} (TOML)", path.display()))?;
    if config.max_iterations == 0 {
        bail!("{}: max_iterations must be at least 1", path.display());
    }
    Ok(config)
}

/// Write `config` under `home`, creating the directory if needed. Returns
/// the file written.
pub fn save_config(config: &DbChatConfig, home: &Path) -> Result<PathBuf> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::create_dir_all(home)
        .with_context(|| format!("Failed to create {}", home.display()))?;
    let path = config_path(home);
    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
