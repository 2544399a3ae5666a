// src/config.rs

//! User configuration
//!
//! The file on disk is parsed into [`RawConfig`], where every key is optional,
//! and resolved against the defaults exactly once into [`Config`]. Nothing
//! downstream needs to know whether a value was set or defaulted.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name under the XDG config home
pub const APP_DIR: &str = "ditto";

const CONFIG_FILE: &str = "config.toml";
const DB_FILE: &str = "ditto.db";
const PACKAGES_DIR: &str = "packages";

const CONFIG_DOC: &str = "# Ditto config
# noConfirm: add --noconfirm to pacman/aur install commands
# aurHelper: name of the AUR helper to use (e.g. yay, paru)
# uninstallIgnore: list of packages that will never be uninstalled
# extraInstallArgs: additional arguments to pass to install commands
# extraUninstallArgs: additional arguments to pass to uninstall commands
# pager: command used to display the change table, with its arguments (e.g. [\"less\", \"-R\"])

";

/// Config file as written by the user; absent keys stay `None`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    pub no_confirm: Option<bool>,
    pub aur_helper: Option<String>,
    pub extra_install_args: Option<Vec<String>>,
    pub extra_uninstall_args: Option<Vec<String>>,
    pub uninstall_ignore: Option<Vec<String>>,
    pub pager: Option<Vec<String>>,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub no_confirm: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aur_helper: Option<String>,
    pub extra_install_args: Vec<String>,
    pub extra_uninstall_args: Vec<String>,
    pub uninstall_ignore: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pager: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            no_confirm: true,
            aur_helper: None,
            extra_install_args: Vec::new(),
            extra_uninstall_args: Vec::new(),
            uninstall_ignore: Vec::new(),
            pager: None,
        }
    }
}

impl RawConfig {
    /// Parse the TOML text of a config file
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Merge with the defaults
    pub fn resolve(self) -> Config {
        let defaults = Config::default();
        Config {
            no_confirm: self.no_confirm.unwrap_or(defaults.no_confirm),
            aur_helper: self.aur_helper.filter(|h| !h.trim().is_empty()),
            extra_install_args: self
                .extra_install_args
                .unwrap_or(defaults.extra_install_args),
            extra_uninstall_args: self
                .extra_uninstall_args
                .unwrap_or(defaults.extra_uninstall_args),
            uninstall_ignore: self.uninstall_ignore.unwrap_or(defaults.uninstall_ignore),
            pager: self.pager.filter(|p| !p.is_empty()),
        }
    }
}

impl Config {
    /// Load the config at `path`, writing a documented default file if missing
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config at {}, writing defaults", path.display());
            let config = Config::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Could not read {}: {}", path.display(), e)))?;
        let raw = RawConfig::parse(&content)
            .map_err(|e| Error::Config(format!("Invalid config {}: {}", path.display(), e)))?;

        debug!("Loaded config from {}", path.display());
        Ok(raw.resolve())
    }

    /// Write this config to `path` with the explanatory header
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = toml::to_string(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, format!("{}{}", CONFIG_DOC, body))?;
        Ok(())
    }

    /// The configured ignore list as a set
    pub fn ignore_set(&self) -> BTreeSet<String> {
        self.uninstall_ignore.iter().cloned().collect()
    }
}

/// Get the ditto config directory (`$XDG_CONFIG_HOME/ditto`)
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
    Ok(base.join(APP_DIR))
}

/// Default location of `config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Default location of the managed-state database
pub fn default_db_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(DB_FILE))
}

/// Directory holding `.pkgs` definitions, next to the given config file
pub fn packages_dir_for(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|dir| dir.join(PACKAGES_DIR))
        .unwrap_or_else(|| PathBuf::from(PACKAGES_DIR))
}
