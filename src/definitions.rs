// src/definitions.rs

//! Package definition discovery and parsing
//!
//! Definitions live under the packages directory as `.pkgs` files, one package
//! name per line. Files under `hosts/` are scoped to a single machine:
//!
//! - `hosts/<name>.pkgs` applies to host `<name>`
//! - `hosts/<name>/**/*.pkgs` applies to host `<name>`
//! - everything else applies to every host

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File extension of definition files
pub const FILE_EXTENSION: &str = "pkgs";

const HOSTS_DIR: &str = "hosts";
const STAGE: &str = "package definitions";

/// A set of desired packages, optionally restricted to one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub packages: Vec<String>,
    /// `None` means the definition applies to every host
    pub host: Option<String>,
}

/// Source of package definitions
pub trait DefinitionLoader {
    fn load_all_definitions(&self) -> Result<Vec<Definition>>;
}

/// Loads `.pkgs` files from a directory tree
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parse a single definition file
    fn load_file(&self, path: &Path) -> Result<Definition> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::source_read(STAGE, format!("{}: {}", path.display(), e)))?;

        let packages = parse_packages(&content);
        if packages.is_empty() {
            warn!("No packages defined in {}", path.display());
        }

        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let host = host_for(relative)?;
        debug!(
            "Loaded {} package(s) from {} (host: {})",
            packages.len(),
            path.display(),
            host.as_deref().unwrap_or("global")
        );

        Ok(Definition { packages, host })
    }
}

impl DefinitionLoader for DirectoryLoader {
    fn load_all_definitions(&self) -> Result<Vec<Definition>> {
        if !self.root.exists() {
            debug!("Definitions directory {} does not exist", self.root.display());
            return Ok(Vec::new());
        }

        let mut definitions = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::source_read(STAGE, e))?;

            let is_definition = entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == FILE_EXTENSION);
            if is_definition {
                definitions.push(self.load_file(entry.path())?);
            }
        }

        Ok(definitions)
    }
}

/// Extract package names from file content, skipping blanks and `#` comments
pub fn parse_packages(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Derive the host scope from a path relative to the definitions root
///
/// A host name that is not valid UTF-8 is an error rather than a silent
/// fallback to global scope.
fn host_for(relative: &Path) -> Result<Option<String>> {
    let parts: Vec<&OsStr> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    let host = match parts.as_slice() {
        [dir, file] if *dir == HOSTS_DIR => Path::new(file).file_stem(),
        [dir, host, _, ..] if *dir == HOSTS_DIR => Some(*host),
        _ => return Ok(None),
    };

    match host {
        Some(name) => match name.to_str() {
            Some(name) => Ok(Some(name.to_string())),
            None => Err(Error::source_read(
                STAGE,
                format!("{}: host name is not valid UTF-8", relative.display()),
            )),
        },
        None => Ok(None),
    }
}
