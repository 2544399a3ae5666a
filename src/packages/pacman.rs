// src/packages/pacman.rs

//! pacman / AUR helper backend
//!
//! Plain pacman needs root for mutations and is run through `sudo`. AUR
//! helpers (yay, paru, ...) take the same flags but escalate on their own, so
//! they are invoked directly.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::packages::traits::PackageManager;
use std::process::{Command, Stdio};
use tracing::{debug, info};

const PACMAN: &str = "pacman";
const SUDO: &str = "sudo";

/// pacman-compatible package manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacman {
    binary: String,
    is_aur_helper: bool,
    no_confirm: bool,
    extra_install_args: Vec<String>,
    extra_uninstall_args: Vec<String>,
}

impl Pacman {
    /// Build the backend described by `config`
    pub fn new(config: &Config) -> Self {
        let (binary, is_aur_helper) = match &config.aur_helper {
            Some(helper) => (helper.clone(), true),
            None => (PACMAN.to_string(), false),
        };

        Self {
            binary,
            is_aur_helper,
            no_confirm: config.no_confirm,
            extra_install_args: config.extra_install_args.clone(),
            extra_uninstall_args: config.extra_uninstall_args.clone(),
        }
    }

    /// Arguments for an install invocation, without the program name
    pub fn install_args(&self, packages: &[String], extra_args: &[String]) -> Vec<String> {
        let mut args = vec!["-S".to_string()];
        args.extend_from_slice(extra_args);
        args.extend_from_slice(&self.extra_install_args);
        if self.no_confirm {
            args.push("--noconfirm".to_string());
        }
        args.extend_from_slice(packages);
        args
    }

    /// Arguments for a remove invocation, without the program name
    pub fn remove_args(&self, packages: &[String], extra_args: &[String]) -> Vec<String> {
        let mut args = vec!["-R".to_string()];
        args.extend_from_slice(extra_args);
        args.extend_from_slice(&self.extra_uninstall_args);
        args.extend_from_slice(packages);
        args
    }

    /// Program and full argument list for a mutating call
    pub fn privileged_command(&self, args: Vec<String>) -> (String, Vec<String>) {
        if self.is_aur_helper {
            (self.binary.clone(), args)
        } else {
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(self.binary.clone());
            full.extend(args);
            (SUDO.to_string(), full)
        }
    }

    /// Run a mutating command with the terminal attached
    fn run(&self, args: Vec<String>) -> Result<()> {
        let (program, args) = self.privileged_command(args);
        let command_line = format!("{} {}", program, args.join(" "));
        info!("Running: {}", command_line);

        let status = Command::new(&program)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Command {
                command: command_line,
                status: status.to_string(),
            })
        }
    }
}

impl PackageManager for Pacman {
    fn list_installed(&self) -> Result<Vec<String>> {
        debug!("Querying installed packages with {} -Q", self.binary);

        let output = Command::new(&self.binary).arg("-Q").output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Command {
                command: format!("{} -Q", self.binary),
                status: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        let packages = parse_query_output(&String::from_utf8_lossy(&output.stdout));
        debug!("{} package(s) installed", packages.len());
        Ok(packages)
    }

    fn install(&self, packages: &[String], extra_args: &[String]) -> Result<()> {
        self.run(self.install_args(packages, extra_args))
    }

    fn remove(&self, packages: &[String], extra_args: &[String]) -> Result<()> {
        self.run(self.remove_args(packages, extra_args))
    }
}

/// Parse `pacman -Q` output (`name version` per line) into package names
pub fn parse_query_output(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}
