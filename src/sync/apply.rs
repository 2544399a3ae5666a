// src/sync/apply.rs

//! Executing a diff through the package manager

use crate::error::{Error, Result};
use crate::packages::PackageManager;
use crate::sync::diff::PackageDiff;
use tracing::{info, warn};

const PROMPT: &str = "Proceed with applying changes?";

/// Switches and forwarded arguments for one sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Compute and display only
    pub dry_run: bool,
    /// Also remove installed packages that are not desired
    pub strict: bool,
    /// Passed verbatim to the install call
    pub install_args: Vec<String>,
    /// Passed verbatim to the remove calls
    pub remove_args: Vec<String>,
}

/// Result of [`apply_diff`] when no error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    NothingToDo,
    Aborted,
    Applied,
}

/// Yes/no gate in front of any system mutation
pub trait Confirmation {
    /// Anything other than an explicit yes must return `false`
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Interactive terminal prompt, defaulting to "no"
///
/// Requires a TTY; when none is attached `interact` fails and the answer is "no".
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl Confirmation for TerminalPrompt {
    fn confirm(&mut self, prompt: &str) -> bool {
        match dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Could not read confirmation: {}", e);
                false
            }
        }
    }
}

/// Apply `diff` after asking for confirmation
///
/// Steps run in order (install, strict removal, tool-managed removal) and the
/// first failure stops the rest. Completed steps are not rolled back.
pub fn apply_diff(
    diff: &PackageDiff,
    options: &SyncOptions,
    package_manager: &dyn PackageManager,
    confirmation: &mut dyn Confirmation,
) -> Result<ApplyOutcome> {
    if !diff.has_changes(options.strict) {
        return Ok(ApplyOutcome::NothingToDo);
    }

    if !confirmation.confirm(PROMPT) {
        info!("Sync aborted at confirmation prompt");
        return Ok(ApplyOutcome::Aborted);
    }

    if !diff.to_add.is_empty() {
        info!("Installing {} package(s)", diff.to_add.len());
        package_manager
            .install(&diff.to_add, &options.install_args)
            .map_err(|e| apply_error("install", &diff.to_add, e))?;
    }

    if options.strict && !diff.to_remove_strict.is_empty() {
        info!("Removing {} undesired package(s)", diff.to_remove_strict.len());
        package_manager
            .remove(&diff.to_remove_strict, &options.remove_args)
            .map_err(|e| apply_error("remove", &diff.to_remove_strict, e))?;
    }

    let tool_removals = diff.tool_removals_after(options.strict);
    if !tool_removals.is_empty() {
        println!(
            "Removing packages no longer managed by ditto: {}",
            tool_removals.join(", ")
        );
        package_manager
            .remove(&tool_removals, &options.remove_args)
            .map_err(|e| apply_error("remove-managed", &tool_removals, e))?;
    }

    Ok(ApplyOutcome::Applied)
}

fn apply_error(step: &'static str, packages: &[String], source: Error) -> Error {
    Error::Apply {
        step,
        packages: packages.to_vec(),
        message: source.to_string(),
    }
}
