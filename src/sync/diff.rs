// src/sync/diff.rs

//! Three-way package diff
//!
//! Combines the desired set, the installed set and the packages ditto
//! previously put in place into the actions needed to converge.

use crate::definitions::Definition;
use serde::Serialize;
use std::collections::BTreeSet;

/// Actions needed to bring the system to the desired state
///
/// Every list is deduplicated and sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageDiff {
    /// Desired but not installed
    pub to_add: Vec<String>,
    /// Installed but not desired; only acted on in strict mode
    pub to_remove_strict: Vec<String>,
    /// Previously installed by ditto and no longer desired
    pub to_remove_from_tool: Vec<String>,
}

impl PackageDiff {
    /// Whether anything would be done under the given mode
    pub fn has_changes(&self, strict: bool) -> bool {
        !self.to_add.is_empty()
            || (strict && !self.to_remove_strict.is_empty())
            || !self.to_remove_from_tool.is_empty()
    }

    /// Tool-managed removals not already covered by the strict removal step
    pub fn tool_removals_after(&self, strict: bool) -> Vec<String> {
        if !strict {
            return self.to_remove_from_tool.clone();
        }
        let already: BTreeSet<&String> = self.to_remove_strict.iter().collect();
        self.to_remove_from_tool
            .iter()
            .filter(|pkg| !already.contains(pkg))
            .cloned()
            .collect()
    }
}

/// Union of all definitions that apply to `current_host`
pub fn build_desired_set(definitions: &[Definition], current_host: &str) -> BTreeSet<String> {
    definitions
        .iter()
        .filter(|def| def.host.as_deref().is_none_or(|host| host == current_host))
        .flat_map(|def| def.packages.iter().cloned())
        .collect()
}

/// Compute the diff between desired, installed and previously managed packages
///
/// `ignore` keeps packages out of both removal lists but never out of `to_add`.
pub fn compute_diff(
    desired: &BTreeSet<String>,
    installed: &BTreeSet<String>,
    previously_managed: &BTreeSet<String>,
    ignore: &BTreeSet<String>,
) -> PackageDiff {
    let to_add = desired.difference(installed).cloned().collect();

    let to_remove_strict = installed
        .iter()
        .filter(|pkg| !desired.contains(*pkg) && !ignore.contains(*pkg))
        .cloned()
        .collect();

    let to_remove_from_tool = previously_managed
        .intersection(installed)
        .filter(|pkg| !desired.contains(*pkg) && !ignore.contains(*pkg))
        .cloned()
        .collect();

    PackageDiff {
        to_add,
        to_remove_strict,
        to_remove_from_tool,
    }
}
