// src/packages/traits.rs

//! Common trait for system package-manager backends

use crate::error::Result;

/// Interface to the system package manager
///
/// Each method is one synchronous external-process invocation; a non-zero
/// exit is reported as an error.
pub trait PackageManager {
    /// Names of every installed package
    fn list_installed(&self) -> Result<Vec<String>>;

    /// Install `packages`, forwarding `extra_args` verbatim
    fn install(&self, packages: &[String], extra_args: &[String]) -> Result<()>;

    /// Remove `packages`, forwarding `extra_args` verbatim
    fn remove(&self, packages: &[String], extra_args: &[String]) -> Result<()>;
}
