// src/host.rs

//! Current host resolution

use crate::error::{Error, Result};
use tracing::debug;

/// Resolve the hostname used to scope definitions and managed records
pub fn current_host() -> Result<String> {
    let raw = nix::unistd::gethostname().map_err(|e| Error::HostResolution(e.to_string()))?;
    let host = raw
        .into_string()
        .map_err(|raw| Error::HostResolution(format!("hostname is not valid UTF-8: {:?}", raw)))?;

    let host = host.trim().to_string();
    if host.is_empty() {
        return Err(Error::HostResolution("hostname is empty".to_string()));
    }

    debug!("Current host: {}", host);
    Ok(host)
}
