// src/db/store.rs

//! Managed-state store
//!
//! Records which packages ditto put in place for each host so a later sync can
//! retire them without touching packages installed by anything else.

use crate::db::models::ManagedPackage;
use crate::db::{self, schema};
use crate::error::Result;
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Read-by-host / replace-for-host access to managed package records
pub trait ManagedStore {
    /// Packages recorded for `host` together with globally recorded ones
    fn get_managed(&self, host: &str) -> Result<BTreeSet<String>>;

    /// Replace every record for `host` with `packages`, all-or-nothing
    fn replace_managed(&mut self, host: &str, packages: &BTreeSet<String>) -> Result<()>;
}

/// SQLite-backed [`ManagedStore`]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the store at `db_path`, creating and migrating it if needed
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        db::init(db_path)?;
        let conn = db::open(db_path)?;
        Ok(Self { conn })
    }

    /// Wrap an already-open connection, bringing its schema up to date
    pub fn from_connection(conn: Connection) -> Result<Self> {
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Raw records visible to `host`, including the global ones
    pub fn records_for(&self, host: &str) -> Result<Vec<ManagedPackage>> {
        ManagedPackage::find_by_host(&self.conn, host)
    }
}

impl ManagedStore for SqliteStore {
    fn get_managed(&self, host: &str) -> Result<BTreeSet<String>> {
        let packages = ManagedPackage::find_by_host(&self.conn, host)?
            .into_iter()
            .map(|p| p.name)
            .collect();
        Ok(packages)
    }

    fn replace_managed(&mut self, host: &str, packages: &BTreeSet<String>) -> Result<()> {
        db::transaction(&mut self.conn, |tx| {
            let removed = ManagedPackage::delete_by_host(tx, host)?;
            debug!("Cleared {} managed record(s) for host {}", removed, host);

            for name in packages {
                ManagedPackage::new(name.clone(), Some(host.to_string())).insert(tx)?;
            }
            Ok(())
        })?;

        debug!("Recorded {} managed package(s) for host {}", packages.len(), host);
        Ok(())
    }
}
