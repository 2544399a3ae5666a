// src/db/schema.rs

//! Database schema definitions and migrations for ditto
//!
//! The store only has one real table, `managed_packages`, but it is versioned
//! the same way a larger schema would be so later changes can be applied in
//! place to databases already synced between machines.

use crate::error::Result;
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Initialize the schema version tracking table
fn init_schema_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    init_schema_version(conn)?;

    let version: Option<i32> = conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version.unwrap_or(0))
}

/// Set the schema version
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Apply all pending migrations to bring the database up to date
pub fn migrate(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    debug!("Current schema version: {}", current_version);

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        info!("Applying migration to version {}", version);
        apply_migration(conn, version)?;
        set_schema_version(conn, version)?;
    }

    Ok(())
}

/// Apply a specific migration version
fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        2 => migrate_v2(conn),
        _ => Ok(()),
    }
}

/// Initial schema - Version 1
///
/// `managed_packages` holds one row per package ditto installed. A NULL host
/// marks a global record that applies to every machine.
fn migrate_v1(conn: &Connection) -> Result<()> {
    debug!("Creating schema version 1");

    conn.execute_batch(
        "
        CREATE TABLE managed_packages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            host TEXT,
            recorded_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX idx_managed_packages_host ON managed_packages(host);
        ",
    )?;

    Ok(())
}

/// Schema Version 2: enforce one row per (package, host) pair
///
/// SQLite treats NULLs as distinct in UNIQUE constraints, so the global case is
/// folded to an empty string inside the index expression.
fn migrate_v2(conn: &Connection) -> Result<()> {
    debug!("Migrating to schema version 2");

    conn.execute_batch(
        "
        DELETE FROM managed_packages
        WHERE id NOT IN (
            SELECT MIN(id) FROM managed_packages GROUP BY name, IFNULL(host, '')
        );

        CREATE UNIQUE INDEX idx_managed_packages_unique
            ON managed_packages(name, IFNULL(host, ''));
        ",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_db() -> (NamedTempFile, Connection) {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = Connection::open(temp_file.path()).unwrap();
        (temp_file, conn)
    }

    #[test]
    fn test_schema_version_tracking() {
        let (_temp, conn) = create_test_db();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, 0);

        set_schema_version(&conn, 1).unwrap();
        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_migrate_creates_tables() {
        let (_temp, conn) = create_test_db();

        migrate(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"managed_packages".to_string()));
        assert!(tables.contains(&"schema_version".to_string()));
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let (_temp, conn) = create_test_db();

        migrate(&conn).unwrap();
        let version1 = get_schema_version(&conn).unwrap();

        migrate(&conn).unwrap();
        let version2 = get_schema_version(&conn).unwrap();

        assert_eq!(version1, version2);
        assert_eq!(version1, SCHEMA_VERSION);
    }

    #[test]
    fn test_unique_per_package_and_host() {
        let (_temp, conn) = create_test_db();
        migrate(&conn).unwrap();

        conn.execute(
            "INSERT INTO managed_packages (name, host) VALUES ('vim', 'box')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO managed_packages (name, host) VALUES ('vim', 'box')",
            [],
        );
        assert!(dup.is_err());

        // Same package for another host, and globally, is fine once each
        conn.execute(
            "INSERT INTO managed_packages (name, host) VALUES ('vim', 'other')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO managed_packages (name, host) VALUES ('vim', NULL)",
            [],
        )
        .unwrap();
        let global_dup = conn.execute(
            "INSERT INTO managed_packages (name, host) VALUES ('vim', NULL)",
            [],
        );
        assert!(global_dup.is_err());
    }

    #[test]
    fn test_v2_collapses_existing_duplicates() {
        let (_temp, conn) = create_test_db();
        init_schema_version(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        set_schema_version(&conn, 1).unwrap();

        for _ in 0..3 {
            conn.execute(
                "INSERT INTO managed_packages (name, host) VALUES ('htop', NULL)",
                [],
            )
            .unwrap();
        }

        migrate(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM managed_packages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
