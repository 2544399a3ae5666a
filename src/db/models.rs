// src/db/models.rs

//! Data models for ditto database entities
//!
//! Each struct corresponds to a database table and carries the methods for
//! creating, reading and deleting its records.

use crate::error::Result;
use rusqlite::{Connection, Row, params};
use serde::Serialize;

/// A package ditto installed, on behalf of one host or globally
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedPackage {
    #[serde(skip)]
    pub id: Option<i64>,
    pub name: String,
    /// `None` marks a global record
    pub host: Option<String>,
    pub recorded_at: Option<String>,
}

impl ManagedPackage {
    /// Create a new record scoped to `host`
    pub fn new(name: String, host: Option<String>) -> Self {
        Self {
            id: None,
            name,
            host,
            recorded_at: None,
        }
    }

    /// Insert this record into the database
    ///
    /// An existing row for the same (name, host) pair is left in place.
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT OR IGNORE INTO managed_packages (name, host) VALUES (?1, ?2)",
            params![&self.name, &self.host],
        )?;

        let id = conn.query_row(
            "SELECT id FROM managed_packages WHERE name = ?1 AND host IS ?2",
            params![&self.name, &self.host],
            |row| row.get(0),
        )?;
        self.id = Some(id);
        Ok(id)
    }

    /// Find records visible to `host`: its own rows plus global rows
    pub fn find_by_host(conn: &Connection, host: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, host, recorded_at FROM managed_packages
             WHERE host = ?1 OR host IS NULL
             ORDER BY name, host",
        )?;

        let packages = stmt
            .query_map([host], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(packages)
    }

    /// List every record in the store, across all hosts
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, host, recorded_at FROM managed_packages ORDER BY name, host",
        )?;

        let packages = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(packages)
    }

    /// Delete every record owned by `host`; global rows are untouched
    pub fn delete_by_host(conn: &Connection, host: &str) -> Result<usize> {
        let removed = conn.execute("DELETE FROM managed_packages WHERE host = ?1", [host])?;
        Ok(removed)
    }

    /// Convert a database row to a ManagedPackage
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            host: row.get(2)?,
            recorded_at: row.get(3)?,
        })
    }
}
