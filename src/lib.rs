// src/lib.rs

//! Ditto
//!
//! Declarative, host-aware package sync for pacman-based systems.
//!
//! # Architecture
//!
//! - Definitions: `.pkgs` files, optionally scoped to a host under `hosts/`
//! - Three-way diff: desired vs. installed vs. previously managed by ditto
//! - Managed state in SQLite, replaced per host in a single transaction
//! - Explicit context: every stage receives its collaborators as arguments

pub mod config;
pub mod db;
pub mod definitions;
pub mod display;
mod error;
pub mod host;
pub mod packages;
pub mod sync;

pub use error::{Error, Result};
