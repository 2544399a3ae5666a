// src/packages/mod.rs

//! Package-manager backends for ditto
//!
//! Backends implement the `PackageManager` trait. Only pacman (and the AUR
//! helpers that mimic its command line) is supported.

pub mod pacman;
pub mod traits;

pub use pacman::Pacman;
pub use traits::PackageManager;
