//! # Sealed Storage
//!
//! Disk-backed persistence for session state, reports, and the cached
//! question graph.

pub mod vault;

pub use vault::Vault;
