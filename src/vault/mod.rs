//! Vault module — persisted secret versions.
//!
//! This module provides:
//! - The shared SQLite `Database` and its schema (`db`)
//! - Row types for stored versions and their metadata (`record`)
//! - The versioned `SecretStore` (`store`)

pub mod db;
pub mod record;
pub mod store;

// Re-export the most commonly used items.
pub use db::{Database, DEFAULT_BUSY_TIMEOUT};
pub use record::{SecretSummary, SecretVersion, StoredVersion, VersionMetadata, WrappingRow};
pub use store::{validate_secret_name, SecretStore};
