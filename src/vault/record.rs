//! Row types read from and written to the `secrets` table.
//!
//! A `SecretVersion` is immutable once written, except for its wrapping
//! fields, which rotation may replace in place.

use chrono::{DateTime, Utc};

use crate::crypto::{secret_aad, SecretEnvelope, WrappedDek};

/// One stored version of a secret, still encrypted.
#[derive(Debug, Clone)]
pub struct SecretVersion {
    /// Row id (`secrets.id`), referenced by audit records.
    pub id: i64,
    pub name: String,
    pub version: u32,
    pub envelope: SecretEnvelope,
    pub created_at: DateTime<Utc>,
    /// Last time the wrapping fields changed.
    pub updated_at: DateTime<Utc>,
}

impl SecretVersion {
    /// The AAD this version was sealed with.
    pub fn aad(&self) -> String {
        secret_aad(&self.name, self.version)
    }
}

/// Identifies the row a successful write produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredVersion {
    pub id: i64,
    pub version: u32,
}

/// Metadata about one version, no ciphertext.
#[derive(Debug, Clone)]
pub struct VersionMetadata {
    pub version: u32,
    pub kek_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One secret name with its latest version number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretSummary {
    pub name: String,
    pub latest_version: u32,
    pub version_count: u32,
}

/// The wrapping fields of a row, as rotation sees them.
#[derive(Debug, Clone)]
pub struct WrappingRow {
    pub id: i64,
    pub name: String,
    pub version: u32,
    pub wrapped_dek: WrappedDek,
}
