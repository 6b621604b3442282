//! Versioned secret store on top of the `secrets` table.
//!
//! Versions for a name run 1, 2, 3, ... with no gaps. `write` picks the
//! next number and inserts the row inside one `BEGIN IMMEDIATE`
//! transaction, so two writers racing on the same name (in this process or
//! another one sharing the file) take turns instead of colliding. The
//! `UNIQUE (name, version)` constraint backs this up at the schema level.

use std::sync::Arc;

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};

use crate::crypto::{SecretEnvelope, WrappedDek};
use crate::errors::{Result, VaultError};

use super::db::{timestamp, timestamp_column, Database};
use super::record::{SecretSummary, SecretVersion, StoredVersion, VersionMetadata, WrappingRow};

/// Maximum length of a secret name in bytes.
const MAX_NAME_LEN: usize = 256;

const SELECT_VERSION: &str = "SELECT id, name, version, ciphertext, nonce, tag,
            wrapped_dek, dek_nonce, kek_id, created_at, updated_at
     FROM secrets";

/// Handle on the persisted secret versions.
#[derive(Clone)]
pub struct SecretStore {
    db: Arc<Database>,
}

impl SecretStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// The version the next write to `name` would get: `max + 1`, or 1.
    ///
    /// Informational only. `write` recomputes it under its own lock.
    pub fn next_version(&self, name: &str) -> Result<u32> {
        validate_secret_name(name)?;
        let conn = self.db.conn();
        let next = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM secrets WHERE name = ?1",
            params![name],
            |r| r.get(0),
        )?;
        Ok(next)
    }

    /// Insert the next version of `name`.
    ///
    /// `seal` receives the version number chosen for this row and returns
    /// the envelope to store; it runs while the write lock is held, so the
    /// version it seals for is the version that gets stored. If `seal`
    /// fails nothing is written.
    pub fn write<F>(&self, name: &str, seal: F) -> Result<StoredVersion>
    where
        F: FnOnce(u32) -> Result<SecretEnvelope>,
    {
        validate_secret_name(name)?;

        let mut conn = self.db.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let version: u32 = tx.query_row(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM secrets WHERE name = ?1",
            params![name],
            |r| r.get(0),
        )?;

        let envelope = seal(version)?;
        let now = timestamp(Utc::now());

        tx.execute(
            "INSERT INTO secrets (name, version, ciphertext, nonce, tag,
                                  wrapped_dek, dek_nonce, kek_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                name,
                version,
                envelope.ciphertext,
                envelope.nonce.as_slice(),
                envelope.tag.as_slice(),
                envelope.wrapped_dek.ciphertext,
                envelope.wrapped_dek.nonce.as_slice(),
                envelope.wrapped_dek.kek_id,
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(secret_id = id, name, version, "stored secret version");
        Ok(StoredVersion { id, version })
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// The version of `name` with the highest number.
    pub fn read_latest(&self, name: &str) -> Result<SecretVersion> {
        validate_secret_name(name)?;
        let conn = self.db.conn();
        conn.query_row(
            &format!("{SELECT_VERSION} WHERE name = ?1 ORDER BY version DESC LIMIT 1"),
            params![name],
            secret_from_row,
        )
        .optional()?
        .ok_or_else(|| VaultError::NotFound {
            name: name.to_string(),
            version: None,
        })
    }

    /// One specific version of `name`.
    pub fn read_version(&self, name: &str, version: u32) -> Result<SecretVersion> {
        validate_secret_name(name)?;
        let conn = self.db.conn();
        conn.query_row(
            &format!("{SELECT_VERSION} WHERE name = ?1 AND version = ?2"),
            params![name, version],
            secret_from_row,
        )
        .optional()?
        .ok_or_else(|| VaultError::NotFound {
            name: name.to_string(),
            version: Some(version),
        })
    }

    /// Metadata for every version of `name`, oldest first.
    pub fn list_versions(&self, name: &str) -> Result<Vec<VersionMetadata>> {
        validate_secret_name(name)?;
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT version, kek_id, created_at, updated_at
             FROM secrets WHERE name = ?1 ORDER BY version ASC",
        )?;
        let rows = stmt.query_map(params![name], |row| {
            Ok(VersionMetadata {
                version: row.get(0)?,
                kek_id: row.get(1)?,
                created_at: timestamp_column(row, 2)?,
                updated_at: timestamp_column(row, 3)?,
            })
        })?;

        let versions = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        if versions.is_empty() {
            return Err(VaultError::NotFound {
                name: name.to_string(),
                version: None,
            });
        }
        Ok(versions)
    }

    /// Every secret name with its latest version, sorted by name.
    pub fn list_secrets(&self) -> Result<Vec<SecretSummary>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT name, MAX(version), COUNT(*) FROM secrets GROUP BY name ORDER BY name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SecretSummary {
                name: row.get(0)?,
                latest_version: row.get(1)?,
                version_count: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ------------------------------------------------------------------
    // Rotation support
    // ------------------------------------------------------------------

    /// The wrapping fields of every row, in id order.
    pub fn wrapping_rows(&self) -> Result<Vec<WrappingRow>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, version, wrapped_dek, dek_nonce, kek_id FROM secrets ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(WrappingRow {
                id: row.get(0)?,
                name: row.get(1)?,
                version: row.get(2)?,
                wrapped_dek: WrappedDek {
                    ciphertext: row.get(3)?,
                    nonce: blob_array(row, 4)?,
                    kek_id: row.get(5)?,
                },
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Swap a row's wrapping fields, but only if they still equal `expected`.
    ///
    /// Returns `false` when the row changed (or vanished) since `expected`
    /// was read; the caller then leaves it alone. Ciphertext, payload nonce,
    /// tag and version are never touched.
    pub fn replace_wrapping(
        &self,
        id: i64,
        expected: &WrappedDek,
        replacement: &WrappedDek,
    ) -> Result<bool> {
        let conn = self.db.conn();
        let changed = conn.execute(
            "UPDATE secrets
             SET wrapped_dek = ?1, dek_nonce = ?2, kek_id = ?3, updated_at = ?4
             WHERE id = ?5 AND wrapped_dek = ?6 AND dek_nonce = ?7 AND kek_id IS ?8",
            params![
                replacement.ciphertext,
                replacement.nonce.as_slice(),
                replacement.kek_id,
                timestamp(Utc::now()),
                id,
                expected.ciphertext,
                expected.nonce.as_slice(),
                expected.kek_id,
            ],
        )?;
        Ok(changed == 1)
    }
}

// ----------------------------------------------------------------------
// Row decoding
// ----------------------------------------------------------------------

fn secret_from_row(row: &Row<'_>) -> rusqlite::Result<SecretVersion> {
    Ok(SecretVersion {
        id: row.get(0)?,
        name: row.get(1)?,
        version: row.get(2)?,
        envelope: SecretEnvelope {
            ciphertext: row.get(3)?,
            nonce: blob_array(row, 4)?,
            tag: blob_array(row, 5)?,
            wrapped_dek: WrappedDek {
                ciphertext: row.get(6)?,
                nonce: blob_array(row, 7)?,
                kek_id: row.get(8)?,
            },
        },
        created_at: timestamp_column(row, 9)?,
        updated_at: timestamp_column(row, 10)?,
    })
}

/// Read a fixed-size blob column (nonces, tags).
fn blob_array<const N: usize>(row: &Row<'_>, idx: usize) -> rusqlite::Result<[u8; N]> {
    let bytes: Vec<u8> = row.get(idx)?;
    <[u8; N]>::try_from(bytes.as_slice())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Blob, Box::new(e)))
}

// ----------------------------------------------------------------------
// Validation
// ----------------------------------------------------------------------

/// Validate that a secret name is usable.
///
/// Must be non-empty, at most 256 bytes, and free of control characters.
/// Separators such as `/` and `:` are allowed; the AAD stays unambiguous
/// because the version is always the text after the last `:`.
pub fn validate_secret_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(VaultError::ValidationError(
            "secret name cannot be empty".into(),
        ));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(VaultError::ValidationError(format!(
            "secret name cannot exceed {MAX_NAME_LEN} bytes"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(VaultError::ValidationError(
            "secret name cannot contain control characters".into(),
        ));
    }
    Ok(())
}
