//! The operations exposed to the surrounding service.
//!
//! `Vault` ties the key ring, the versioned store and the audit trail
//! together. Callers are expected to have authenticated and authorized
//! `actor` already; this layer only records who it was.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::audit::{AuditAction, AuditDetails, AuditLog};
use crate::crypto::{decrypt_secret, encrypt_secret, secret_aad, KeyRing};
use crate::errors::{Result, VaultError};
use crate::rotation::{self, RotationReport};
use crate::vault::{Database, SecretStore, SecretVersion};

/// Handle for reading, writing and rotating secrets.
#[derive(Clone)]
pub struct Vault {
    keys: Arc<KeyRing>,
    store: SecretStore,
    audit: AuditLog,
}

impl Vault {
    pub fn new(keys: Arc<KeyRing>, db: Arc<Database>) -> Self {
        Self {
            keys,
            store: SecretStore::new(db.clone()),
            audit: AuditLog::new(db),
        }
    }

    /// Encrypt `plaintext` as the next version of `name`. Returns that version.
    pub fn write_secret(&self, name: &str, plaintext: &[u8], actor: &str) -> Result<u32> {
        validate_actor(actor)?;
        if plaintext.is_empty() {
            return Err(VaultError::ValidationError(
                "secret value cannot be empty".into(),
            ));
        }

        let stored = self.store.write(name, |version| {
            let aad = secret_aad(name, version);
            encrypt_secret(&self.keys, plaintext, aad.as_bytes())
        })?;

        tracing::info!(name, version = stored.version, actor, "secret written");
        self.audit_best_effort(stored.id, AuditAction::Write, actor, stored.version);

        Ok(stored.version)
    }

    /// Decrypt `version` of `name`, or the latest version when `None`.
    pub fn read_secret(
        &self,
        name: &str,
        version: Option<u32>,
        actor: &str,
    ) -> Result<Zeroizing<Vec<u8>>> {
        validate_actor(actor)?;

        let row: SecretVersion = match version {
            Some(0) => {
                return Err(VaultError::ValidationError(
                    "versions start at 1".into(),
                ))
            }
            Some(v) => self.store.read_version(name, v)?,
            None => self.store.read_latest(name)?,
        };

        let plaintext = decrypt_secret(&self.keys, &row.envelope, row.aad().as_bytes())
            .inspect_err(|e| {
                tracing::warn!(secret_id = row.id, error = %e, "failed to decrypt secret");
            })?;

        tracing::info!(name, version = row.version, actor, "secret read");
        self.audit_best_effort(row.id, AuditAction::Read, actor, row.version);

        Ok(plaintext)
    }

    /// Re-wrap every stored DEK under the configured primary KEK.
    pub fn rotate_all(&self) -> Result<RotationReport> {
        rotation::rotate_all(&self.keys, &self.store)
    }

    pub fn store(&self) -> &SecretStore {
        &self.store
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn keys(&self) -> &KeyRing {
        &self.keys
    }

    /// Audit writes never undo the operation they describe. A failure is
    /// reported in the log and otherwise dropped.
    fn audit_best_effort(&self, secret_id: i64, action: AuditAction, actor: &str, version: u32) {
        if let Err(e) = self
            .audit
            .record(secret_id, action, actor, AuditDetails { version })
        {
            tracing::warn!(secret_id, action = %action, error = %e, "audit record not written");
        }
    }
}

fn validate_actor(actor: &str) -> Result<()> {
    if actor.trim().is_empty() {
        return Err(VaultError::ValidationError("actor is required".into()));
    }
    Ok(())
}
