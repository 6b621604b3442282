//! Audit trail — one append-only row per successful secret read or write.
//!
//! Records live in the `audit_logs` table next to the secrets they
//! describe. Callers write them only after the documented operation has
//! succeeded, and treat a failed audit write as a warning rather than a
//! reason to undo that operation.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};
use crate::vault::db::{timestamp, timestamp_column, Database};

/// What was done to a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Read,
    Write,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "READ" => Ok(Self::Read),
            "WRITE" => Ok(Self::Write),
            other => Err(VaultError::AuditError(format!("unknown audit action '{other}'"))),
        }
    }
}

/// Structured `details` column, stored as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditDetails {
    pub version: u32,
}

/// A single audit log entry, joined with the secret's name.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub secret_id: i64,
    pub secret_name: String,
    pub action: AuditAction,
    pub actor: String,
    pub details: AuditDetails,
    pub created_at: DateTime<Utc>,
}

/// SQLite-backed audit log.
#[derive(Clone)]
pub struct AuditLog {
    db: Arc<Database>,
}

impl AuditLog {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append one record. Returns the new record's id.
    pub fn record(
        &self,
        secret_id: i64,
        action: AuditAction,
        actor: &str,
        details: AuditDetails,
    ) -> Result<i64> {
        let details_json = serde_json::to_string(&details)
            .map_err(|e| VaultError::SerializationError(format!("audit details: {e}")))?;

        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO audit_logs (secret_id, action, actor, details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                secret_id,
                action.as_str(),
                actor,
                details_json,
                timestamp(Utc::now())
            ],
        )
        .map_err(|e| VaultError::AuditError(format!("insert: {e}")))?;

        Ok(conn.last_insert_rowid())
    }

    /// Query recent audit entries.
    ///
    /// - `limit`: maximum number of entries to return (most recent first).
    /// - `since`: if provided, only return entries at or after this time.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        // An epoch lower bound keeps a single statement for both cases.
        let since_text = timestamp(since.unwrap_or(DateTime::<Utc>::UNIX_EPOCH));

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(
                "SELECT a.id, a.secret_id, s.name, a.action, a.actor, a.details, a.created_at
                 FROM audit_logs a
                 JOIN secrets s ON s.id = a.secret_id
                 WHERE a.created_at >= ?1
                 ORDER BY a.id DESC
                 LIMIT ?2",
            )
            .map_err(|e| VaultError::AuditError(format!("query prepare: {e}")))?;

        let rows = stmt
            .query_map(rusqlite::params![since_text, limit_i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    timestamp_column(row, 6)?,
                ))
            })
            .map_err(|e| VaultError::AuditError(format!("query exec: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, secret_id, secret_name, action, actor, details, created_at) =
                row.map_err(|e| VaultError::AuditError(format!("row parse: {e}")))?;

            entries.push(AuditEntry {
                id,
                secret_id,
                secret_name,
                action: action.parse()?,
                actor,
                details: serde_json::from_str(&details)
                    .map_err(|e| VaultError::AuditError(format!("details JSON: {e}")))?,
                created_at,
            });
        }

        Ok(entries)
    }

    /// Delete records older than `days` days. Returns how many were removed.
    ///
    /// Only the explicit maintenance command calls this; reads and writes
    /// never delete audit history.
    /// A window reaching past the earliest representable time is a
    /// `ValidationError`.
    pub fn prune_older_than(&self, days: u32) -> Result<usize> {
        let cutoff = TimeDelta::try_days(i64::from(days))
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| {
                VaultError::ValidationError(format!("retention of {days} days is out of range"))
            })?;
        let conn = self.db.conn();
        let removed = conn
            .execute(
                "DELETE FROM audit_logs WHERE created_at < ?1",
                rusqlite::params![timestamp(cutoff)],
            )
            .map_err(|e| VaultError::AuditError(format!("prune: {e}")))?;

        tracing::info!(removed, days, "pruned audit records");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{SecretEnvelope, WrappedDek};
    use crate::vault::SecretStore;

    fn setup() -> (SecretStore, AuditLog) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        (SecretStore::new(db.clone()), AuditLog::new(db))
    }

    fn seed(store: &SecretStore, name: &str) -> i64 {
        store
            .write(name, |_| {
                Ok(SecretEnvelope {
                    wrapped_dek: WrappedDek {
                        nonce: [0; 12],
                        ciphertext: vec![0; 48],
                        kek_id: Some("primary".into()),
                    },
                    nonce: [0; 12],
                    tag: [0; 16],
                    ciphertext: vec![1, 2, 3],
                })
            })
            .unwrap()
            .id
    }

    #[test]
    fn record_and_query_roundtrip() {
        let (store, audit) = setup();
        let id = seed(&store, "db/password");

        audit
            .record(id, AuditAction::Write, "alice", AuditDetails { version: 1 })
            .unwrap();
        audit
            .record(id, AuditAction::Read, "bob", AuditDetails { version: 1 })
            .unwrap();

        let entries = audit.query(10, None).unwrap();
        assert_eq!(entries.len(), 2);

        // Most recent first.
        assert_eq!(entries[0].action, AuditAction::Read);
        assert_eq!(entries[0].actor, "bob");
        assert_eq!(entries[1].action, AuditAction::Write);
        assert_eq!(entries[1].secret_name, "db/password");
        assert_eq!(entries[1].details, AuditDetails { version: 1 });
    }

    #[test]
    fn query_with_limit() {
        let (store, audit) = setup();
        let id = seed(&store, "k");
        for _ in 0..10 {
            audit
                .record(id, AuditAction::Read, "svc", AuditDetails { version: 1 })
                .unwrap();
        }
        assert_eq!(audit.query(3, None).unwrap().len(), 3);
    }

    #[test]
    fn query_with_since_filter() {
        let (store, audit) = setup();
        let id = seed(&store, "k");
        audit
            .record(id, AuditAction::Write, "svc", AuditDetails { version: 1 })
            .unwrap();

        let past = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(audit.query(10, Some(past)).unwrap().len(), 1);

        let future = Utc::now() + chrono::Duration::hours(1);
        assert!(audit.query(10, Some(future)).unwrap().is_empty());
    }

    #[test]
    fn record_rejects_unknown_secret() {
        let (_store, audit) = setup();
        let result = audit.record(999, AuditAction::Read, "svc", AuditDetails { version: 1 });
        assert!(matches!(result, Err(VaultError::AuditError(_))));
    }

    #[test]
    fn prune_keeps_recent_records() {
        let (store, audit) = setup();
        let id = seed(&store, "k");
        audit
            .record(id, AuditAction::Write, "svc", AuditDetails { version: 1 })
            .unwrap();

        assert_eq!(audit.prune_older_than(180).unwrap(), 0);
        assert_eq!(audit.query(10, None).unwrap().len(), 1);
    }

    #[test]
    fn prune_rejects_out_of_range_retention() {
        let (store, audit) = setup();
        let id = seed(&store, "k");
        audit
            .record(id, AuditAction::Write, "svc", AuditDetails { version: 1 })
            .unwrap();

        assert!(matches!(
            audit.prune_older_than(u32::MAX),
            Err(VaultError::ValidationError(_))
        ));
        assert_eq!(audit.query(10, None).unwrap().len(), 1);
    }

    #[test]
    fn prune_removes_expired_records() {
        let (store, audit) = setup();
        let id = seed(&store, "k");
        audit
            .record(id, AuditAction::Write, "svc", AuditDetails { version: 1 })
            .unwrap();
        audit
            .db
            .conn()
            .execute(
                "UPDATE audit_logs SET created_at = ?1",
                rusqlite::params![timestamp(Utc::now() - TimeDelta::days(30))],
            )
            .unwrap();

        assert_eq!(audit.prune_older_than(7).unwrap(), 1);
        assert!(audit.query(10, None).unwrap().is_empty());
    }

    #[test]
    fn query_reports_corrupt_timestamps() {
        let (store, audit) = setup();
        let id = seed(&store, "k");
        audit
            .record(id, AuditAction::Read, "svc", AuditDetails { version: 1 })
            .unwrap();
        audit
            .db
            .conn()
            .execute("UPDATE audit_logs SET created_at = 'zzzz'", [])
            .unwrap();

        assert!(matches!(
            audit.query(10, None),
            Err(VaultError::AuditError(_))
        ));
    }

    #[test]
    fn action_parses_from_stored_text() {
        assert_eq!("READ".parse::<AuditAction>().unwrap(), AuditAction::Read);
        assert_eq!(AuditAction::Write.to_string(), "WRITE");
        assert!("DELETE".parse::<AuditAction>().is_err());
    }
}
