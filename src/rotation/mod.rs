//! KEK rotation: re-wrap every stored DEK under the current primary KEK.
//!
//! Only the wrapping fields change. Each row keeps its DEK, so its payload
//! ciphertext, payload nonce, tag and version stay byte-for-byte the same.
//!
//! The batch tolerates bad rows: a row whose DEK cannot be unwrapped is
//! logged and skipped. Each update is a compare-and-swap on the wrapping
//! the job read, so a row that changed underneath the job is reported as a
//! conflict instead of being overwritten.

use crate::crypto::{unwrap_dek, wrap_dek, KeyRing};
use crate::errors::Result;
use crate::vault::{SecretStore, WrappingRow};

/// A row rotation could not re-wrap.
#[derive(Debug, Clone)]
pub struct RotationFailure {
    pub secret_id: i64,
    pub name: String,
    pub version: u32,
    pub reason: String,
}

/// Outcome of one rotation run.
#[derive(Debug, Clone, Default)]
pub struct RotationReport {
    /// KEK every re-wrapped row now names.
    pub primary_kek_id: String,
    pub scanned: usize,
    pub rewrapped: usize,
    /// Rows whose wrapping changed between read and update.
    pub conflicts: usize,
    pub skipped: Vec<RotationFailure>,
}

impl RotationReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.conflicts == 0
    }
}

/// Re-wrap every row's DEK under `ring`'s primary KEK.
///
/// Unwrap failures are per-row and never abort the batch. Failures that
/// are not about a particular row (no usable primary KEK, storage errors)
/// stop the run and are returned; rows already updated stay updated.
pub fn rotate_all(ring: &KeyRing, store: &SecretStore) -> Result<RotationReport> {
    let rows = store.wrapping_rows()?;
    rotate_rows(ring, store, rows)
}

/// Re-wrap `rows` as read earlier from `store`. Any row whose wrapping no
/// longer matches what was read is counted as a conflict.
fn rotate_rows(
    ring: &KeyRing,
    store: &SecretStore,
    rows: Vec<WrappingRow>,
) -> Result<RotationReport> {
    let mut report = RotationReport {
        primary_kek_id: ring.primary_id().to_string(),
        scanned: rows.len(),
        ..RotationReport::default()
    };

    tracing::info!(
        rows = rows.len(),
        primary = ring.primary_id(),
        "starting KEK rotation"
    );

    for row in rows {
        let current = &row.wrapped_dek;
        let dek = match unwrap_dek(
            ring,
            current.kek_id.as_deref(),
            &current.nonce,
            &current.ciphertext,
        ) {
            Ok(dek) => dek,
            Err(e) => {
                tracing::warn!(
                    secret_id = row.id,
                    kek_id = current.kek_id.as_deref().unwrap_or("<none>"),
                    error = %e,
                    "failed to unwrap DEK, skipping row"
                );
                report.skipped.push(RotationFailure {
                    secret_id: row.id,
                    name: row.name,
                    version: row.version,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let rewrapped = wrap_dek(ring, &dek)?;

        if store.replace_wrapping(row.id, current, &rewrapped)? {
            tracing::debug!(
                secret_id = row.id,
                kek_id = ring.primary_id(),
                "re-wrapped DEK"
            );
            report.rewrapped += 1;
        } else {
            tracing::warn!(
                secret_id = row.id,
                "row changed during rotation, leaving it for the next run"
            );
            report.conflicts += 1;
        }
    }

    tracing::info!(
        scanned = report.scanned,
        rewrapped = report.rewrapped,
        skipped = report.skipped.len(),
        conflicts = report.conflicts,
        "KEK rotation finished"
    );

    Ok(report)
}
