//! Cryptographic core of KekVault.
//!
//! This module provides:
//! - AES-256-GCM sealing with detached nonce and tag (`encryption`)
//! - Master key parsing and validation (`master`)
//! - HKDF-derived KEKs and the shared `KeyRing` (`kek`)
//! - DEK wrap/unwrap under a KEK (`wrap`)
//! - Per-secret envelope encryption (`envelope`)

pub mod encryption;
pub mod envelope;
pub mod kek;
pub mod master;
pub mod wrap;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{KeyRing, encrypt_secret, ...};
pub use encryption::{KEY_LEN, NONCE_LEN, TAG_LEN};
pub use envelope::{decrypt_secret, encrypt_secret, secret_aad, SecretEnvelope};
pub use kek::{derive_kek, DerivedKek, KeyRing};
pub use master::{MasterKey, MasterKeySet, LEGACY_KEY_ID};
pub use wrap::{unwrap_dek, wrap_dek, WrappedDek};
