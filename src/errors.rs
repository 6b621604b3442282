use thiserror::Error;

/// All errors that can occur in KekVault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Key configuration ---
    #[error("Master key configuration error: {0}")]
    ConfigError(String),

    #[error("KEK '{0}' is not loaded — refusing to substitute another key")]
    KeyNotFound(String),

    // --- Crypto errors ---
    /// Tag verification failed while unwrapping the DEK or while opening
    /// the payload. Both stages render the same message.
    #[error("Authentication failed — data was tampered with or the key/context does not match")]
    AuthenticationFailed,

    #[error("Internal crypto error: {0}")]
    InternalCryptoError(String),

    // --- Store errors ---
    #[error("{}", not_found_message(name, *version))]
    NotFound { name: String, version: Option<u32> },

    #[error("Invalid input: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Audit error: {0}")]
    AuditError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

fn not_found_message(name: &str, version: Option<u32>) -> String {
    match version {
        Some(v) => format!("Secret '{name}' has no version {v}"),
        None => format!("Secret '{name}' not found"),
    }
}

/// Convenience type alias for KekVault results.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_renders_version_when_present() {
        let err = VaultError::NotFound {
            name: "api-key".into(),
            version: Some(3),
        };
        assert_eq!(err.to_string(), "Secret 'api-key' has no version 3");

        let err = VaultError::NotFound {
            name: "api-key".into(),
            version: None,
        };
        assert_eq!(err.to_string(), "Secret 'api-key' not found");
    }
}
