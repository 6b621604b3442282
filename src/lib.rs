pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod rotation;
pub mod service;
pub mod vault;

pub use errors::{Result, VaultError};
pub use service::Vault;
