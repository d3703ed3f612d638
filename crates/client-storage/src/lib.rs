//! Durable credential storage for the Feedline client.
//!
//! This crate provides:
//! - the `SecureStorage` key-value abstraction
//! - a file-backed implementation (`~/.feedline/credentials.json`, mode 0600)
//! - an in-memory implementation for tests
//! - `CredentialVault`, which owns the encoding of the persisted token pair

mod credentials;
mod file;
mod keys;
mod memory;
mod traits;

pub use credentials::{CredentialRead, CredentialVault, PersistedCredentials};
pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::SecureStorage;

use client_config_and_utils::Paths;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create the default storage implementation under the client state directory.
pub fn create_storage(paths: &Paths) -> Box<dyn SecureStorage> {
    Box::new(FileStorage::new(paths.credentials_file()))
}

/// Create a CredentialVault with the default storage.
pub fn create_credential_vault(paths: &Paths) -> CredentialVault {
    CredentialVault::new(create_storage(paths))
}
