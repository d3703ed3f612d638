//! Persisted credential record: the only session state that survives restart.

use crate::{SecureStorage, StorageError, StorageKeys, StorageResult};
use serde::{Deserialize, Serialize};

/// Token pair written after a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCredentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl PersistedCredentials {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }
}

/// Outcome of reading the credential record.
///
/// `Corrupt` is handled exactly like `Absent` by callers; it exists so the
/// decode failure can still be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialRead {
    Present(PersistedCredentials),
    Absent,
    Corrupt(String),
}

impl CredentialRead {
    /// The stored credentials, if usable.
    pub fn credentials(&self) -> Option<&PersistedCredentials> {
        match self {
            CredentialRead::Present(credentials) => Some(credentials),
            CredentialRead::Absent | CredentialRead::Corrupt(_) => None,
        }
    }
}

/// Reads and writes the credential record under [`StorageKeys::CREDENTIALS`].
pub struct CredentialVault {
    storage: Box<dyn SecureStorage>,
}

impl CredentialVault {
    /// Create a vault over the given storage backend
    pub fn new(storage: Box<dyn SecureStorage>) -> Self {
        Self { storage }
    }

    /// Read the stored record.
    ///
    /// Only backend failures are errors; an undecodable value is `Corrupt`.
    pub fn read(&self) -> StorageResult<CredentialRead> {
        let Some(json) = self.storage.get(StorageKeys::CREDENTIALS)? else {
            return Ok(CredentialRead::Absent);
        };

        match serde_json::from_str::<PersistedCredentials>(&json) {
            Ok(credentials) if credentials.access_token.is_empty() => {
                Ok(CredentialRead::Corrupt("stored access token is empty".to_string()))
            }
            Ok(credentials) => Ok(CredentialRead::Present(credentials)),
            Err(e) => Ok(CredentialRead::Corrupt(e.to_string())),
        }
    }

    /// Overwrite the stored record.
    pub fn persist(&self, credentials: &PersistedCredentials) -> StorageResult<()> {
        let json = serde_json::to_string(credentials)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.storage.set(StorageKeys::CREDENTIALS, &json)
    }

    /// Erase the stored record, returning whether one existed.
    pub fn clear(&self) -> StorageResult<bool> {
        self.storage.delete(StorageKeys::CREDENTIALS)
    }
}
