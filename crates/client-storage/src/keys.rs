//! Storage key constants.

/// Storage keys used by the client
pub struct StorageKeys;

impl StorageKeys {
    /// Persisted credential record (JSON `{accessToken, refreshToken?}`)
    pub const CREDENTIALS: &'static str = "feedline.credentials";
}
