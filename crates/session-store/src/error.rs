//! Session error types.

use api_boundary::ApiError;
use client_storage::StorageError;
use thiserror::Error;

/// Session store error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Provider or transport failure, shown with the provider's own message
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The credential record could not be written
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Operation needs a session and there is none
    #[error("Not logged in")]
    NotLoggedIn,

    /// A logout happened while the request was in flight; its result was discarded
    #[error("Session ended while the request was in flight")]
    Superseded,

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),
}

impl AuthError {
    /// The provider failure behind this error, if any.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            AuthError::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
