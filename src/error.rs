//! Error taxonomy for the session subsystem.
//!
//! ERROR HANDLING
//! ==============
//! None of these reach UI code as failures. The monitor reduces every
//! decode or storage error to `authenticated == false` and keeps the last
//! eviction reason around so the login surface can explain what happened.

use time::OffsetDateTime;

use crate::codec::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The stored credential could not be decoded.
    #[error("malformed credential: {0}")]
    MalformedCredential(#[from] DecodeError),

    /// The credential decoded but its validity window has passed.
    #[error("credential expired at {expired_at}")]
    ExpiredCredential { expired_at: OffsetDateTime },

    /// Durable storage rejected a read or write (quota, disabled storage).
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// An authenticated API call came back with 401.
    #[error("unauthorized response")]
    Unauthorized,

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),
}

impl SessionError {
    /// Whether this failure means a previously valid session ran out.
    #[must_use]
    pub fn is_expiry(&self) -> bool {
        matches!(self, Self::ExpiredCredential { .. } | Self::Unauthorized)
    }
}
