//! Durable credential storage.
//!
//! SYSTEM CONTEXT
//! ==============
//! `CredentialStore` is pure data access over a `StorageBackend` (browser
//! `localStorage` in the client crate, `sim::TabStorage` elsewhere). It holds
//! no business rules; validity decisions live in `monitor`.
//!
//! ERROR HANDLING
//! ==============
//! Writes report `StorageUnavailable` instead of panicking; reads and clears
//! log and degrade to "absent" so a broken storage area looks logged out.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::codec::Identity;
use crate::config::SessionConfig;
use crate::error::SessionError;

/// Key/value storage shared by every tab of one origin.
pub trait StorageBackend: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageUnavailable` when the storage area cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// # Errors
    ///
    /// Returns `StorageUnavailable` on quota or disabled-storage failures.
    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// # Errors
    ///
    /// Returns `StorageUnavailable` when the storage area cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), SessionError>;
}

/// A storage mutation observed from another tab.
///
/// `key == None` means the whole storage area was cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn StorageBackend>,
    credential_key: String,
    identity_key: String,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn StorageBackend>, config: &SessionConfig) -> Self {
        Self {
            backend,
            credential_key: config.credential_key.clone(),
            identity_key: config.identity_key.clone(),
        }
    }

    #[must_use]
    pub fn credential_key(&self) -> &str {
        &self.credential_key
    }

    /// Persist the raw credential.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` when the backend rejects the write.
    pub fn save(&self, credential: &str) -> Result<(), SessionError> {
        self.backend
            .set_item(&self.credential_key, credential)
            .inspect_err(|e| warn!(error = %e, key = %self.credential_key, "credential save failed"))
    }

    /// The raw stored credential, or `None` when absent or unreadable.
    #[must_use]
    pub fn read(&self) -> Option<String> {
        match self.backend.get_item(&self.credential_key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(error = %e, key = %self.credential_key, "credential read failed");
                None
            }
        }
    }

    /// Remove the credential and the cached identity. Safe to repeat.
    pub fn clear(&self) {
        for key in [&self.credential_key, &self.identity_key] {
            if let Err(e) = self.backend.remove_item(key) {
                warn!(error = %e, key = %key, "storage clear failed");
            }
        }
        debug!("credential store cleared");
    }

    /// Cache the identity derived from the current credential.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` when the backend rejects the write.
    pub fn save_identity(&self, identity: &Identity) -> Result<(), SessionError> {
        let raw = serde_json::to_string(identity).map_err(|e| SessionError::StorageUnavailable(e.to_string()))?;
        self.backend
            .set_item(&self.identity_key, &raw)
            .inspect_err(|e| warn!(error = %e, key = %self.identity_key, "identity save failed"))
    }

    /// The cached identity, if present and parseable.
    #[must_use]
    pub fn read_identity(&self) -> Option<Identity> {
        let raw = match self.backend.get_item(&self.identity_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, key = %self.identity_key, "identity read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(identity) => Some(identity),
            Err(e) => {
                debug!(error = %e, "cached identity unparseable");
                None
            }
        }
    }
}
