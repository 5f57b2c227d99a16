//! `localStorage` as a session `StorageBackend`.
//!
//! SYSTEM CONTEXT
//! ==============
//! `CredentialStore` writes the raw credential and cached identity through
//! this backend. The storage handle is looked up on every call instead of
//! being held, so the backend stays `Send + Sync` and works during SSR,
//! where it reads as empty and rejects writes.

use paytrack_session::{SessionError, StorageBackend};

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageBackend;

#[cfg(feature = "hydrate")]
fn storage() -> Result<web_sys::Storage, SessionError> {
    web_sys::window()
        .ok_or_else(|| SessionError::StorageUnavailable("no window".to_owned()))?
        .local_storage()
        .map_err(|e| SessionError::StorageUnavailable(format!("{e:?}")))?
        .ok_or_else(|| SessionError::StorageUnavailable("localStorage disabled".to_owned()))
}

impl StorageBackend for LocalStorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        #[cfg(feature = "hydrate")]
        {
            storage()?
                .get_item(key)
                .map_err(|e| SessionError::StorageUnavailable(format!("{e:?}")))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = key;
            Ok(None)
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        #[cfg(feature = "hydrate")]
        {
            storage()?
                .set_item(key, value)
                .map_err(|e| SessionError::StorageUnavailable(format!("{e:?}")))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (key, value);
            Err(SessionError::StorageUnavailable("not available on server".to_owned()))
        }
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        #[cfg(feature = "hydrate")]
        {
            storage()?
                .remove_item(key)
                .map_err(|e| SessionError::StorageUnavailable(format!("{e:?}")))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = key;
            Ok(())
        }
    }
}
