//! Cross-tab `storage` event bridge.
//!
//! SYSTEM CONTEXT
//! ==============
//! Browsers fire `storage` on every *other* tab of the origin when
//! `localStorage` changes. This is the only way one tab hears about another
//! tab's login or logout, so each event is converted into a `StorageChange`
//! and handed to the session bus, which decides whether it is a signal.

use paytrack_session::{SessionEventBus, StorageChange};

/// Convert raw event fields into the core's change record.
pub fn storage_change(key: Option<String>, new_value: Option<String>) -> StorageChange {
    StorageChange { key, new_value }
}

/// Listen for `storage` events for the lifetime of the page.
///
/// The listener is installed once per app and intentionally leaked; the app
/// root never unmounts.
pub fn install(bus: &SessionEventBus, credential_key: &str) {
    #[cfg(feature = "hydrate")]
    {
        use wasm_bindgen::JsCast;
        use wasm_bindgen::closure::Closure;

        let Some(window) = web_sys::window() else {
            return;
        };
        let bus = bus.clone();
        let key = credential_key.to_owned();
        let cb = Closure::wrap(Box::new(move |ev: web_sys::Event| {
            let Some(ev) = ev.dyn_ref::<web_sys::StorageEvent>() else {
                return;
            };
            let change = storage_change(ev.key(), ev.new_value());
            if let Some(signal) = bus.ingest_storage_change(&change, &key) {
                tracing::info!(signal = signal.name(), "session changed in another tab");
            }
        }) as Box<dyn FnMut(web_sys::Event)>);

        if let Err(e) = window.add_event_listener_with_callback("storage", cb.as_ref().unchecked_ref()) {
            tracing::warn!(error = ?e, "storage listener not installed");
            return;
        }
        cb.forget();
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (bus, credential_key);
    }
}
