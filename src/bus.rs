//! Process-wide session signals.
//!
//! SYSTEM CONTEXT
//! ==============
//! Headers, menus and the monitor itself listen here for `session-acquired`
//! and `session-released` without depending on session internals. Storage
//! notifications from other tabs enter through `ingest_storage_change` and
//! are delivered exactly like local publishes.
//!
//! DESIGN
//! ======
//! Delivery is synchronous and runs against a snapshot of the subscriber
//! list taken at publish time, with the lock released, so handlers may
//! subscribe, unsubscribe or publish from inside their own invocation.

#[cfg(test)]
#[path = "bus_test.rs"]
mod bus_test;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::debug;

use crate::store::StorageChange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionSignal {
    Acquired,
    Released,
}

impl SessionSignal {
    /// Wire name shared with the rest of the application.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Acquired => "session-acquired",
            Self::Released => "session-released",
        }
    }
}

type Handler = Arc<dyn Fn(SessionSignal) + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(u64, Handler)>>,
}

impl BusInner {
    fn remove(&self, id: u64) -> bool {
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|(hid, _)| *hid != id);
        handlers.len() != before
    }
}

/// Cheaply cloneable handle to one tab's signal channel.
#[derive(Clone, Default)]
pub struct SessionEventBus {
    inner: Arc<BusInner>,
}

/// Capability to remove one handler from the bus.
#[must_use = "dropping a Subscription keeps the handler registered; call unsubscribe() to remove it"]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Remove the handler. Returns `false` if it was already removed.
    pub fn unsubscribe(&self) -> bool {
        self.bus.upgrade().is_some_and(|bus| bus.remove(self.id))
    }
}

impl SessionEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(SessionSignal) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(handler)));
        Subscription { id, bus: Arc::downgrade(&self.inner) }
    }

    /// Deliver `signal` to every current subscriber before returning.
    pub fn publish(&self, signal: SessionSignal) {
        let snapshot: Vec<Handler> = self
            .inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        debug!(signal = signal.name(), subscribers = snapshot.len(), "publishing session signal");
        for handler in snapshot {
            handler(signal);
        }
    }

    /// Translate a storage notification from another tab into a signal.
    ///
    /// Changes to `credential_key` publish `Acquired` when a value is present
    /// and `Released` when it was removed; a full clear publishes `Released`.
    /// Other keys are ignored. Returns the signal that was published.
    pub fn ingest_storage_change(&self, change: &StorageChange, credential_key: &str) -> Option<SessionSignal> {
        let signal = match change.key.as_deref() {
            None => SessionSignal::Released,
            Some(key) if key == credential_key => match change.new_value.as_deref() {
                Some(value) if !value.is_empty() => SessionSignal::Acquired,
                _ => SessionSignal::Released,
            },
            Some(_) => return None,
        };
        debug!(signal = signal.name(), "cross-tab storage change");
        self.publish(signal);
        Some(signal)
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.inner.handlers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
