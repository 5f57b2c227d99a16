//! In-memory stand-ins for browser storage, timers and time.
//!
//! SYSTEM CONTEXT
//! ==============
//! Tests and non-browser hosts use these to run several "tabs" against one
//! shared storage area. Cross-tab notifications behave like the browser
//! `storage` event: the writing tab is not notified, other tabs are, and
//! delivery is deferred until `SharedStorage::deliver_pending` runs.
//!
//! TRADE-OFFS
//! ==========
//! `ManualScheduler` runs due tasks inline on `advance`, in due-time order,
//! which makes interleavings reproducible but not representative of real
//! timer jitter.

#[cfg(test)]
#[path = "sim_test.rs"]
mod sim_test;

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use time::OffsetDateTime;
use tracing::trace;

use crate::error::SessionError;
use crate::schedule::{Clock, OnceTask, RepeatingTask, Scheduler, TaskHandle};
use crate::store::{StorageBackend, StorageChange};

type ChangeListener = Arc<dyn Fn(&StorageChange) + Send + Sync>;

struct TabSlot {
    id: u64,
    pending: VecDeque<StorageChange>,
    listener: Option<ChangeListener>,
}

#[derive(Default)]
struct SharedInner {
    items: Mutex<HashMap<String, String>>,
    tabs: Mutex<Vec<TabSlot>>,
    next_tab: AtomicU64,
}

impl SharedInner {
    fn broadcast_from(&self, origin: u64, change: &StorageChange) {
        let mut tabs = self.tabs.lock().unwrap_or_else(PoisonError::into_inner);
        for slot in tabs.iter_mut().filter(|slot| slot.id != origin) {
            slot.pending.push_back(change.clone());
        }
    }
}

/// One origin's storage area, shared by every open tab.
#[derive(Clone, Default)]
pub struct SharedStorage {
    inner: Arc<SharedInner>,
}

impl SharedStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new tab view onto this storage area.
    #[must_use]
    pub fn open_tab(&self) -> Arc<TabStorage> {
        let id = self.inner.next_tab.fetch_add(1, Ordering::Relaxed);
        self.inner
            .tabs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(TabSlot { id, pending: VecDeque::new(), listener: None });
        Arc::new(TabStorage { id, shared: Arc::clone(&self.inner), fail_writes: AtomicBool::new(false) })
    }

    /// Deliver every queued cross-tab notification. Returns how many
    /// listener invocations happened.
    pub fn deliver_pending(&self) -> usize {
        let batches: Vec<(ChangeListener, Vec<StorageChange>)> = {
            let mut tabs = self.inner.tabs.lock().unwrap_or_else(PoisonError::into_inner);
            tabs.iter_mut()
                .filter_map(|slot| {
                    let changes: Vec<StorageChange> = slot.pending.drain(..).collect();
                    slot.listener.clone().map(|listener| (listener, changes))
                })
                .collect()
        };

        let mut delivered = 0;
        for (listener, changes) in batches {
            for change in &changes {
                listener(change);
                delivered += 1;
            }
        }
        delivered
    }

    /// Peek at a stored value without going through a tab.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.items.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }
}

/// A single tab's handle onto a `SharedStorage`.
pub struct TabStorage {
    id: u64,
    shared: Arc<SharedInner>,
    fail_writes: AtomicBool,
}

impl TabStorage {
    /// Install this tab's `storage` event listener, replacing any previous one.
    pub fn on_remote_change<F>(&self, listener: F)
    where
        F: Fn(&StorageChange) + Send + Sync + 'static,
    {
        let mut tabs = self.shared.tabs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = tabs.iter_mut().find(|slot| slot.id == self.id) {
            slot.listener = Some(Arc::new(listener));
        }
    }

    /// Make every subsequent write fail as if the quota were exhausted.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Close the tab; undelivered notifications are dropped.
    pub fn close(&self) {
        self.shared
            .tabs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|slot| slot.id != self.id);
    }

    /// Clear the whole storage area, like `localStorage.clear()`.
    pub fn clear_all(&self) {
        let had_items = {
            let mut items = self.shared.items.lock().unwrap_or_else(PoisonError::into_inner);
            let had = !items.is_empty();
            items.clear();
            had
        };
        if had_items {
            self.shared.broadcast_from(self.id, &StorageChange { key: None, new_value: None });
        }
    }

    fn check_writable(&self) -> Result<(), SessionError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(SessionError::StorageUnavailable("quota exceeded".to_owned()));
        }
        Ok(())
    }
}

impl StorageBackend for TabStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.shared.items.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.check_writable()?;
        let changed = {
            let mut items = self.shared.items.lock().unwrap_or_else(PoisonError::into_inner);
            items.insert(key.to_owned(), value.to_owned()).as_deref() != Some(value)
        };
        if changed {
            trace!(tab = self.id, key, "storage set");
            self.shared
                .broadcast_from(self.id, &StorageChange { key: Some(key.to_owned()), new_value: Some(value.to_owned()) });
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        let removed = self
            .shared
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some();
        if removed {
            trace!(tab = self.id, key, "storage remove");
            self.shared.broadcast_from(self.id, &StorageChange { key: Some(key.to_owned()), new_value: None });
        }
        Ok(())
    }
}

/// Settable clock for deterministic expiry tests.
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: OffsetDateTime) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: OffsetDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

enum TaskBody {
    Repeating { period: Duration, task: Arc<dyn Fn() + Send + Sync> },
    Once(OnceTask),
}

struct Scheduled {
    seq: u64,
    due: Duration,
    handle: TaskHandle,
    body: TaskBody,
}

#[derive(Default)]
struct SchedulerInner {
    elapsed: Duration,
    next_seq: u64,
    queue: Vec<Scheduled>,
}

/// Deterministic scheduler: nothing fires until `advance` is called.
pub struct ManualScheduler {
    inner: Mutex<SchedulerInner>,
    clock: Option<Arc<ManualClock>>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Mutex::new(SchedulerInner::default()), clock: None }
    }

    /// Scheduler that moves `clock` forward in step with simulated time.
    #[must_use]
    pub fn with_clock(clock: Arc<ManualClock>) -> Self {
        Self { inner: Mutex::new(SchedulerInner::default()), clock: Some(clock) }
    }

    /// Number of tasks still waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .queue
            .iter()
            .filter(|s| s.handle.is_active())
            .count()
    }

    /// Move simulated time forward, running due tasks in order.
    pub fn advance(&self, by: Duration) {
        let target = self.lock().elapsed + by;
        while let Some(next) = self.pop_due(target) {
            self.move_to(next.due);
            match next.body {
                TaskBody::Once(task) => task(),
                TaskBody::Repeating { period, task } => {
                    task();
                    if next.handle.is_active() {
                        let mut inner = self.lock();
                        let seq = inner.next_seq;
                        inner.next_seq += 1;
                        inner.queue.push(Scheduled {
                            seq,
                            due: next.due + period,
                            handle: next.handle,
                            body: TaskBody::Repeating { period, task },
                        });
                    }
                }
            }
        }
        self.move_to(target);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SchedulerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pop_due(&self, target: Duration) -> Option<Scheduled> {
        let mut inner = self.lock();
        inner.queue.retain(|s| s.handle.is_active());
        let index = inner
            .queue
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= target)
            .min_by_key(|(_, s)| (s.due, s.seq))
            .map(|(i, _)| i)?;
        Some(inner.queue.swap_remove(index))
    }

    fn move_to(&self, at: Duration) {
        let delta = {
            let mut inner = self.lock();
            let delta = at.saturating_sub(inner.elapsed);
            inner.elapsed = inner.elapsed.max(at);
            delta
        };
        if let Some(clock) = &self.clock {
            clock.advance(delta);
        }
    }

    fn push(&self, delay: Duration, body: TaskBody) -> TaskHandle {
        let handle = TaskHandle::new();
        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let due = inner.elapsed + delay;
        inner.queue.push(Scheduled { seq, due, handle: handle.clone(), body });
        handle
    }
}

impl Scheduler for ManualScheduler {
    fn every(&self, period: Duration, task: RepeatingTask) -> TaskHandle {
        self.push(period, TaskBody::Repeating { period, task: Arc::from(task) })
    }

    fn after(&self, delay: Duration, task: OnceTask) -> TaskHandle {
        self.push(delay, TaskBody::Once(task))
    }
}

/// Mint an unsigned three-part credential carrying the given claims.
#[must_use]
pub fn issue_unsigned(subject_id: &str, display_name: &str, expires_at: OffsetDateTime) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let payload = serde_json::json!({
        "sub": subject_id,
        "name": display_name,
        "exp": expires_at.unix_timestamp(),
    });
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
    let signature = URL_SAFE_NO_PAD.encode("unsigned");
    format!("{header}.{payload}.{signature}")
}
