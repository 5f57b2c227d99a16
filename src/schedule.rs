//! Clock and deferred-task seams.
//!
//! DESIGN
//! ======
//! Every timer this crate creates goes through `Scheduler` and hands back a
//! `TaskHandle`. A cancelled handle never fires again; implementations check
//! the alive flag after each sleep and before doing any work.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use time::OffsetDateTime;

/// Source of "now" for validity checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock backed by the OS.
///
/// Not usable on `wasm32-unknown-unknown`; the browser client supplies its
/// own clock there.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Repeating task body.
pub type RepeatingTask = Box<dyn Fn() + Send + Sync>;

/// One-shot task body.
pub type OnceTask = Box<dyn FnOnce() + Send>;

pub trait Scheduler: Send + Sync {
    /// Run `task` every `period` until the handle is cancelled.
    fn every(&self, period: Duration, task: RepeatingTask) -> TaskHandle;

    /// Run `task` once after `delay` unless the handle is cancelled first.
    fn after(&self, delay: Duration, task: OnceTask) -> TaskHandle;
}

/// Cancellation handle for a scheduled task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    alive: Arc<AtomicBool>,
}

impl Default for TaskHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskHandle {
    #[must_use]
    pub fn new() -> Self {
        Self { alive: Arc::new(AtomicBool::new(true)) }
    }

    pub fn cancel(&self) {
        self.alive.store(false, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }
}

/// Scheduler for native hosts running a tokio runtime.
#[cfg(feature = "tokio")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[cfg(feature = "tokio")]
impl Scheduler for TokioScheduler {
    fn every(&self, period: Duration, task: RepeatingTask) -> TaskHandle {
        let handle = TaskHandle::new();
        let alive = handle.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                if !alive.is_active() {
                    break;
                }
                task();
            }
        });
        handle
    }

    fn after(&self, delay: Duration, task: OnceTask) -> TaskHandle {
        let handle = TaskHandle::new();
        let alive = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if alive.is_active() {
                task();
            }
        });
        handle
    }
}

#[cfg(all(test, feature = "tokio"))]
#[path = "schedule_test.rs"]
mod schedule_test;
