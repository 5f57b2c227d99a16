//! Browser clock and timer implementations for the session core.
//!
//! DESIGN
//! ======
//! `GlooScheduler` runs each task as a `spawn_local` loop over
//! `gloo_timers` sleep and checks the task handle's alive flag after every
//! sleep. Outside the browser nothing is spawned and the returned handle is
//! inert.

#[cfg(test)]
#[path = "timers_test.rs"]
mod timers_test;

use std::time::Duration;

use paytrack_session::schedule::{OnceTask, RepeatingTask};
use paytrack_session::{Clock, Scheduler, TaskHandle};
use time::OffsetDateTime;

/// Wall clock read from JS `Date.now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserClock;

/// Convert epoch milliseconds to a timestamp, clamping out-of-range input.
pub fn from_epoch_millis(millis: f64) -> OffsetDateTime {
    #[allow(clippy::cast_possible_truncation)]
    let nanos = (millis * 1_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

impl Clock for BrowserClock {
    fn now(&self) -> OffsetDateTime {
        #[cfg(feature = "hydrate")]
        {
            from_epoch_millis(js_sys::Date::now())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            OffsetDateTime::now_utc()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GlooScheduler;

impl Scheduler for GlooScheduler {
    fn every(&self, period: Duration, task: RepeatingTask) -> TaskHandle {
        let handle = TaskHandle::new();
        #[cfg(feature = "hydrate")]
        {
            let alive = handle.clone();
            leptos::task::spawn_local(async move {
                loop {
                    gloo_timers::future::sleep(period).await;
                    if !alive.is_active() {
                        break;
                    }
                    task();
                }
            });
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (period, task);
        }
        handle
    }

    fn after(&self, delay: Duration, task: OnceTask) -> TaskHandle {
        let handle = TaskHandle::new();
        #[cfg(feature = "hydrate")]
        {
            let alive = handle.clone();
            leptos::task::spawn_local(async move {
                gloo_timers::future::sleep(delay).await;
                if alive.is_active() {
                    task();
                }
            });
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (delay, task);
        }
        handle
    }
}
