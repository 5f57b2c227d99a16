//! Authoritative session state for one tab.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionMonitor` is the only writer of `SessionState`. It re-derives the
//! state from storage at startup, on every bus signal (local or cross-tab)
//! and on a fixed timer, so expiry is noticed without user interaction and
//! every tab converges on the shared storage contents.
//!
//! TRADE-OFFS
//! ==========
//! There is no locking across tabs. Storage is last-write-wins and the
//! monitor only promises eventual agreement through broadcasts and polling.
//! Evicting an invalid credential is the one storage mutation it makes on
//! its own.

#[cfg(test)]
#[path = "monitor_test.rs"]
mod monitor_test;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::bus::{SessionEventBus, SessionSignal, Subscription};
use crate::codec::{self, Identity};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::navigation::{self, LoginPrompt, RedirectIntent};
use crate::schedule::{Clock, Scheduler, TaskHandle};
use crate::store::CredentialStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No check has run yet.
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        self == Self::Authenticated
    }
}

type Watcher = Arc<dyn Fn(SessionState) + Send + Sync>;

pub struct SessionMonitor {
    store: CredentialStore,
    bus: SessionEventBus,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    config: SessionConfig,
    state: Mutex<SessionState>,
    last_failure: Mutex<Option<SessionError>>,
    watchers: Mutex<Vec<Watcher>>,
    started: AtomicBool,
    timer: Mutex<Option<TaskHandle>>,
    subscription: Mutex<Option<Subscription>>,
}

impl SessionMonitor {
    /// Build a monitor in the `Unknown` state. Call [`SessionMonitor::start`]
    /// to run the first check and install the background triggers.
    #[must_use]
    pub fn new(
        store: CredentialStore,
        bus: SessionEventBus,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn Scheduler>,
        config: SessionConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            bus,
            clock,
            scheduler,
            config,
            state: Mutex::new(SessionState::Unknown),
            last_failure: Mutex::new(None),
            watchers: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
            timer: Mutex::new(None),
            subscription: Mutex::new(None),
        })
    }

    /// Run the startup check, follow bus signals and start the periodic
    /// re-check. Calling it again is a no-op.
    pub fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        let authenticated = self.check_now();
        info!(authenticated, interval_secs = self.config.check_interval.as_secs(), "session monitor started");

        let weak = Arc::downgrade(self);
        let subscription = self.bus.subscribe(move |signal| {
            if let Some(monitor) = weak.upgrade() {
                debug!(signal = signal.name(), "re-checking session after signal");
                monitor.check_now();
            }
        });
        *self.subscription.lock().unwrap_or_else(PoisonError::into_inner) = Some(subscription);

        let weak = Arc::downgrade(self);
        let timer = self.scheduler.every(
            self.config.check_interval,
            Box::new(move || {
                if let Some(monitor) = weak.upgrade() {
                    monitor.tick();
                }
            }),
        );
        *self.timer.lock().unwrap_or_else(PoisonError::into_inner) = Some(timer);
    }

    /// Cancel the periodic timer and stop following bus signals.
    pub fn shutdown(&self) {
        if let Some(timer) = self.timer.lock().unwrap_or_else(PoisonError::into_inner).take() {
            timer.cancel();
        }
        if let Some(subscription) = self.subscription.lock().unwrap_or_else(PoisonError::into_inner).take() {
            subscription.unsubscribe();
        }
        self.started.store(false, Ordering::Release);
        debug!("session monitor shut down");
    }

    /// Re-derive the session from storage, evicting an invalid credential.
    ///
    /// Evicting the credential of an authenticated session publishes
    /// `Released`, whichever caller noticed first.
    pub fn check_now(&self) -> bool {
        self.recheck(false)
    }

    /// Persist a freshly issued credential and announce the new session.
    ///
    /// Local subscribers have observed the updated state by the time this
    /// returns. Returns whether the session is now authenticated; a storage
    /// failure leaves it `false` rather than erroring.
    pub fn login(&self, credential: &str) -> bool {
        if let Err(e) = self.store.save(credential) {
            warn!(error = %e, "login could not persist credential");
            *self.last_failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(e);
        } else if let Ok(claims) = codec::decode(credential) {
            if let Err(e) = self.store.save_identity(&claims.identity()) {
                debug!(error = %e, "identity not cached");
            }
        }

        let authenticated = self.check_now();
        if authenticated {
            self.last_failure.lock().unwrap_or_else(PoisonError::into_inner).take();
        }
        self.bus.publish(SessionSignal::Acquired);
        authenticated
    }

    /// Drop the session. Returns `false` when there was nothing to log out,
    /// in which case no signal is published.
    pub fn logout(&self) -> bool {
        let had_credential = self.store.read().is_some();
        self.store.clear();
        let was = self.set_state(SessionState::Unauthenticated);

        if !had_credential && was != SessionState::Authenticated {
            debug!("logout ignored; already logged out");
            return false;
        }
        info!("logged out");
        self.bus.publish(SessionSignal::Released);
        true
    }

    /// React to a 401 from an authenticated API call made on `current_path`.
    ///
    /// Always logs out. Returns the login redirect to perform, or `None` when
    /// the user is already on a public surface or an earlier logout already
    /// ended the session and owns the navigation.
    pub fn handle_unauthorized(&self, current_path: &str) -> Option<RedirectIntent> {
        warn!(path = current_path, "unauthorized response; forcing logout");
        let logged_out = self.logout();
        *self.last_failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(SessionError::Unauthorized);
        if !logged_out {
            debug!(path = current_path, "session already ended; no redirect");
            return None;
        }
        if navigation::is_public_path(current_path) {
            return None;
        }
        Some(navigation::redirect_to_login(current_path, LoginPrompt::session_expired()))
    }

    /// Observe every state change, including ones caused by other tabs.
    pub fn watch<F>(&self, watcher: F)
    where
        F: Fn(SessionState) + Send + Sync + 'static,
    {
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(watcher));
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// Identity of the signed-in user, if any.
    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        if !self.is_authenticated() {
            return None;
        }
        self.store.read_identity().or_else(|| {
            let raw = self.store.read()?;
            codec::decode(&raw).map(|claims| claims.identity()).ok()
        })
    }

    /// Why the last session ended, consumed by the login surface.
    pub fn take_failure(&self) -> Option<SessionError> {
        self.last_failure.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    #[must_use]
    pub fn bus(&self) -> &SessionEventBus {
        &self.bus
    }

    #[must_use]
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    /// Periodic re-check. A credential that vanished without a signal is
    /// announced as `Released` here; eviction announces itself.
    fn tick(&self) {
        self.recheck(true);
    }

    fn recheck(&self, announce_missing: bool) -> bool {
        let Some(raw) = self.store.read() else {
            let previous = self.set_state(SessionState::Unauthenticated);
            if announce_missing && previous == SessionState::Authenticated {
                info!("session ended while idle");
                self.bus.publish(SessionSignal::Released);
            }
            return false;
        };

        let failure = match codec::decode(&raw) {
            Err(e) => SessionError::MalformedCredential(e),
            Ok(claims) if !claims.is_valid_at(self.clock.now()) => {
                SessionError::ExpiredCredential { expired_at: claims.expires_at }
            }
            Ok(_) => {
                self.set_state(SessionState::Authenticated);
                return true;
            }
        };

        info!(reason = %failure, "evicting stored credential");
        self.store.clear();
        *self.last_failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(failure);
        if self.set_state(SessionState::Unauthenticated) == SessionState::Authenticated {
            self.bus.publish(SessionSignal::Released);
        }
        false
    }

    /// Store `next` and notify watchers if it changed. Returns the previous state.
    fn set_state(&self, next: SessionState) -> SessionState {
        let previous = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *state, next)
        };
        if previous != next {
            debug!(?previous, ?next, "session state changed");
            let watchers: Vec<Watcher> = self.watchers.lock().unwrap_or_else(PoisonError::into_inner).clone();
            for watcher in watchers {
                watcher(next);
            }
        }
        previous
    }
}
