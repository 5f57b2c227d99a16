//! Session context shared by every route.
//!
//! SYSTEM CONTEXT
//! ==============
//! The app root builds exactly one `SessionMonitor` over browser storage,
//! timers and the `storage` event, and provides it through Leptos context.
//! `auth` mirrors the monitor's state into a signal so views re-render on
//! login, logout, expiry and changes made in other tabs.
//!
//! TRADE-OFFS
//! ==========
//! The monitor starts from an effect, after hydration, so the server render
//! and the first client render both show the `Unknown` state.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use leptos::prelude::*;
use paytrack_session::{
    CredentialStore, Identity, SessionConfig, SessionEventBus, SessionMonitor, SessionState,
};
use tracing::{debug, warn};

use crate::util::local_storage::LocalStorageBackend;
use crate::util::storage_events;
use crate::util::timers::{BrowserClock, GlooScheduler};

/// Snapshot of the session for rendering.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub session: SessionState,
    pub identity: Option<Identity>,
}

impl AuthState {
    /// No check has completed yet.
    pub fn loading(&self) -> bool {
        self.session == SessionState::Unknown
    }
}

/// Redirect only once a check has run and found no session.
pub fn should_redirect_unauth(state: &AuthState) -> bool {
    state.session == SessionState::Unauthenticated
}

#[derive(Clone)]
pub struct SessionContext {
    pub monitor: Arc<SessionMonitor>,
    pub auth: RwSignal<AuthState>,
}

impl SessionContext {
    /// Wrap `monitor` and keep `auth` in step with it.
    pub fn with_monitor(monitor: Arc<SessionMonitor>) -> Self {
        let auth = RwSignal::new(AuthState::default());
        let weak = Arc::downgrade(&monitor);
        monitor.watch(move |session| {
            let identity = weak.upgrade().and_then(|m| m.current_identity());
            // `try_set` hands the value back once the signal is disposed.
            if auth.try_set(AuthState { session, identity }).is_some() {
                debug!("session mirror disposed; update dropped");
            }
        });
        Self { monitor, auth }
    }
}

/// Build the browser session, provide it as context and start it after mount.
pub fn provide_session_context() -> SessionContext {
    let config = load_config();
    let store = CredentialStore::new(Arc::new(LocalStorageBackend), &config);
    let monitor = SessionMonitor::new(
        store,
        SessionEventBus::new(),
        Arc::new(BrowserClock),
        Arc::new(GlooScheduler),
        config,
    );
    let ctx = SessionContext::with_monitor(monitor);
    provide_context(ctx.clone());

    let monitor = Arc::clone(&ctx.monitor);
    Effect::new(move || {
        storage_events::install(monitor.bus(), monitor.store().credential_key());
        monitor.start();
    });
    ctx
}

/// Session config from build-time `SESSION_*` variables, falling back to
/// defaults when they do not parse.
pub fn load_config() -> SessionConfig {
    SessionConfig::from_lookup(build_time_value).unwrap_or_else(|e| {
        warn!(error = %e, "invalid session config; using defaults");
        SessionConfig::default()
    })
}

fn build_time_value(key: &str) -> Option<String> {
    let value = match key {
        "SESSION_CREDENTIAL_KEY" => option_env!("SESSION_CREDENTIAL_KEY"),
        "SESSION_IDENTITY_KEY" => option_env!("SESSION_IDENTITY_KEY"),
        "SESSION_CHECK_INTERVAL_SECS" => option_env!("SESSION_CHECK_INTERVAL_SECS"),
        "SESSION_LOGOUT_REDIRECT_DELAY_MS" => option_env!("SESSION_LOGOUT_REDIRECT_DELAY_MS"),
        _ => None,
    };
    value.map(str::to_owned)
}
