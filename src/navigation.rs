//! Where to send the user around authentication events.
//!
//! SYSTEM CONTEXT
//! ==============
//! `RouteGuard` and the API layer build a `RedirectIntent` when they bounce a
//! user to `/login`; the login page consumes it once to return the user to
//! the page that triggered the redirect. Logout goes through a neutral
//! `/logout` surface before a single delayed hop to `/login`.

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schedule::{Scheduler, TaskHandle};

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const LOGOUT_PATH: &str = "/logout";
pub const REGISTER_PATH: &str = "/register";

/// Surfaces reachable without a session. A 401 seen here must not redirect.
pub const PUBLIC_PATHS: &[&str] = &[LOGIN_PATH, REGISTER_PATH, LOGOUT_PATH];

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Optional extras shown on the login surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginPrompt {
    pub message: Option<String>,
    pub prefill_email: Option<String>,
}

impl LoginPrompt {
    #[must_use]
    pub fn session_expired() -> Self {
        Self { message: Some(SESSION_EXPIRED_MESSAGE.to_owned()), prefill_email: None }
    }
}

/// A pending redirect to the login surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectIntent {
    pub target_path: String,
    pub from_path: Option<String>,
    pub message: Option<String>,
    pub prefill_email: Option<String>,
}

impl RedirectIntent {
    /// Render as a location string, e.g. `/login?from=%2Fpaycheck`.
    #[must_use]
    pub fn to_location(&self) -> String {
        let params: Vec<String> = [
            ("from", self.from_path.as_deref()),
            ("message", self.message.as_deref()),
            ("email", self.prefill_email.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| format!("{name}={}", urlencoding::encode(v))))
        .collect();

        if params.is_empty() {
            self.target_path.clone()
        } else {
            format!("{}?{}", self.target_path, params.join("&"))
        }
    }

    /// Rebuild an intent from already-decoded login query parameters.
    ///
    /// Returns `None` when nothing usable was carried. A `from` value that is
    /// not a same-origin path is dropped.
    #[must_use]
    pub fn from_query(from: Option<String>, message: Option<String>, email: Option<String>) -> Option<Self> {
        let from_path = from.filter(|p| is_local_path(p));
        let message = message.filter(|m| !m.trim().is_empty());
        let prefill_email = email.map(|e| e.trim().to_owned()).filter(|e| !e.is_empty());
        if from_path.is_none() && message.is_none() && prefill_email.is_none() {
            return None;
        }
        Some(Self { target_path: LOGIN_PATH.to_owned(), from_path, message, prefill_email })
    }
}

/// Build the intent for bouncing `current_path` to the login surface.
#[must_use]
pub fn redirect_to_login(current_path: &str, prompt: LoginPrompt) -> RedirectIntent {
    RedirectIntent {
        target_path: LOGIN_PATH.to_owned(),
        from_path: Some(current_path.to_owned()),
        message: prompt.message,
        prefill_email: prompt.prefill_email,
    }
}

/// Destination after a successful login. Consumes the intent.
///
/// A `from_path` that is a public surface or not a local path falls back,
/// so login can never bounce back onto itself.
#[must_use]
pub fn after_login(intent: Option<RedirectIntent>, fallback: &str) -> String {
    intent
        .and_then(|intent| intent.from_path)
        .filter(|path| is_local_path(path) && !is_public_path(path))
        .unwrap_or_else(|| fallback.to_owned())
}

/// Whether `path` (query and fragment ignored) is reachable without a session.
#[must_use]
pub fn is_public_path(path: &str) -> bool {
    let bare = path.split(['?', '#']).next().unwrap_or_default();
    let bare = if bare.len() > 1 { bare.trim_end_matches('/') } else { bare };
    PUBLIC_PATHS.contains(&bare)
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// Drives the two-step logout navigation.
///
/// `after_logout` may be called any number of times (re-renders, a user click
/// racing a 401 handler); only the first schedules the delayed hop.
#[derive(Default)]
pub struct LogoutFlow {
    started: AtomicBool,
    pending: Mutex<Option<TaskHandle>>,
}

impl LogoutFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the interim surface to show now and schedules `navigate`
    /// to `/login` after `delay`, at most once per flow.
    pub fn after_logout<F>(&self, scheduler: &dyn Scheduler, delay: Duration, navigate: F) -> &'static str
    where
        F: FnOnce(&str) + Send + 'static,
    {
        if self.started.swap(true, Ordering::AcqRel) {
            debug!("logout redirect already scheduled");
            return LOGOUT_PATH;
        }
        let handle = scheduler.after(delay, Box::new(move || navigate(LOGIN_PATH)));
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        LOGOUT_PATH
    }

    /// Abandon the delayed redirect (the logout surface was torn down).
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.lock().unwrap_or_else(PoisonError::into_inner).take() {
            handle.cancel();
        }
    }
}
