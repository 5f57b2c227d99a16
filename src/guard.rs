//! Per-navigation gate in front of protected content.
//!
//! SYSTEM CONTEXT
//! ==============
//! A protected route owns one `RouteGuard`. Every mount or path change calls
//! `enter`, which starts a `Verifying` pass and hands back a ticket. The pass
//! completes through `verify` (or `resolve` when the caller already knows the
//! session flag). Only the ticket from the most recent `enter` on a mounted
//! guard can complete; anything older is dropped so a slow verification for
//! `/jobs` can never render or redirect after the user moved on to `/grant`.
//!
//! DESIGN
//! ======
//! Tickets carry a generation number. `enter` and `unmount` both bump the
//! generation, which is all cancellation needs: there is no task to abort,
//! the stale resolution just finds it no longer matches.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, trace};

use crate::monitor::SessionMonitor;
use crate::navigation::{self, LoginPrompt, RedirectIntent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GuardState {
    #[default]
    Verifying,
    Authenticated,
    Unauthenticated,
}

/// Outcome of a completed verification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(RedirectIntent),
}

/// Proof that a verification pass was started for `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationTicket {
    generation: u64,
    path: String,
}

pub struct RouteGuard {
    generation: AtomicU64,
    mounted: AtomicBool,
    state: Mutex<GuardState>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteGuard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            mounted: AtomicBool::new(true),
            state: Mutex::new(GuardState::Verifying),
        }
    }

    /// Start verifying `path`, invalidating every earlier ticket.
    pub fn enter(&self, path: &str) -> VerificationTicket {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.mounted.store(true, Ordering::Release);
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = GuardState::Verifying;
        trace!(path, generation, "guard verifying");
        VerificationTicket { generation, path: path.to_owned() }
    }

    /// Complete the pass for `ticket` with a known session flag.
    ///
    /// Returns `None` when the ticket is stale or the guard is unmounted.
    pub fn resolve(&self, ticket: &VerificationTicket, authenticated: bool) -> Option<GuardDecision> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_current(ticket) {
            debug!(path = %ticket.path, "discarding stale verification");
            return None;
        }

        if authenticated {
            *state = GuardState::Authenticated;
            return Some(GuardDecision::Render);
        }
        *state = GuardState::Unauthenticated;
        drop(state);
        debug!(path = %ticket.path, "guard redirecting to login");
        Some(GuardDecision::Redirect(navigation::redirect_to_login(&ticket.path, LoginPrompt::default())))
    }

    /// Complete the pass using a fresh `check_now` on `monitor`.
    pub fn verify(&self, ticket: &VerificationTicket, monitor: &SessionMonitor) -> Option<GuardDecision> {
        if !self.is_current(ticket) {
            return None;
        }
        let authenticated = monitor.check_now();
        self.resolve(ticket, authenticated)
    }

    /// Abandon any pending pass. A later `enter` re-mounts the guard.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    #[must_use]
    pub fn state(&self) -> GuardState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, ticket: &VerificationTicket) -> bool {
        self.mounted.load(Ordering::Acquire) && self.generation.load(Ordering::Acquire) == ticket.generation
    }
}
