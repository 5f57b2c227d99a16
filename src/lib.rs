//! # paytrack-session
//!
//! Client-side authentication session lifecycle for the Paytrack finance
//! tracker: credential storage, payload decoding, session signals, periodic
//! validity checks, protected-route gating and login/logout navigation.
//!
//! SYSTEM CONTEXT
//! ==============
//! Data flows leaf-first: `store` persists the raw credential, `codec`
//! interprets its payload, `bus` announces session transitions, and `monitor`
//! keeps the authoritative `authenticated` flag that `guard` and
//! `navigation` consume. Nothing here is global; the host constructs one
//! `SessionMonitor` and injects it where needed.
//!
//! The crate is platform-neutral. Browser storage, timers and the
//! cross-tab `storage` event are supplied by the `client` crate through the
//! `StorageBackend`, `Scheduler` and `Clock` seams; `sim` provides in-memory
//! versions for tests and native hosts.

pub mod bus;
pub mod codec;
pub mod config;
pub mod error;
pub mod guard;
pub mod monitor;
pub mod navigation;
pub mod schedule;
pub mod sim;
pub mod store;

pub use bus::{SessionEventBus, SessionSignal, Subscription};
pub use codec::{Claims, DecodeError, Identity};
pub use config::SessionConfig;
pub use error::SessionError;
pub use guard::{GuardDecision, GuardState, RouteGuard, VerificationTicket};
pub use monitor::{SessionMonitor, SessionState};
pub use navigation::{LoginPrompt, LogoutFlow, RedirectIntent};
pub use schedule::{Clock, Scheduler, SystemClock, TaskHandle};
pub use store::{CredentialStore, StorageBackend, StorageChange};
