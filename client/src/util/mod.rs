//! Utility helpers shared across client UI modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser concerns (storage, timers, window events,
//! location) from page and component logic so the session core stays
//! platform-neutral and the pages stay testable.

pub mod auth;
pub mod local_storage;
pub mod storage_events;
pub mod timers;
