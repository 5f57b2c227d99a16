//! Reactive application state provided through Leptos context.
//!
//! SYSTEM CONTEXT
//! ==============
//! `session` is the only shared state today: the session monitor plus a
//! signal mirror of its state for views.

pub mod session;
