//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components read shared session state from Leptos context providers and
//! wrap page content with cross-cutting behavior such as route gating.

pub mod protected_route;
