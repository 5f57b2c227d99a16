//! # paytrack-client
//!
//! Leptos + WASM frontend shell for Paytrack. Owns everything browser-facing
//! about the session: `localStorage`, timers, the cross-tab `storage` event,
//! the login/logout pages and the protected-route wrapper. Session rules live
//! in `paytrack-session`; this crate wires them to the DOM.

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// WASM entry point: install console logging and hydrate the server-rendered app.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("console logging unavailable: {e}").into());
    }
    leptos::mount::hydrate_body(app::App);
}
