//! Neutral "signing out" surface.
//!
//! SYSTEM CONTEXT
//! ==============
//! Explicit logout links point here. The page ends the session once, shows
//! a short notice while session subscribers react, then leaves for `/login`
//! with a full page load. A 401 that races the user's click finds the
//! session already gone and does not navigate a second time.

use std::sync::Arc;

use leptos::prelude::*;
use paytrack_session::LogoutFlow;

use crate::state::session::SessionContext;
use crate::util::auth::hard_redirect;

#[component]
pub fn LogoutPage() -> impl IntoView {
    let session = expect_context::<SessionContext>();
    let flow = Arc::new(LogoutFlow::new());

    let flow_start = Arc::clone(&flow);
    let monitor = Arc::clone(&session.monitor);
    Effect::new(move || {
        if monitor.logout() {
            tracing::info!("signed out by user");
        }
        let delay = monitor.config().logout_redirect_delay;
        flow_start.after_logout(&**monitor.scheduler(), delay, hard_redirect);
    });
    on_cleanup(move || flow.cancel());

    view! {
        <div class="logout-page">
            <p>"Signing you out..."</p>
        </div>
    }
}
