//! Wrapper that gates its children behind a valid session.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every authenticated route in `app` renders inside `ProtectedRoute`. Each
//! path change (and each session change) starts a new `RouteGuard` pass;
//! a pass that completes after the user navigated away or the route
//! unmounted is discarded by the guard, so it can neither render stale
//! content nor fire a late redirect.

use std::sync::Arc;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};
use paytrack_session::{GuardDecision, GuardState, RouteGuard};

use crate::state::session::{SessionContext, should_redirect_unauth};
use crate::util::auth::join_path;

#[component]
pub fn ProtectedRoute(children: ChildrenFn) -> impl IntoView {
    let session = expect_context::<SessionContext>();
    let auth = session.auth;
    let location = use_location();
    let navigate = use_navigate();

    let guard = Arc::new(RouteGuard::new());
    let view_state = RwSignal::new(GuardState::Verifying);

    let guard_pass = Arc::clone(&guard);
    let monitor = Arc::clone(&session.monitor);
    Effect::new(move || {
        let path = join_path(&location.pathname.get(), &location.search.get());
        auth.track();

        let ticket = guard_pass.enter(&path);
        view_state.set(GuardState::Verifying);
        match guard_pass.verify(&ticket, &monitor) {
            Some(GuardDecision::Render) => view_state.set(GuardState::Authenticated),
            Some(GuardDecision::Redirect(intent)) => {
                view_state.set(GuardState::Unauthenticated);
                navigate(&intent.to_location(), NavigateOptions { replace: true, ..NavigateOptions::default() });
            }
            None => {}
        }
    });
    on_cleanup(move || guard.unmount());

    view! {
        <Show
            when=move || view_state.get() == GuardState::Authenticated
            fallback=move || {
                view! {
                    <div class="route-guard">
                        <p>
                            {move || {
                                if should_redirect_unauth(&auth.get()) {
                                    "Redirecting to login..."
                                } else {
                                    "Verifying session..."
                                }
                            }}
                        </p>
                    </div>
                }
            }
        >
            {children()}
        </Show>
    }
}
