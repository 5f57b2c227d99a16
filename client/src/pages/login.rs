//! Login page: email + password, then back to where the user came from.
//!
//! SYSTEM CONTEXT
//! ==============
//! Reached directly or through a guard/401 redirect carrying `from`,
//! `message` and `email` in the query. A successful login persists the
//! credential through the session monitor and consumes the redirect intent
//! exactly once.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_navigate, use_query_map};
use paytrack_session::navigation::{self, HOME_PATH, SESSION_EXPIRED_MESSAGE};
use paytrack_session::{RedirectIntent, SessionError};

use crate::state::session::SessionContext;

/// Trim the email and require both fields; the password is kept verbatim.
pub fn validate_login_input(email: &str, password: &str) -> Result<(String, String), &'static str> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err("Enter both email and password.");
    }
    if !email.contains('@') {
        return Err("Enter a valid email address.");
    }
    Ok((email.to_owned(), password.to_owned()))
}

/// Notice shown above the form: the redirect's message, else the reason the
/// previous session ended.
pub fn login_notice(intent: Option<&RedirectIntent>, failure: Option<&SessionError>) -> Option<String> {
    if let Some(message) = intent.and_then(|i| i.message.clone()) {
        return Some(message);
    }
    failure
        .filter(|e| e.is_expiry())
        .map(|_| SESSION_EXPIRED_MESSAGE.to_owned())
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let session = expect_context::<SessionContext>();
    let navigate = use_navigate();
    let params = use_query_map().get_untracked();

    let intent = RedirectIntent::from_query(params.get("from"), params.get("message"), params.get("email"));
    let notice = login_notice(intent.as_ref(), session.monitor.take_failure().as_ref());
    let email = RwSignal::new(intent.as_ref().and_then(|i| i.prefill_email.clone()).unwrap_or_default());
    let password = RwSignal::new(String::new());
    let info = RwSignal::new(notice.unwrap_or_default());
    let busy = RwSignal::new(false);
    let pending_intent = StoredValue::new(intent);

    // Leave as soon as a session exists: after submitting, after a login in
    // another tab, or when the page was opened while already signed in.
    let auth = session.auth;
    Effect::new(move || {
        if auth.get().session.is_authenticated() {
            let target = navigation::after_login(pending_intent.try_update_value(Option::take).flatten(), HOME_PATH);
            navigate(&target, NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });

    let monitor = session.monitor.clone();
    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let (email_value, password_value) = match validate_login_input(&email.get(), &password.get()) {
            Ok(fields) => fields,
            Err(msg) => {
                info.set(msg.to_owned());
                return;
            }
        };
        busy.set(true);
        info.set("Signing in...".to_owned());

        #[cfg(feature = "hydrate")]
        {
            let monitor = monitor.clone();
            leptos::task::spawn_local(async move {
                match crate::net::api::login(&email_value, &password_value).await {
                    // On success the signed-in effect above navigates away.
                    Ok(credential) => {
                        if !monitor.login(&credential) {
                            info.set("Could not keep you signed in. Check that site storage is enabled.".to_owned());
                        }
                    }
                    Err(e) => info.set(e),
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (&monitor, email_value, password_value);
        }
    };

    view! {
        <div class="login-page">
            <div class="login-card">
                <h1>"Paytrack"</h1>
                <p class="login-card__subtitle">"Sign in to continue"</p>
                <Show when=move || !info.get().is_empty()>
                    <p class="login-message">{move || info.get()}</p>
                </Show>
                <form class="login-form" on:submit=on_submit>
                    <input
                        class="login-input"
                        type="email"
                        placeholder="you@example.com"
                        prop:value=move || email.get()
                        on:input=move |ev| email.set(event_target_value(&ev))
                    />
                    <input
                        class="login-input"
                        type="password"
                        placeholder="Password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                    <button class="login-button" type="submit" disabled=move || busy.get()>
                        "Sign In"
                    </button>
                </form>
            </div>
        </div>
    }
}
