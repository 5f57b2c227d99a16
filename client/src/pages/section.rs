//! Placeholder for the finance views behind the session gate.

use leptos::prelude::*;
use paytrack_session::navigation::{HOME_PATH, LOGOUT_PATH};

/// Route slug and heading of each protected section.
pub const SECTIONS: &[(&str, &str)] = &[("paycheck", "Paycheck"), ("jobs", "Jobs"), ("grant", "Grant")];

#[component]
pub fn SectionPage(title: &'static str) -> impl IntoView {
    view! {
        <div class="section-page">
            <header class="section-page__header toolbar">
                <a class="btn" href=HOME_PATH>"Home"</a>
                <span class="toolbar__title">{title}</span>
                <span class="toolbar__spacer"></span>
                <a class="btn toolbar__logout" href=LOGOUT_PATH>"Logout"</a>
            </header>
        </div>
    }
}
