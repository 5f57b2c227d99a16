//! Authenticated landing page.

use leptos::prelude::*;
use paytrack_session::navigation::LOGOUT_PATH;

use crate::pages::section::SECTIONS;
use crate::state::session::SessionContext;

#[component]
pub fn HomePage() -> impl IntoView {
    let session = expect_context::<SessionContext>();
    let auth = session.auth;

    let greeting = move || {
        auth.get()
            .identity
            .map(|identity| identity.display_name)
            .filter(|name| !name.is_empty())
            .map_or_else(|| "Welcome back".to_owned(), |name| format!("Welcome back, {name}"))
    };

    view! {
        <div class="home-page">
            <header class="home-page__header toolbar">
                <span class="toolbar__title">{greeting}</span>
                <span class="toolbar__spacer"></span>
                <a class="btn toolbar__logout" href=LOGOUT_PATH>"Logout"</a>
            </header>
            <nav class="home-page__sections">
                {SECTIONS
                    .iter()
                    .map(|(slug, title)| view! { <a class="home-page__section" href=format!("/{slug}")>{*title}</a> })
                    .collect_view()}
            </nav>
        </div>
    }
}
