//! Root application component with routing and the session provider.

use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use leptos_router::{
    StaticSegment,
    components::{Route, Router, Routes},
};

use crate::components::protected_route::ProtectedRoute;
use crate::pages::{home::HomePage, login::LoginPage, logout::LogoutPage, section::SectionPage};
use crate::state::session::provide_session_context;

/// HTML shell rendered on the server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Root application component.
///
/// Provides the session context and sets up client-side routing. Every route
/// except `/login` and `/logout` renders behind `ProtectedRoute`.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();
    provide_session_context();

    view! {
        <Stylesheet id="leptos" href="/pkg/paytrack.css"/>
        <Title text="Paytrack"/>

        <Router>
            <Routes fallback=|| "Page not found.".into_view()>
                <Route path=StaticSegment("login") view=LoginPage/>
                <Route path=StaticSegment("logout") view=LogoutPage/>
                <Route
                    path=StaticSegment("")
                    view=|| view! { <ProtectedRoute><HomePage/></ProtectedRoute> }
                />
                <Route
                    path=StaticSegment("paycheck")
                    view=|| view! { <ProtectedRoute><SectionPage title="Paycheck"/></ProtectedRoute> }
                />
                <Route
                    path=StaticSegment("jobs")
                    view=|| view! { <ProtectedRoute><SectionPage title="Jobs"/></ProtectedRoute> }
                />
                <Route
                    path=StaticSegment("grant")
                    view=|| view! { <ProtectedRoute><SectionPage title="Grant"/></ProtectedRoute> }
                />
            </Routes>
        </Router>
    }
}
