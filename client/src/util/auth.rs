//! Shared auth navigation helpers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route components and the REST layer apply the same redirect behavior:
//! client-side navigation when a router is available, a full page load
//! otherwise (API callbacks running outside any component).

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

/// Current `pathname + search`, or `/` outside the browser.
pub fn current_path() -> String {
    #[cfg(feature = "hydrate")]
    {
        let Some(location) = web_sys::window().map(|w| w.location()) else {
            return "/".to_owned();
        };
        let path = location.pathname().unwrap_or_else(|_| "/".to_owned());
        let search = location.search().unwrap_or_default();
        join_path(&path, &search)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        "/".to_owned()
    }
}

/// Join a pathname and a `?query` (possibly empty) into one location.
pub fn join_path(pathname: &str, search: &str) -> String {
    let pathname = if pathname.is_empty() { "/" } else { pathname };
    if search.is_empty() || search == "?" {
        pathname.to_owned()
    } else if search.starts_with('?') {
        format!("{pathname}{search}")
    } else {
        format!("{pathname}?{search}")
    }
}

/// Full page load to `location`. Used where no router is in scope.
pub fn hard_redirect(location: &str) {
    #[cfg(feature = "hydrate")]
    {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().set_href(location) {
                tracing::warn!(error = ?e, location, "redirect failed");
            }
        }
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = location;
    }
}
