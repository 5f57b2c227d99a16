//! REST API helpers for communicating with the server.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`.
//! Server-side (SSR): stubs returning an error since these endpoints are
//! only meaningful in the browser.
//!
//! ERROR HANDLING
//! ==============
//! Callers get `Result` outputs instead of panics. A 401 on an authenticated
//! call is not just an error: it ends the session through
//! `SessionMonitor::handle_unauthorized` and leaves the page for `/login`,
//! unless the user is already on a public page.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use paytrack_session::SessionMonitor;
use serde::de::DeserializeOwned;

#[cfg(feature = "hydrate")]
use super::types::{LoginRequest, LoginResponse};

#[cfg(any(test, feature = "hydrate"))]
const UNAUTHORIZED: u16 = 401;

#[cfg(any(test, feature = "hydrate"))]
fn bearer(credential: &str) -> String {
    format!("Bearer {credential}")
}

#[cfg(any(test, feature = "hydrate"))]
fn login_failed_message(status: u16) -> String {
    format!("login request failed: {status}")
}

#[cfg(any(test, feature = "hydrate"))]
fn request_failed_message(path: &str, status: u16) -> String {
    format!("{path} failed: {status}")
}

/// End the session after a 401 seen on `current_path`. Returns the location
/// to leave for, if any.
pub fn unauthorized_redirect(monitor: &SessionMonitor, current_path: &str) -> Option<String> {
    monitor
        .handle_unauthorized(current_path)
        .map(|intent| intent.to_location())
}

/// Exchange email and password for a credential via `POST /api/auth/login`.
///
/// # Errors
///
/// Returns an error string if the request fails, the server responds with a
/// non-OK status, or the response carries no credential.
pub async fn login(email: &str, password: &str) -> Result<String, String> {
    #[cfg(feature = "hydrate")]
    {
        let body = LoginRequest { email: email.to_owned(), password: password.to_owned() };
        let resp = gloo_net::http::Request::post("/api/auth/login")
            .json(&body)
            .map_err(|e| e.to_string())?
            .send()
            .await
            .map_err(|e| e.to_string())?;
        // A rejected login still answers with a JSON body carrying the reason.
        if !resp.ok() && resp.status() != UNAUTHORIZED {
            return Err(login_failed_message(resp.status()));
        }
        let body: LoginResponse = resp.json().await.map_err(|e| e.to_string())?;
        body.into_credential()
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (email, password);
        Err("not available on server".to_owned())
    }
}

/// `GET path` with the stored credential attached, decoding JSON.
///
/// # Errors
///
/// Returns an error string on transport failures, non-OK statuses and
/// undecodable bodies. A 401 additionally ends the session and redirects.
pub async fn get_json<T: DeserializeOwned>(monitor: &SessionMonitor, path: &str) -> Result<T, String> {
    #[cfg(feature = "hydrate")]
    {
        let mut request = gloo_net::http::Request::get(path);
        if let Some(credential) = monitor.store().read() {
            request = request.header("Authorization", &bearer(&credential));
        }
        let resp = request.send().await.map_err(|e| e.to_string())?;
        if resp.status() == UNAUTHORIZED {
            let here = crate::util::auth::current_path();
            if let Some(location) = unauthorized_redirect(monitor, &here) {
                crate::util::auth::hard_redirect(&location);
            }
            return Err("unauthorized".to_owned());
        }
        if !resp.ok() {
            return Err(request_failed_message(path, resp.status()));
        }
        resp.json::<T>().await.map_err(|e| e.to_string())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (monitor, path);
        Err("not available on server".to_owned())
    }
}
