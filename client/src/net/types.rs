//! Wire DTOs for the auth endpoints.
//!
//! DESIGN
//! ======
//! The login endpoint is a black box returning `{ success, credential? }`.
//! Older deployments name the field `token`, so both spellings deserialize.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// Body of `POST /api/auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response of `POST /api/auth/login`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default, alias = "token")]
    pub credential: Option<String>,
    /// Failure description shown to the user.
    #[serde(default)]
    pub message: Option<String>,
}

impl LoginResponse {
    /// The credential of a successful, non-empty response.
    ///
    /// # Errors
    ///
    /// Returns the server's message (or a generic one) otherwise.
    pub fn into_credential(self) -> Result<String, String> {
        match (self.success, self.credential) {
            (true, Some(credential)) if !credential.trim().is_empty() => Ok(credential),
            (true, _) => Err("Login succeeded but no credential was returned.".to_owned()),
            (false, _) => Err(self.message.unwrap_or_else(|| "Invalid email or password.".to_owned())),
        }
    }
}
