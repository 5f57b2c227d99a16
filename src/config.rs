//! Session configuration with defaults and key/value overrides.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::error::SessionError;

pub const DEFAULT_CREDENTIAL_KEY: &str = "paytrack_token";
pub const DEFAULT_IDENTITY_KEY: &str = "paytrack_user";
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_LOGOUT_REDIRECT_DELAY_MS: u64 = 1500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Storage key holding the raw credential.
    pub credential_key: String,
    /// Storage key holding the cached `Identity` JSON.
    pub identity_key: String,
    /// Period of the background validity re-check.
    pub check_interval: Duration,
    /// Pause on the logout surface before moving on to `/login`.
    pub logout_redirect_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            credential_key: DEFAULT_CREDENTIAL_KEY.to_owned(),
            identity_key: DEFAULT_IDENTITY_KEY.to_owned(),
            check_interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            logout_redirect_delay: Duration::from_millis(DEFAULT_LOGOUT_REDIRECT_DELAY_MS),
        }
    }
}

impl SessionConfig {
    /// Build config from an arbitrary key lookup.
    ///
    /// Optional:
    /// - `SESSION_CREDENTIAL_KEY`: default `paytrack_token`
    /// - `SESSION_IDENTITY_KEY`: default `paytrack_user`
    /// - `SESSION_CHECK_INTERVAL_SECS`: default 60, must be > 0
    /// - `SESSION_LOGOUT_REDIRECT_DELAY_MS`: default 1500
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ConfigParse` for non-numeric durations, a zero
    /// check interval, or an empty storage key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SessionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential_key = parse_key(lookup("SESSION_CREDENTIAL_KEY"), DEFAULT_CREDENTIAL_KEY, "SESSION_CREDENTIAL_KEY")?;
        let identity_key = parse_key(lookup("SESSION_IDENTITY_KEY"), DEFAULT_IDENTITY_KEY, "SESSION_IDENTITY_KEY")?;
        if credential_key == identity_key {
            return Err(SessionError::ConfigParse(format!(
                "credential and identity keys must differ (both '{credential_key}')"
            )));
        }

        let check_secs =
            parse_u64(lookup("SESSION_CHECK_INTERVAL_SECS"), DEFAULT_CHECK_INTERVAL_SECS, "SESSION_CHECK_INTERVAL_SECS")?;
        if check_secs == 0 {
            return Err(SessionError::ConfigParse("SESSION_CHECK_INTERVAL_SECS must be > 0".to_owned()));
        }
        let delay_ms = parse_u64(
            lookup("SESSION_LOGOUT_REDIRECT_DELAY_MS"),
            DEFAULT_LOGOUT_REDIRECT_DELAY_MS,
            "SESSION_LOGOUT_REDIRECT_DELAY_MS",
        )?;

        Ok(Self {
            credential_key,
            identity_key,
            check_interval: Duration::from_secs(check_secs),
            logout_redirect_delay: Duration::from_millis(delay_ms),
        })
    }

    /// Build config from process environment variables.
    ///
    /// # Errors
    ///
    /// Same as [`SessionConfig::from_lookup`].
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

fn parse_key(raw: Option<String>, default: &str, name: &str) -> Result<String, SessionError> {
    match raw {
        None => Ok(default.to_owned()),
        Some(value) => {
            let value = value.trim();
            if value.is_empty() {
                Err(SessionError::ConfigParse(format!("{name} must not be empty")))
            } else {
                Ok(value.to_owned())
            }
        }
    }
}

fn parse_u64(raw: Option<String>, default: u64, name: &str) -> Result<u64, SessionError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| SessionError::ConfigParse(format!("invalid {name}: '{value}'"))),
    }
}
