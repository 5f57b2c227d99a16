//! Credential payload decoding.
//!
//! The credential is a compact three-part token (`header.payload.signature`).
//! Only the payload is read; the signature is never checked because the
//! issuer is trusted and verification belongs to the server.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is a `DecodeError` value. Callers treat any of them as
//! "no credential".

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{OffsetDateTime, PrimitiveDateTime};

const SUBJECT_FIELDS: &[&str] = &[
    "sub",
    "nameid",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
];

const NAME_FIELDS: &[&str] = &[
    "name",
    "unique_name",
    "email",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name",
];

const EXPIRY_FIELD: &str = "exp";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("expected 3 segments, found {0}")]
    SegmentCount(usize),

    #[error("payload is not valid base64url")]
    Base64,

    #[error("payload is not a JSON object: {0}")]
    Payload(String),

    #[error("payload has no exp field")]
    MissingExpiry,

    #[error("exp is not a usable unix timestamp")]
    InvalidExpiry,
}

/// Identity fields and validity window carried by a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub subject_id: String,
    pub display_name: String,
    pub expires_at: OffsetDateTime,
}

/// User identity cached next to the credential for display purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject_id: String,
    pub display_name: String,
}

impl Claims {
    /// `now < expires_at`.
    #[must_use]
    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        now < self.expires_at
    }

    /// Time left before expiry, or `None` once expired.
    #[must_use]
    pub fn remaining(&self, now: OffsetDateTime) -> Option<Duration> {
        if !self.is_valid_at(now) {
            return None;
        }
        (self.expires_at - now).try_into().ok()
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity { subject_id: self.subject_id.clone(), display_name: self.display_name.clone() }
    }
}

/// Free-function form of [`Claims::is_valid_at`].
#[must_use]
pub fn is_valid(claims: &Claims, now: OffsetDateTime) -> bool {
    claims.is_valid_at(now)
}

/// Decode the payload segment of `raw` into `Claims`.
///
/// # Errors
///
/// Returns a `DecodeError` for a wrong segment count, bad base64, a payload
/// that is not a JSON object, or a missing/unusable `exp`.
pub fn decode(raw: &str) -> Result<Claims, DecodeError> {
    let segments: Vec<&str> = raw.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::SegmentCount(segments.len()));
    }

    let bytes = decode_segment(segments[1])?;
    let fields: Map<String, Value> =
        serde_json::from_slice(&bytes).map_err(|e| DecodeError::Payload(e.to_string()))?;

    let expires_at = parse_expiry(fields.get(EXPIRY_FIELD).ok_or(DecodeError::MissingExpiry)?)?;

    Ok(Claims {
        subject_id: first_text(&fields, SUBJECT_FIELDS),
        display_name: first_text(&fields, NAME_FIELDS),
        expires_at,
    })
}

/// Issuers differ on padding and alphabet; normalize to unpadded base64url.
fn decode_segment(segment: &str) -> Result<Vec<u8>, DecodeError> {
    let normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    if normalized.is_empty() {
        return Err(DecodeError::Base64);
    }
    URL_SAFE_NO_PAD.decode(normalized.as_bytes()).map_err(|_| DecodeError::Base64)
}

fn parse_expiry(value: &Value) -> Result<OffsetDateTime, DecodeError> {
    let Value::Number(number) = value else {
        return Err(DecodeError::InvalidExpiry);
    };
    let seconds = match number.as_i64() {
        Some(secs) => secs,
        None => whole_seconds(number.as_f64().ok_or(DecodeError::InvalidExpiry)?)?,
    };
    Ok(OffsetDateTime::from_unix_timestamp(seconds).unwrap_or_else(|_| clamp_out_of_range(seconds)))
}

// Issuers encode "never expires" as a far-future `exp`; it stays far future.
fn clamp_out_of_range(seconds: i64) -> OffsetDateTime {
    if seconds > 0 {
        PrimitiveDateTime::MAX.assume_utc()
    } else {
        PrimitiveDateTime::MIN.assume_utc()
    }
}

// Fractional `exp` values show up from some issuers; sub-second precision is
// dropped and the float-to-int cast saturates at the `i64` bounds.
#[allow(clippy::cast_possible_truncation)]
fn whole_seconds(secs: f64) -> Result<i64, DecodeError> {
    if !secs.is_finite() {
        return Err(DecodeError::InvalidExpiry);
    }
    Ok(secs.floor() as i64)
}

fn first_text(fields: &Map<String, Value>, names: &[&str]) -> String {
    names
        .iter()
        .find_map(|name| match fields.get(*name) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}
