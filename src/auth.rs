//! Bearer credential handling
//!
//! The token itself is only forwarded to the backend, which is the party
//! that verifies it. Locally we need two things: the raw token, and a user
//! identity to key conversations on. The identity is read from the JWT
//! payload without verifying the signature, so it must never be used for
//! authorisation.

use crate::error::{Result, VyparError};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::Value;

/// Claims checked, in order, for the user identity
const IDENTITY_CLAIMS: [&str; 3] = ["_id", "id", "sub"];

/// Extract the token from an `Authorization` header value
///
/// # Errors
///
/// `VyparError::Authentication` when the header is absent or is not of the
/// form `Bearer <token>`.
///
/// # Examples
///
/// ```
/// use vypar::auth::bearer_token;
///
/// assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
/// assert!(bearer_token(Some("Basic abc")).is_err());
/// assert!(bearer_token(None).is_err());
/// ```
pub fn bearer_token(header: Option<&str>) -> Result<String> {
    let header = header
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| VyparError::Authentication("Authorization header missing".to_string()))?;

    let parts: Vec<&str> = header.split_whitespace().collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => Ok(token.to_string()),
        _ => Err(VyparError::Authentication(
            "Invalid authorization header format".to_string(),
        )
        .into()),
    }
}

/// Best-effort user identity from a JWT payload
///
/// Returns `None` for opaque tokens or payloads without an identity claim.
pub fn user_id_from_token(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;

    IDENTITY_CLAIMS.iter().find_map(|claim| match claims.get(*claim)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
