//! # Admin Authentication
//!
//! Static shared-secret gating for the editing surface (`/admin/*`).
//!
//! This is an advisory deterrent in front of the admin panel, not an
//! access-control boundary — the same role the login prompt played in the
//! interview assistant this replaces. The interview endpoints themselves
//! are not gated.
//!
//! ## Configuration
//!
//! - `ANAMNESIS_ADMIN_KEY`: if set, `/admin/*` requests require
//!   `Authorization: Bearer <key>`; if unset, the admin surface is open
//!   (with a startup warning).

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

// =============================================================================
// ADMIN KEY AUTHENTICATION
// =============================================================================

/// Get the admin key from the environment.
///
/// Returns `Some(key)` if `ANAMNESIS_ADMIN_KEY` is set and non-empty,
/// `None` otherwise (disabling the gate).
pub fn get_admin_key_from_env() -> Option<String> {
    std::env::var("ANAMNESIS_ADMIN_KEY")
        .ok()
        .filter(|k| !k.is_empty())
}

/// Admin key middleware.
///
/// Only paths under `/admin` are gated; the interview surface stays open.
pub async fn admin_auth_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if !request.uri().path().starts_with("/admin") {
        return Ok(next.run(request).await);
    }

    let Some(expected) = get_admin_key_from_env() else {
        return Ok(next.run(request).await);
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header_value) => {
            // Support both "Bearer <key>" and raw "<key>" formats
            let provided_key = header_value.strip_prefix("Bearer ").unwrap_or(header_value);

            // Constant-time comparison to prevent timing attacks.
            // Pad both keys to the same length so ct_eq always runs over
            // the same number of bytes.
            let provided_bytes = provided_key.as_bytes();
            let expected_bytes = expected.as_bytes();

            let max_len = provided_bytes.len().max(expected_bytes.len());
            let mut padded_provided = vec![0u8; max_len];
            let mut padded_expected = vec![0u8; max_len];
            padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
            padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

            let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
            let is_valid = bytes_match && provided_bytes.len() == expected_bytes.len();

            if is_valid {
                Ok(next.run(request).await)
            } else {
                tracing::warn!(
                    event = "auth_failure",
                    reason = "invalid_admin_key",
                    "Admin authentication failed: invalid key"
                );
                Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
            }
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                "Admin authentication failed: missing Authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_admin_key_empty_returns_none() {
        // SAFETY: This is a unit test running in isolation.
        unsafe { std::env::remove_var("ANAMNESIS_ADMIN_KEY") };
        assert!(get_admin_key_from_env().is_none());
    }
}
