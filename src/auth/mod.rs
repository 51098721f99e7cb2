//! PSK-based gate in front of the profile API.
//!
//! The identity provider and intake client share a key; requests without it are
//! rejected before any profile is read. Keys are compared in constant time.

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Middleware checking the shared key. `None` disables the gate (dev mode).
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    let matches = provided_key(request.headers()).map(|key| constant_time_compare(key, &expected));

    match matches {
        Some(true) => next.run(request).await,
        Some(false) => unauthorized_response("Invalid API key"),
        None => unauthorized_response("Missing API key"),
    }
}

/// Key from `x-api-key`, falling back to an `Authorization: Bearer` token.
fn provided_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unauthorized_response(message: &str) -> Response {
    tracing::warn!("Rejected API request: {}", message);
    AppError::Unauthorized(message.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("volunteer-key", "volunteer-key"));
        assert!(!constant_time_compare("volunteer-key", "volunteer-kez"));
        assert!(!constant_time_compare("short", "much-longer-key"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_provided_key_prefers_api_key_header() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("from-header"));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-bearer"),
        );

        assert_eq!(provided_key(&headers), Some("from-header"));
    }

    #[test]
    fn test_provided_key_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-bearer"),
        );
        assert_eq!(provided_key(&headers), Some("from-bearer"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(provided_key(&headers), None);
    }

    #[test]
    fn test_unauthorized_response_status() {
        let response = unauthorized_response("Missing API key");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
