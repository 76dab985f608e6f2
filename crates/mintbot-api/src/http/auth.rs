//! API key authentication extractor.
//!
//! Reads the key from `Authorization: Bearer <key>` or `X-API-Key: <key>`
//! and compares its SHA-256 digest with the digest of the configured key.
//! When no key is configured every request is accepted.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

use crate::http::error::AppError;
use crate::state::AppState;

/// Authenticated request marker. Extracting this validates the API key.
pub struct Authenticated;

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.http.api_key.as_ref() else {
            return Ok(Authenticated);
        };

        let provided = extract_api_key(&parts.headers).ok_or(AppError::Unauthorized)?;
        if digest(&provided) == digest(expected.expose_secret()) {
            Ok(Authenticated)
        } else {
            tracing::debug!("rejected request with wrong API key");
            Err(AppError::Unauthorized)
        }
    }
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok())
        && let Some(key) = auth.strip_prefix("Bearer ")
    {
        return Some(key.trim().to_string());
    }

    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|key| key.trim().to_string())
}

fn digest(key: &str) -> [u8; 32] {
    Sha256::digest(key.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer  secret-1 "));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("secret-1"));
    }

    #[test]
    fn test_extract_x_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        headers.insert("x-api-key", HeaderValue::from_static("secret-2"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("secret-2"));
    }

    #[test]
    fn test_extract_missing() {
        assert!(extract_api_key(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_digest_matches_only_same_key() {
        assert_eq!(digest("abc"), digest("abc"));
        assert_ne!(digest("abc"), digest("abd"));
    }
}
