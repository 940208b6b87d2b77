//! Auth-Key Extractor
//!
//! Upstream-bound routes need the caller's URLhaus key, sent as the `Auth-Key` header.
//! The key is forwarded as-is; URLhaus decides whether it is valid.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ProxyError;

/// Header carrying the caller's URLhaus key
pub const AUTH_KEY_HEADER: &str = "auth-key";

/// The caller's URLhaus API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthKey(pub String);

impl AuthKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthKey
where
    S: Send + Sync,
{
    type Rejection = ProxyError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(AUTH_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| AuthKey(key.to_string()))
            .ok_or_else(|| ProxyError::Unauthorized("API key required".to_string()))
    }
}
