//! Request DTOs for the proxy API
//!
//! Defines the structure of incoming query strings and JSON bodies.

use serde::Deserialize;

use crate::lookup::DEFAULT_RECENT_LIMIT;

/// Query string of `GET /api/v1/recent`
///
/// `limit` is kept as text so that a malformed value falls back to the default
/// instead of failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentQuery {
    #[serde(default)]
    pub limit: Option<String>,
}

impl RecentQuery {
    /// Parsed limit, or the default when missing, unparsable or zero.
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_RECENT_LIMIT)
    }
}

/// Request body for `POST /api/v1/search/url`
///
/// A missing field deserializes as empty and is rejected by the lookup layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchUrlRequest {
    #[serde(default)]
    pub url: String,
}

/// Request body for `POST /api/v1/search/host`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchHostRequest {
    #[serde(default)]
    pub host: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: Option<&str>) -> RecentQuery {
        RecentQuery {
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn test_effective_limit() {
        assert_eq!(query(Some("50")).effective_limit(), 50);
        assert_eq!(query(Some(" 7 ")).effective_limit(), 7);
        assert_eq!(query(None).effective_limit(), 20);
        assert_eq!(query(Some("abc")).effective_limit(), 20);
        assert_eq!(query(Some("-3")).effective_limit(), 20);
        assert_eq!(query(Some("0")).effective_limit(), 20);
    }

    #[test]
    fn test_search_requests_deserialize() {
        let req: SearchUrlRequest = serde_json::from_str(r#"{"url": "http://x"}"#).unwrap();
        assert_eq!(req.url, "http://x");

        let req: SearchHostRequest = serde_json::from_str(r#"{"host": "example.com"}"#).unwrap();
        assert_eq!(req.host, "example.com");
    }

    #[test]
    fn test_missing_field_is_empty() {
        let req: SearchUrlRequest = serde_json::from_str("{}").unwrap();
        assert!(req.url.is_empty());
    }
}
