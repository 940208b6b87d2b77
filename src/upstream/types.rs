//! URLhaus record types
//!
//! Only the fields the dashboard shows are modelled; anything else in the
//! upstream payload is ignored.

use serde::{Deserialize, Serialize};

// == URL Summary ==
/// One row of the recent feed or of a host lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlSummary {
    pub id: Option<String>,
    pub urlhaus_reference: Option<String>,
    pub url: String,
    pub host: Option<String>,
    /// `online`, `offline` or `unknown`
    pub url_status: Option<String>,
    pub date_added: Option<String>,
    pub threat: Option<String>,
    pub tags: Option<Vec<String>>,
    pub reporter: Option<String>,
}

// == URL Detail ==
/// Full record for a single URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlDetail {
    /// `ok` or `no_results` once it reaches a caller
    pub query_status: String,
    pub id: Option<String>,
    pub urlhaus_reference: Option<String>,
    pub url: String,
    pub url_status: Option<String>,
    pub host: Option<String>,
    pub date_added: Option<String>,
    pub last_online: Option<String>,
    pub threat: Option<String>,
    pub blacklists: Option<serde_json::Map<String, serde_json::Value>>,
    pub reporter: Option<String>,
    pub larted: Option<String>,
    pub takedown_time_seconds: Option<u64>,
    pub tags: Option<Vec<String>>,
    pub payloads: Vec<Payload>,
}

/// A file served from a malicious URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payload {
    pub firstseen: Option<String>,
    pub filename: Option<String>,
    pub file_type: Option<String>,
    pub response_size: Option<String>,
    pub response_md5: Option<String>,
    pub response_sha256: Option<String>,
    pub signature: Option<String>,
    pub urlhaus_download: Option<String>,
    pub virustotal: Option<VirusTotal>,
    pub imphash: Option<String>,
    pub ssdeep: Option<String>,
    pub tlsh: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirusTotal {
    pub result: Option<String>,
    pub percent: Option<String>,
    pub link: Option<String>,
}

/// Envelope of the list endpoints (`urls/recent` and `host`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct UrlListResponse {
    pub query_status: String,
    pub urls: Option<Vec<UrlSummary>>,
}
