//! JSON response envelopes and the payloads they carry.
//!
//! Every scrape answers with `{"success": true, "timestamp": ..., ...payload}`
//! or `{"success": false, "error": ..., "timestamp": ...}`.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use tenderlens_shared::{AttachmentLink, Diagnostic, Record, Result, TenderlensError};

/// Successful response: payload fields are flattened beside `success` and `timestamp`.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub timestamp: String,
    #[serde(flatten)]
    pub payload: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            success: true,
            timestamp: now_timestamp(),
            payload,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TenderlensError::parse(format!("failed to serialize response: {e}")))
    }
}

/// Failed response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    pub timestamp: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            error: error.to_string(),
            timestamp: now_timestamp(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TenderlensError::parse(format!("failed to serialize response: {e}")))
    }
}

/// UTC, millisecond precision, `Z` suffix.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Result of scraping one listing page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPayload {
    pub url: String,
    pub site: String,
    pub total_records: usize,
    pub records: Vec<Record>,
    pub diagnostics: Vec<Diagnostic>,
    /// `name=value;name=value` cookie string for follow-up requests.
    pub cookies: String,
}

/// Result of scraping one detail page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailPayload {
    pub url: String,
    pub site: String,
    pub record: Record,
    pub attachments: Vec<AttachmentLink>,
    pub diagnostics: Vec<Diagnostic>,
    pub cookies: String,
}

/// Cookies harvested from a portal's landing page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CookiePayload {
    pub cookie_string: String,
    pub cookies: BTreeMap<String, String>,
    pub cookie_count: usize,
}
