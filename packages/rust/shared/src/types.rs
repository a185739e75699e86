//! Core domain types: page snapshots, records, attachment links, diagnostics.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// RawPageContent
// ---------------------------------------------------------------------------

/// Immutable text + HTML snapshot of one fully rendered page.
///
/// This is the only input the extractor reads. `url` is the address the page
/// was rendered from, used as the base for relative `href`s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPageContent {
    /// Rendered, visible text (the page's `innerText`).
    pub text: String,
    /// Serialized DOM after rendering.
    pub html: String,
    /// Final page URL, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl RawPageContent {
    /// Build a snapshot with no associated URL (fixtures, offline extraction).
    pub fn new(text: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: html.into(),
            url: None,
        }
    }

    /// Attach the URL the page was rendered from.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// `true` if there is no visible text at all.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One extracted record: field name -> value, in schema order.
///
/// Every declared field is present; missing values are empty strings.
/// Serializes as a JSON object whose keys follow the schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record with every name present and set to `""`.
    pub fn with_fields<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            fields: names
                .into_iter()
                .map(|n| (n.to_string(), String::new()))
                .collect(),
        }
    }

    /// Set a field, appending it if it is not yet present.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Look up a field value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(&k.into(), v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// AttachmentLink
// ---------------------------------------------------------------------------

/// A document link found on a detail page. Duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentLink {
    /// Anchor text, or a placeholder when the anchor has none.
    pub name: String,
    /// Absolute URL of the document.
    pub url: String,
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Structured warning attached to an extraction result.
///
/// None of these abort extraction; they let a caller tell a clean extraction
/// from a best-effort one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A primary field (or the block delimiter) never occurs on a non-empty page.
    SchemaMismatch { field: String },
    /// A field's occurrence count differs from the record count, so positional
    /// alignment for that field is unverified.
    AlignmentDrift {
        field: String,
        found: usize,
        expected: usize,
    },
    /// The page had no usable text.
    MalformedInput { reason: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SchemaMismatch { field } => write!(f, "field '{field}' not found on page"),
            Self::AlignmentDrift {
                field,
                found,
                expected,
            } => write!(
                f,
                "field '{field}' occurs {found} time(s), expected {expected}"
            ),
            Self::MalformedInput { reason } => write!(f, "malformed input: {reason}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction results
// ---------------------------------------------------------------------------

/// Result of extracting a listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// Records in document order.
    pub records: Vec<Record>,
    /// Warnings raised while extracting.
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    /// The empty result for a page with no usable text.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            diagnostics: vec![Diagnostic::MalformedInput {
                reason: reason.into(),
            }],
        }
    }

    /// `true` if extraction raised no diagnostics.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Result of extracting a detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetailExtraction {
    /// The single record described by the page.
    pub record: Record,
    /// Document links, in DOM order.
    pub attachments: Vec<AttachmentLink>,
    /// Warnings raised while extracting.
    pub diagnostics: Vec<Diagnostic>,
}
