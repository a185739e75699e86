//! Declarative per-site schemas.
//!
//! A site is described entirely by data: which labels to look for, which
//! strategy reconstructs records from them, and how attachment anchors are
//! recognised. Adding a portal means adding a schema, not code.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TenderlensError};

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// One labeled field: `name` is the output key, `label` the visible text
/// that precedes the value on the page (without the trailing colon).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

/// Ordered set of `(name, label)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSchema {
    pub fields: Vec<FieldSpec>,
}

impl FieldSchema {
    /// Build a schema from `(name, label)` pairs.
    pub fn new<N, L>(pairs: impl IntoIterator<Item = (N, L)>) -> Self
    where
        N: Into<String>,
        L: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(n, l)| FieldSpec::new(n, l))
                .collect(),
        }
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// `true` if a field with this name is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reject empty names/labels and duplicate names.
    pub fn validate(&self, context: &str) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(TenderlensError::validation(format!(
                    "{context}: field with label '{}' has an empty name",
                    field.label
                )));
            }
            if field.label.trim().is_empty() {
                return Err(TenderlensError::validation(format!(
                    "{context}: field '{}' has an empty label",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(TenderlensError::validation(format!(
                    "{context}: field '{}' declared twice",
                    field.name
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// How a listing page's text is turned into records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum ListingStrategy {
    /// Every field recurs independently across the page; records are built by
    /// joining the i-th occurrence of each field.
    Positional {
        fields: FieldSchema,
        /// Fields whose occurrence count defines the record count.
        /// Empty means all declared fields.
        #[serde(default)]
        primary: Vec<String>,
    },
    /// Records are separated by a repeating delimiter label.
    Segmented {
        delimiter: FieldSpec,
        #[serde(default)]
        fields: FieldSchema,
        /// Output key for the title recovered from the preceding block.
        #[serde(default)]
        title_field: Option<String>,
    },
}

impl ListingStrategy {
    /// Strategy id as it appears in schema documents.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Positional { .. } => "positional",
            Self::Segmented { .. } => "segmented",
        }
    }

    fn validate(&self, site: &str) -> Result<()> {
        match self {
            Self::Positional { fields, primary } => {
                let context = format!("site '{site}' listing");
                fields.validate(&context)?;
                if fields.is_empty() {
                    return Err(TenderlensError::validation(format!(
                        "{context}: positional strategy declares no fields"
                    )));
                }
                for name in primary {
                    if !fields.contains(name) {
                        return Err(TenderlensError::validation(format!(
                            "{context}: primary field '{name}' is not declared"
                        )));
                    }
                }
                Ok(())
            }
            Self::Segmented {
                delimiter,
                fields,
                title_field,
            } => {
                let context = format!("site '{site}' listing");
                let mut all = fields.clone();
                all.fields.insert(0, delimiter.clone());
                if let Some(title) = title_field {
                    all.fields.push(FieldSpec::new(title.clone(), "(lookback)"));
                }
                all.validate(&context)
            }
        }
    }
}

/// Fields read from a single-record detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailSchema {
    pub fields: FieldSchema,
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// Rules for recognising document links among a page's anchors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRules {
    /// Attribute marking an anchor as an explicit download action.
    #[serde(default = "default_marker_attr")]
    pub marker_attr: String,
    /// Required value of `marker_attr`; `None` accepts any value.
    #[serde(default = "default_marker_value")]
    pub marker_value: Option<String>,
    /// Attribute holding the download target path.
    #[serde(default = "default_path_attr")]
    pub path_attr: String,
    /// File extensions (without the dot) treated as documents.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Filename prefixes the site uses for documents served without an extension.
    #[serde(default)]
    pub filename_prefixes: Vec<String>,
    /// Name given to attachments whose anchor has no text.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for AttachmentRules {
    fn default() -> Self {
        Self {
            marker_attr: default_marker_attr(),
            marker_value: default_marker_value(),
            path_attr: default_path_attr(),
            extensions: default_extensions(),
            filename_prefixes: Vec::new(),
            placeholder: default_placeholder(),
        }
    }
}

fn default_marker_attr() -> String {
    "data-action".into()
}
fn default_marker_value() -> Option<String> {
    Some("download".into())
}
fn default_path_attr() -> String {
    "data-path".into()
}
fn default_extensions() -> Vec<String> {
    ["pdf", "doc", "docx", "xls", "xlsx"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_placeholder() -> String {
    "Attachment".into()
}

// ---------------------------------------------------------------------------
// SiteSchema
// ---------------------------------------------------------------------------

/// Everything tenderlens knows about one procurement portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSchema {
    /// Short identifier used on the command line (e.g. `nyscr`).
    pub id: String,
    /// Human-readable portal name.
    pub name: String,
    /// Scheme + host used to resolve relative download paths.
    pub origin: String,
    /// Listing page URL; `{startnum}` is replaced with the paging offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_url: Option<String>,
    /// Page visited to harvest session cookies (defaults to `origin`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_url: Option<String>,
    /// Per-site settle delay override in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing: Option<ListingStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<DetailSchema>,
    #[serde(default)]
    pub attachments: AttachmentRules,
}

impl SiteSchema {
    /// Parsed origin URL.
    pub fn origin_url(&self) -> Result<Url> {
        Url::parse(&self.origin).map_err(|e| {
            TenderlensError::parse(format!("site '{}': invalid origin '{}': {e}", self.id, self.origin))
        })
    }

    /// Check the schema is internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(TenderlensError::validation("site schema with empty id"));
        }
        let origin = self.origin_url()?;
        if origin.cannot_be_a_base() {
            return Err(TenderlensError::validation(format!(
                "site '{}': origin '{}' is not a base URL",
                self.id, self.origin
            )));
        }
        if let Some(listing) = &self.listing {
            listing.validate(&self.id)?;
        }
        if let Some(detail) = &self.detail {
            detail
                .fields
                .validate(&format!("site '{}' detail", self.id))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site_with(listing: ListingStrategy) -> SiteSchema {
        SiteSchema {
            id: "test".into(),
            name: "Test portal".into(),
            origin: "https://portal.example.gov".into(),
            listing_url: None,
            cookie_url: None,
            settle_ms: None,
            listing: Some(listing),
            detail: None,
            attachments: AttachmentRules::default(),
        }
    }

    #[test]
    fn positional_strategy_from_toml() {
        let doc = r#"
id = "nyscr"
name = "NY State Contract Reporter"
origin = "https://www.nyscr.ny.gov"

[listing]
strategy = "positional"
fields = [
  { name = "title", label = "Title" },
  { name = "agency", label = "Agency" },
]
primary = ["title"]
"#;
        let site: SiteSchema = toml::from_str(doc).expect("parse");
        site.validate().expect("valid");
        match site.listing {
            Some(ListingStrategy::Positional { fields, primary }) => {
                assert_eq!(fields.names().collect::<Vec<_>>(), ["title", "agency"]);
                assert_eq!(primary, ["title"]);
            }
            other => panic!("expected positional, got {other:?}"),
        }
        assert_eq!(site.attachments.extensions.len(), 5);
    }

    #[test]
    fn segmented_strategy_from_toml() {
        let doc = r#"
id = "cal"
name = "Cal"
origin = "https://caleprocure.ca.gov"

[listing]
strategy = "segmented"
delimiter = { name = "eventId", label = "Event ID" }
title_field = "title"
fields = [{ name = "endDate", label = "End Date" }]
"#;
        let site: SiteSchema = toml::from_str(doc).expect("parse");
        site.validate().expect("valid");
        assert_eq!(site.listing.as_ref().map(|l| l.id()), Some("segmented"));
    }

    #[test]
    fn unknown_primary_rejected() {
        let site = site_with(ListingStrategy::Positional {
            fields: FieldSchema::new([("title", "Title")]),
            primary: vec!["agency".into()],
        });
        let err = site.validate().unwrap_err();
        assert!(err.to_string().contains("primary field 'agency'"));
    }

    #[test]
    fn duplicate_field_rejected() {
        let site = site_with(ListingStrategy::Positional {
            fields: FieldSchema::new([("title", "Title"), ("title", "Ad Title")]),
            primary: vec![],
        });
        assert!(site.validate().is_err());
    }

    #[test]
    fn title_field_cannot_shadow_delimiter() {
        let site = site_with(ListingStrategy::Segmented {
            delimiter: FieldSpec::new("id", "Solicitation ID"),
            fields: FieldSchema::default(),
            title_field: Some("id".into()),
        });
        assert!(site.validate().is_err());
    }

    #[test]
    fn invalid_origin_rejected() {
        let mut site = site_with(ListingStrategy::Positional {
            fields: FieldSchema::new([("title", "Title")]),
            primary: vec![],
        });
        site.origin = "not a url".into();
        assert!(site.validate().is_err());
    }
}
