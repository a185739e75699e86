//! Strategy dispatch: route a rendered page to the extractor its schema names.

use tenderlens_shared::{
    AttachmentRules, DetailExtraction, DetailSchema, Diagnostic, Extraction, FieldSchema,
    FieldSpec, ListingStrategy, RawPageContent, Record,
};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::attachments::classify_attachments;
use crate::correlate::{correlate, validate_alignment};
use crate::fields::FieldScanner;
use crate::segment::segment;

/// Extract a listing page with the given strategy.
///
/// Never fails: blank pages and unexpected layouts come back as an empty or
/// partial [`Extraction`] with diagnostics. Compiles the strategy's label
/// patterns on every call; keep a [`ListingExtractor`] to scan many pages.
pub fn extract_listing(page: &RawPageContent, strategy: &ListingStrategy) -> Extraction {
    ListingExtractor::new(strategy).extract(page)
}

/// Positional join over the whole page text.
pub fn extract_positional(text: &str, fields: &FieldSchema, primary: &[String]) -> Extraction {
    join_positional(&FieldScanner::new(fields), text, primary)
}

fn join_positional(scanner: &FieldScanner, text: &str, primary: &[String]) -> Extraction {
    if text.trim().is_empty() {
        return Extraction::malformed("page text is empty");
    }

    let occurrences = scanner.scan(text);
    Extraction {
        records: correlate(&occurrences, primary),
        diagnostics: validate_alignment(&occurrences, primary, true),
    }
}

// ---------------------------------------------------------------------------
// ListingExtractor
// ---------------------------------------------------------------------------

/// A listing strategy with its label patterns compiled once.
#[derive(Debug, Clone)]
pub struct ListingExtractor<'s> {
    strategy: &'s ListingStrategy,
    compiled: Compiled<'s>,
}

#[derive(Debug, Clone)]
enum Compiled<'s> {
    Positional {
        scanner: FieldScanner,
        primary: &'s [String],
    },
    Segmented {
        delimiter: &'s FieldSpec,
        fields: &'s FieldSchema,
        title_field: Option<&'s str>,
    },
}

impl<'s> ListingExtractor<'s> {
    pub fn new(strategy: &'s ListingStrategy) -> Self {
        let compiled = match strategy {
            ListingStrategy::Positional { fields, primary } => Compiled::Positional {
                scanner: FieldScanner::new(fields),
                primary,
            },
            ListingStrategy::Segmented {
                delimiter,
                fields,
                title_field,
            } => Compiled::Segmented {
                delimiter,
                fields,
                title_field: title_field.as_deref(),
            },
        };
        Self { strategy, compiled }
    }

    #[instrument(skip_all, fields(strategy = self.strategy.id()))]
    pub fn extract(&self, page: &RawPageContent) -> Extraction {
        let extraction = match &self.compiled {
            Compiled::Positional { scanner, primary } => {
                join_positional(scanner, &page.text, primary)
            }
            Compiled::Segmented {
                delimiter,
                fields,
                title_field,
            } => segment(&page.text, delimiter, fields, *title_field),
        };

        debug!(
            records = extraction.records.len(),
            diagnostics = extraction.diagnostics.len(),
            "listing extracted"
        );
        extraction
    }
}

// ---------------------------------------------------------------------------
// DetailExtractor
// ---------------------------------------------------------------------------

/// Extract a single-record detail page plus its attachment links.
///
/// Each field takes its first occurrence on the page. The first declared
/// field identifies the page; if it never occurs the result carries a
/// schema-mismatch diagnostic.
pub fn extract_detail(
    page: &RawPageContent,
    detail: &DetailSchema,
    origin: &Url,
    rules: &AttachmentRules,
) -> DetailExtraction {
    DetailExtractor::new(detail).extract(page, origin, rules)
}

/// A detail schema with its label patterns compiled once.
#[derive(Debug, Clone)]
pub struct DetailExtractor<'s> {
    detail: &'s DetailSchema,
    scanner: FieldScanner,
}

impl<'s> DetailExtractor<'s> {
    pub fn new(detail: &'s DetailSchema) -> Self {
        Self {
            detail,
            scanner: FieldScanner::new(&detail.fields),
        }
    }

    #[instrument(skip_all, fields(fields = self.detail.fields.len()))]
    pub fn extract(
        &self,
        page: &RawPageContent,
        origin: &Url,
        rules: &AttachmentRules,
    ) -> DetailExtraction {
        let attachments = classify_attachments(&page.html, page.url.as_deref(), origin, rules);

        let mut record = Record::with_fields(self.detail.fields.names());
        let mut diagnostics = Vec::new();

        if page.is_blank() {
            diagnostics.push(Diagnostic::MalformedInput {
                reason: "page text is empty".into(),
            });
            return DetailExtraction {
                record,
                attachments,
                diagnostics,
            };
        }

        let occurrences = self.scanner.scan(&page.text);
        for (field, values) in occurrences.iter() {
            if let Some(first) = values.first() {
                record.set(field, first.as_str());
            }
        }

        if let Some(identity) = self.detail.fields.fields.first() {
            if occurrences.count(&identity.name) == 0 {
                warn!(field = %identity.name, "detail page identity field absent");
                diagnostics.push(Diagnostic::SchemaMismatch {
                    field: identity.name.clone(),
                });
            }
        }

        DetailExtraction {
            record,
            attachments,
            diagnostics,
        }
    }
}
