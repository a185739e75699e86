//! Record correlator: positional join of independently scanned fields.
//!
//! Record `i` takes the i-th occurrence of every field. Nothing verifies that
//! those occurrences belong together: if one record on the page lacks a field
//! (or repeats it), every later record is shifted by one for that field. This
//! is accepted behaviour. [`validate_alignment`] reports the mismatch so a
//! caller can tell clean output from best-effort output; the records
//! themselves are never adjusted.

use tenderlens_shared::{Diagnostic, Record};
use tracing::{debug, warn};

use crate::fields::Occurrences;

/// Fields that define the record count. Falls back to every scanned field
/// when no primaries are declared.
fn reference_fields<'a>(occ: &'a Occurrences, primary: &'a [String]) -> Vec<&'a str> {
    if primary.is_empty() {
        occ.fields().collect()
    } else {
        primary.iter().map(String::as_str).collect()
    }
}

/// Number of records the positional join will produce:
/// the largest occurrence count among the reference fields.
pub fn record_count(occ: &Occurrences, primary: &[String]) -> usize {
    reference_fields(occ, primary)
        .into_iter()
        .map(|f| occ.count(f))
        .max()
        .unwrap_or(0)
}

/// Join occurrence sequences by index.
///
/// Every scanned field appears in every record; positions past the end of a
/// field's sequence are empty strings.
pub fn correlate(occ: &Occurrences, primary: &[String]) -> Vec<Record> {
    let total = record_count(occ, primary);
    debug!(records = total, "correlating fields");

    (0..total)
        .map(|i| {
            occ.iter()
                .map(|(field, values)| (field, values.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

/// Compare each field's occurrence count to the record count.
///
/// Emits `SchemaMismatch` for a reference field that never occurs on a page
/// that has text, and `AlignmentDrift` for any field whose count differs from
/// the record count (a reference field with zero occurrences only gets the
/// mismatch).
pub fn validate_alignment(
    occ: &Occurrences,
    primary: &[String],
    page_has_text: bool,
) -> Vec<Diagnostic> {
    let total = record_count(occ, primary);
    let reference = reference_fields(occ, primary);
    let mut diagnostics = Vec::new();

    if page_has_text {
        for field in &reference {
            if occ.count(field) == 0 {
                warn!(field, "reference field absent from page");
                diagnostics.push(Diagnostic::SchemaMismatch {
                    field: field.to_string(),
                });
            }
        }
    }

    if total == 0 {
        return diagnostics;
    }

    for (field, values) in occ.iter() {
        let found = values.len();
        if found == total {
            continue;
        }
        if found == 0 && reference.contains(&field) {
            continue;
        }
        warn!(field, found, expected = total, "field occurrence count disagrees");
        diagnostics.push(Diagnostic::AlignmentDrift {
            field: field.to_string(),
            found,
            expected: total,
        });
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::extract_occurrences;
    use tenderlens_shared::FieldSchema;

    fn primary(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn two_clean_records() {
        let schema = FieldSchema::new([("title", "Title"), ("agency", "Agency")]);
        let occ = extract_occurrences("Title: A\nAgency: X\nTitle: B\nAgency: Y", &schema);
        let records = correlate(&occ, &primary(&["title", "agency"]));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("title"), Some("A"));
        assert_eq!(records[0].get("agency"), Some("X"));
        assert_eq!(records[1].get("title"), Some("B"));
        assert_eq!(records[1].get("agency"), Some("Y"));
        assert!(validate_alignment(&occ, &primary(&["title", "agency"]), true).is_empty());
    }

    #[test]
    fn short_secondary_field_defaults_to_empty() {
        let schema = FieldSchema::new([("title", "Title"), ("agency", "Agency")]);
        let text = "Title: A\nAgency: X\nTitle: B\nAgency: Y\nTitle: C";
        let occ = extract_occurrences(text, &schema);
        let records = correlate(&occ, &primary(&["title"]));

        assert_eq!(records.len(), 3);
        assert_eq!(records[2].get("title"), Some("C"));
        assert_eq!(records[2].get("agency"), Some(""));

        let diags = validate_alignment(&occ, &primary(&["title"]), true);
        assert_eq!(
            diags,
            vec![Diagnostic::AlignmentDrift {
                field: "agency".into(),
                found: 2,
                expected: 3,
            }]
        );
    }

    #[test]
    fn missing_field_shifts_later_records() {
        // The second ad has no Agency line; its neighbour's agency slides up.
        let schema = FieldSchema::new([("title", "Title"), ("agency", "Agency")]);
        let text = "Title: A\nAgency: X\nTitle: B\nTitle: C\nAgency: Z";
        let occ = extract_occurrences(text, &schema);
        let records = correlate(&occ, &primary(&["title"]));

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].get("title"), Some("B"));
        assert_eq!(records[1].get("agency"), Some("Z"));
        assert_eq!(records[2].get("agency"), Some(""));
    }

    #[test]
    fn record_count_is_max_over_primaries() {
        let schema = FieldSchema::new([
            ("title", "Title"),
            ("agency", "Agency"),
            ("issueDate", "Issue Date"),
            ("location", "Location"),
        ]);
        let text = "Title: A\nIssue Date: 1\nIssue Date: 2\nLocation: L1\nLocation: L2\nLocation: L3\nLocation: L4";
        let occ = extract_occurrences(text, &schema);
        let p = primary(&["title", "agency", "issueDate"]);

        // Location is not a primary field, so its four hits do not count.
        assert_eq!(record_count(&occ, &p), 2);
        assert_eq!(correlate(&occ, &p).len(), 2);
    }

    #[test]
    fn no_primaries_uses_all_fields() {
        let schema = FieldSchema::new([("title", "Title"), ("agency", "Agency")]);
        let occ = extract_occurrences("Agency: X\nAgency: Y", &schema);
        assert_eq!(record_count(&occ, &[]), 2);
    }

    #[test]
    fn absent_primary_reports_schema_mismatch() {
        let schema = FieldSchema::new([("title", "Title"), ("agency", "Agency")]);
        let occ = extract_occurrences("Welcome to the portal", &schema);
        let p = primary(&["title"]);

        assert!(correlate(&occ, &p).is_empty());
        assert_eq!(
            validate_alignment(&occ, &p, true),
            vec![Diagnostic::SchemaMismatch {
                field: "title".into()
            }]
        );
    }

    #[test]
    fn every_record_carries_every_field() {
        let schema = FieldSchema::new([("title", "Title"), ("agency", "Agency"), ("adType", "Ad Type")]);
        let occ = extract_occurrences("Title: A\nTitle: B", &schema);
        for record in correlate(&occ, &primary(&["title"])) {
            assert_eq!(record.len(), 3);
            assert_eq!(record.get("adType"), Some(""));
        }
    }
}
