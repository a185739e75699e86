//! Field extractor: every occurrence of every labeled field, in document order.
//!
//! The scan makes no assumption about how often a field recurs. Deciding how
//! occurrences line up into records is the correlator's job.

use regex::Regex;
use tenderlens_shared::FieldSchema;
use tracing::debug;

use crate::patterns::label_pattern;

/// Per-field occurrence sequences, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occurrences {
    by_field: Vec<(String, Vec<String>)>,
}

impl Occurrences {
    /// Values for a field in document order; empty if the field is unknown
    /// or never occurred.
    pub fn values(&self, field: &str) -> &[String] {
        self.by_field
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// Number of occurrences of a field.
    pub fn count(&self, field: &str) -> usize {
        self.values(field).len()
    }

    /// Iterate `(field, values)` in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.by_field
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Field names in schema order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.by_field.iter().map(|(name, _)| name.as_str())
    }
}

/// Compiled label patterns for one schema. Build once, scan many pages.
#[derive(Debug, Clone)]
pub struct FieldScanner {
    patterns: Vec<(String, Option<Regex>)>,
}

impl FieldScanner {
    pub fn new(schema: &FieldSchema) -> Self {
        Self {
            patterns: schema
                .fields
                .iter()
                .map(|f| (f.name.clone(), label_pattern(&f.label)))
                .collect(),
        }
    }

    /// Collect the trimmed value after each `"<label>:"` occurrence.
    pub fn scan(&self, text: &str) -> Occurrences {
        let by_field = self
            .patterns
            .iter()
            .map(|(name, pattern)| {
                let values: Vec<String> = pattern
                    .as_ref()
                    .map(|re| {
                        re.captures_iter(text)
                            .map(|caps| caps[1].trim().to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                debug!(field = %name, occurrences = values.len(), "scanned field");
                (name.clone(), values)
            })
            .collect();

        Occurrences { by_field }
    }
}

/// One-shot convenience wrapper around [`FieldScanner`].
pub fn extract_occurrences(text: &str, schema: &FieldSchema) -> Occurrences {
    FieldScanner::new(schema).scan(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FieldSchema {
        FieldSchema::new([("title", "Title"), ("agency", "Agency"), ("dueDate", "Due Date")])
    }

    #[test]
    fn captures_all_occurrences_in_order() {
        let text = "Title: A\nAgency: X\nTitle: B\nAgency: Y\nTitle: C";
        let occ = extract_occurrences(text, &schema());
        assert_eq!(occ.values("title"), ["A", "B", "C"]);
        assert_eq!(occ.values("agency"), ["X", "Y"]);
    }

    #[test]
    fn missing_field_is_empty_sequence() {
        let occ = extract_occurrences("Title: A", &schema());
        assert!(occ.values("dueDate").is_empty());
        assert_eq!(occ.count("dueDate"), 0);
        assert_eq!(occ.count("unknown"), 0);
    }

    #[test]
    fn values_are_trimmed() {
        let occ = extract_occurrences("Due Date:    03/15/2025 2:00 PM   \r\n", &schema());
        assert_eq!(occ.values("dueDate"), ["03/15/2025 2:00 PM"]);
    }

    #[test]
    fn label_mid_line_is_matched() {
        // Rendered tables often put several labeled cells on one line.
        let occ = extract_occurrences("Ad #123   Title: Snow removal", &schema());
        assert_eq!(occ.values("title"), ["Snow removal"]);
    }

    #[test]
    fn label_without_value_counts_as_occurrence() {
        let occ = extract_occurrences("Agency:\nTitle: A\nAgency: Y", &schema());
        assert_eq!(occ.values("agency"), ["", "Y"]);
    }

    #[test]
    fn schema_order_is_preserved() {
        let occ = extract_occurrences("", &schema());
        assert_eq!(occ.fields().collect::<Vec<_>>(), ["title", "agency", "dueDate"]);
    }

    #[test]
    fn scanner_is_reusable() {
        let scanner = FieldScanner::new(&schema());
        let first = scanner.scan("Title: A");
        let second = scanner.scan("Title: A");
        assert_eq!(first, second);
    }
}
