//! Block segmenter for list layouts where a repeating delimiter label starts
//! each record.
//!
//! Unlike the positional strategy, fields are looked up inside their own
//! block and only the first matching line counts.
//!
//! Titles are not inside a record's block: the portal renders them as the
//! last bare line *before* the next delimiter, so they sit at the tail of the
//! previous block. The lookback depends on that layout holding. If a portal
//! ever renders a title with a colon or a pipe in it, or puts another bare
//! line after the title, the wrong line (or nothing) is picked up.

use tenderlens_shared::{Diagnostic, Extraction, FieldSchema, FieldSpec, Record};
use tracing::{debug, warn};

use crate::patterns::strip_label;

/// One delimiter-bounded chunk of page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    /// Identifier: the rest of the delimiter line, or else the next non-empty
    /// line if it carries no label. Empty when neither applies.
    pub id: &'a str,
    /// All lines of the chunk, including the identifier line.
    pub lines: Vec<&'a str>,
    /// Index of the identifier line within `lines`.
    id_line: Option<usize>,
}

impl<'a> Block<'a> {
    fn new(chunk: &'a str) -> Self {
        let lines: Vec<&str> = chunk.lines().collect();
        let id_line = lines
            .iter()
            .position(|l| !l.trim().is_empty())
            .filter(|&i| i == 0 || !lines[i].contains(':'));
        let id = id_line.map(|i| lines[i].trim()).unwrap_or("");
        Self { id, lines, id_line }
    }

    /// First line in the block starting with `"<label>:"`.
    pub fn field(&self, label: &str) -> Option<&'a str> {
        self.lines.iter().find_map(|line| strip_label(*line, label))
    }

    /// The trailing free-form line: scanning from the end, the first
    /// non-blank line with neither `:` nor `|`, excluding the identifier line.
    pub fn trailing_title(&self) -> Option<&'a str> {
        self.lines
            .iter()
            .enumerate()
            .rev()
            .filter(|(i, _)| Some(*i) != self.id_line)
            .map(|(_, line)| (*line).trim())
            .filter(|line| !line.is_empty())
            .find(|line| !line.contains(':') && !line.contains('|'))
    }
}

/// Split `text` on every `"<label>:"` and drop the preamble before the first
/// delimiter. Text without the delimiter yields no blocks.
pub fn split_blocks<'a>(text: &'a str, delimiter_label: &str) -> Vec<Block<'a>> {
    let marker = format!("{delimiter_label}:");
    text.split(marker.as_str()).skip(1).map(Block::new).collect()
}

/// Build one record per block.
///
/// Record keys are the delimiter field, then the title field (if declared),
/// then the declared fields in order. Every key is always present.
pub fn segment(
    text: &str,
    delimiter: &FieldSpec,
    fields: &FieldSchema,
    title_field: Option<&str>,
) -> Extraction {
    if text.trim().is_empty() {
        return Extraction::malformed("page text is empty");
    }

    let blocks = split_blocks(text, &delimiter.label);
    debug!(delimiter = %delimiter.label, blocks = blocks.len(), "segmented page");

    if blocks.is_empty() {
        warn!(delimiter = %delimiter.label, "delimiter absent from page");
        return Extraction {
            records: Vec::new(),
            diagnostics: vec![Diagnostic::SchemaMismatch {
                field: delimiter.name.clone(),
            }],
        };
    }

    let mut keys: Vec<&str> = vec![delimiter.name.as_str()];
    keys.extend(title_field);
    keys.extend(fields.names());

    let records = blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let mut record = Record::with_fields(keys.iter().copied());
            record.set(&delimiter.name, block.id);

            if let Some(title_key) = title_field {
                let title = i
                    .checked_sub(1)
                    .and_then(|prev| blocks[prev].trailing_title())
                    .unwrap_or("");
                record.set(title_key, title);
            }

            for spec in &fields.fields {
                if let Some(value) = block.field(&spec.label) {
                    record.set(&spec.name, value);
                }
            }
            record
        })
        .collect();

    Extraction {
        records,
        diagnostics: Vec::new(),
    }
}
