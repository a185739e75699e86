//! Visible-text rendering of an HTML document, approximating `innerText`.
//!
//! Block-level elements start a new line, `<br>` breaks the current line,
//! table cells on a row are separated by tabs, and whitespace inside a line
//! collapses to single spaces. Script, style and other non-rendered
//! elements contribute nothing.

use scraper::{ElementRef, Html, Node, Selector};

const SKIPPED: &[&str] = &[
    "head", "script", "style", "noscript", "template", "svg", "iframe", "object",
];

const BLOCKS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "dd", "details", "dialog",
    "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "hr", "legend", "li", "main", "nav", "ol", "p", "pre",
    "section", "summary", "table", "tbody", "tfoot", "thead", "tr", "ul",
];

/// Render the visible text of an HTML document, one rendered line per line.
pub fn render_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let body_sel = Selector::parse("body").unwrap();

    let mut out = LineBuilder::default();
    match doc.select(&body_sel).next() {
        Some(body) => walk(body, &mut out),
        None => walk(doc.root_element(), &mut out),
    }
    out.finish()
}

fn walk(el: ElementRef<'_>, out: &mut LineBuilder) {
    let tag = el.value().name();
    if SKIPPED.contains(&tag) {
        return;
    }

    let is_block = BLOCKS.contains(&tag);
    if is_block {
        out.break_line();
    }

    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_text(text),
            Node::Element(child_el) => match child_el.name() {
                "br" => out.force_break(),
                "td" | "th" => {
                    out.cell_separator();
                    if let Some(cell) = ElementRef::wrap(child) {
                        walk(cell, out);
                    }
                }
                _ => {
                    if let Some(child) = ElementRef::wrap(child) {
                        walk(child, out);
                    }
                }
            },
            _ => {}
        }
    }

    if is_block {
        out.break_line();
    }
}

#[derive(Default)]
struct LineBuilder {
    lines: Vec<String>,
    current: String,
}

impl LineBuilder {
    fn push_text(&mut self, text: &str) {
        for (i, word) in text.split_whitespace().enumerate() {
            if i > 0 || text.starts_with(char::is_whitespace) {
                self.push_space();
            }
            self.current.push_str(word);
        }
        if text.ends_with(char::is_whitespace) {
            self.push_space();
        }
    }

    /// Collapsed whitespace: at most one space, never at line start or after a tab.
    fn push_space(&mut self) {
        if !self.current.is_empty() && !self.current.ends_with([' ', '\t']) {
            self.current.push(' ');
        }
    }

    fn cell_separator(&mut self) {
        let trimmed = self.current.trim_end_matches(' ').len();
        self.current.truncate(trimmed);
        if !self.current.is_empty() {
            self.current.push('\t');
        }
    }

    /// End the current line if it has content.
    fn break_line(&mut self) {
        let line = self.current.trim();
        if !line.is_empty() {
            self.lines.push(line.to_string());
        }
        self.current.clear();
    }

    /// End the current line unconditionally (`<br>`), keeping blank lines.
    fn force_break(&mut self) {
        self.lines.push(self.current.trim().to_string());
        self.current.clear();
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}
