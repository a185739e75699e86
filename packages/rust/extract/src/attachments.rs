//! Attachment classifier for detail pages.
//!
//! Anchors are checked in priority order:
//! 1. explicit download action (marker attribute + target path attribute),
//! 2. an href that looks like a document (extension or filename prefix),
//! 3. anything else is ignored.
//!
//! Repeated anchors to the same document produce repeated entries.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tenderlens_shared::{AttachmentLink, AttachmentRules};
use tracing::debug;
use url::Url;

use crate::patterns::collapse_whitespace;

static ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("anchor selector"));

/// Classify every anchor in `html`.
///
/// `origin` resolves download-action paths. Plain hrefs resolve against
/// `page_url` like a browser's `a.href`, falling back to `origin`.
pub fn classify_attachments(
    html: &str,
    page_url: Option<&str>,
    origin: &Url,
    rules: &AttachmentRules,
) -> Vec<AttachmentLink> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let doc = Html::parse_document(html);
    let base = page_url
        .and_then(|u| Url::parse(u).ok())
        .unwrap_or_else(|| origin.clone());

    let mut links = Vec::new();
    let mut anchors = 0usize;

    for el in doc.select(&ANCHOR_SEL) {
        anchors += 1;
        let url = download_action_url(&el, origin, rules)
            .or_else(|| document_href(&el, &base, rules));

        if let Some(url) = url {
            links.push(AttachmentLink {
                name: anchor_name(&el, rules),
                url,
            });
        }
    }

    debug!(anchors, attachments = links.len(), "classified anchors");
    links
}

/// Rule 1: the anchor is an explicit download action with a target path.
fn download_action_url(el: &ElementRef<'_>, origin: &Url, rules: &AttachmentRules) -> Option<String> {
    let marker = el.value().attr(&rules.marker_attr)?;
    if let Some(expected) = &rules.marker_value {
        if !marker.trim().eq_ignore_ascii_case(expected) {
            return None;
        }
    }

    let path = el.value().attr(&rules.path_attr)?.trim();
    if !is_link_target(path) {
        return None;
    }

    if let Ok(absolute) = Url::parse(path) {
        return matches!(absolute.scheme(), "http" | "https").then(|| path.to_string());
    }

    match origin.join(path) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(e) => {
            debug!(path, error = %e, "download path does not resolve against origin");
            None
        }
    }
}

/// Rule 2: the href points at a document file. Absolute hrefs are returned
/// as written; relative ones are resolved against `base`.
fn document_href(el: &ElementRef<'_>, base: &Url, rules: &AttachmentRules) -> Option<String> {
    let href = el.value().attr("href")?.trim();
    if !is_link_target(href) {
        return None;
    }

    let (resolved, absolute) = match Url::parse(href) {
        Ok(url) => (url, true),
        Err(_) => (base.join(href).ok()?, false),
    };

    if !is_document_url(&resolved, rules) {
        return None;
    }

    Some(if absolute {
        href.to_string()
    } else {
        resolved.to_string()
    })
}

/// Empty values, fragments and script or mail links never name a document.
fn is_link_target(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    !(target.is_empty()
        || target.starts_with('#')
        || lower.starts_with("javascript:")
        || lower.starts_with("mailto:"))
}

/// `true` if the URL's last path segment has a document extension or starts
/// with one of the site's document filename prefixes.
pub(crate) fn is_document_url(url: &Url, rules: &AttachmentRules) -> bool {
    let file = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("")
        .to_lowercase();

    if file.is_empty() {
        return false;
    }

    let has_extension = file
        .rsplit_once('.')
        .is_some_and(|(_, ext)| rules.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));

    has_extension
        || rules
            .filename_prefixes
            .iter()
            .any(|p| !p.is_empty() && file.starts_with(&p.to_lowercase()))
}

fn anchor_name(el: &ElementRef<'_>, rules: &AttachmentRules) -> String {
    let text = collapse_whitespace(&el.text().collect::<String>());
    if text.is_empty() {
        rules.placeholder.clone()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://caleprocure.ca.gov").unwrap()
    }

    fn classify(html: &str) -> Vec<AttachmentLink> {
        classify_attachments(html, None, &origin(), &AttachmentRules::default())
    }

    #[test]
    fn download_action_and_pdf_href() {
        let html = r#"<html><body>
            <a data-action="download" data-path="/event/files/addendum-1.docx">Addendum 1</a>
            <a href="https://files.example.gov/rfp/RFP-2024-17.pdf">RFP Document</a>
        </body></html>"#;

        let links = classify(html);
        assert_eq!(
            links,
            vec![
                AttachmentLink {
                    name: "Addendum 1".into(),
                    url: "https://caleprocure.ca.gov/event/files/addendum-1.docx".into(),
                },
                AttachmentLink {
                    name: "RFP Document".into(),
                    url: "https://files.example.gov/rfp/RFP-2024-17.pdf".into(),
                },
            ]
        );
    }

    #[test]
    fn download_action_takes_priority_over_href() {
        let html = r#"<a href="/ignored.pdf" data-action="download" data-path="files/real.pdf">Bid</a>"#;
        let links = classify(html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://caleprocure.ca.gov/files/real.pdf");
    }

    #[test]
    fn absolute_download_path_is_kept() {
        let html = r#"<a data-action="download" data-path="https://cdn.example.gov/x.bin">X</a>"#;
        assert_eq!(classify(html)[0].url, "https://cdn.example.gov/x.bin");
    }

    #[test]
    fn marker_without_path_falls_back_to_href() {
        let html = r#"<a data-action="download" href="https://a.gov/spec.XLSX">Pricing</a>
                      <a data-action="download">Orphan</a>"#;
        let links = classify(html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://a.gov/spec.XLSX");
    }

    #[test]
    fn download_action_with_script_or_foreign_scheme_is_ignored() {
        let html = r##"<a data-action="download" data-path="javascript:void(0)">X</a>
                      <a data-action="download" data-path="JavaScript:openDoc(4)">Y</a>
                      <a data-action="download" data-path="mailto:buyer@example.gov">Z</a>
                      <a data-action="download" data-path="#">W</a>
                      <a data-action="download" data-path="ftp://files.example.gov/a.pdf">V</a>"##;
        assert!(classify(html).is_empty());
    }

    #[test]
    fn script_path_falls_back_to_document_href() {
        let html = r#"<a data-action="download" data-path="javascript:void(0)" href="/files/bid.pdf">Bid</a>"#;
        let links = classify(html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://caleprocure.ca.gov/files/bid.pdf");
    }

    #[test]
    fn wrong_marker_value_is_not_a_download_action() {
        let html = r#"<a data-action="preview" data-path="/files/a.txt">Preview</a>"#;
        assert!(classify(html).is_empty());
    }

    #[test]
    fn non_documents_are_ignored() {
        let html = r##"<a href="/events">Events</a>
                      <a href="#top">Top</a>
                      <a href="mailto:buyer@example.gov">Email buyer.pdf</a>
                      <a href="https://a.gov/pdf">Not a file</a>"##;
        assert!(classify(html).is_empty());
    }

    #[test]
    fn relative_href_resolves_against_page_url() {
        let html = r#"<a href="docs/scope.doc">Scope</a>"#;
        let links = classify_attachments(
            html,
            Some("https://www.nyscr.ny.gov/ads/view.cfm"),
            &origin(),
            &AttachmentRules::default(),
        );
        assert_eq!(links[0].url, "https://www.nyscr.ny.gov/ads/docs/scope.doc");
    }

    #[test]
    fn query_string_does_not_hide_extension() {
        let html = r#"<a href="https://a.gov/files/bid.pdf?version=2">Bid</a>"#;
        assert_eq!(classify(html).len(), 1);
    }

    #[test]
    fn filename_prefix_convention() {
        let rules = AttachmentRules {
            filename_prefixes: vec!["GetAttachment".into()],
            ..AttachmentRules::default()
        };
        let html = r#"<a href="/app/getattachment?id=991">Q&amp;A</a>"#;
        let links = classify_attachments(html, None, &origin(), &rules);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].name, "Q&A");
        assert_eq!(links[0].url, "https://caleprocure.ca.gov/app/getattachment?id=991");
    }

    #[test]
    fn empty_anchor_text_gets_placeholder() {
        let html = r#"<a href="https://a.gov/x.pdf"><img src="icon.png"></a>"#;
        assert_eq!(classify(html)[0].name, "Attachment");
    }

    #[test]
    fn duplicates_are_kept() {
        let html = r#"<a href="https://a.gov/x.pdf">X</a><a href="https://a.gov/x.pdf">X</a>"#;
        assert_eq!(classify(html).len(), 2);
    }

    #[test]
    fn empty_html_yields_nothing() {
        assert!(classify("").is_empty());
    }
}
