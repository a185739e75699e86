//! Page sessions: navigate to a portal page and hand back its rendered content.
//!
//! The extraction engine never performs I/O. Everything that suspends
//! (navigation, the settle delay, cookie retrieval) lives behind the
//! [`PageSession`] trait so pipelines can run against a real HTTP session or a
//! synthetic one in tests.

pub mod http;
pub mod text;

use std::collections::BTreeMap;
use std::future::Future;

use tenderlens_shared::{RawPageContent, Result};
use url::Url;

pub use http::HttpSession;
pub use text::render_text;

// ---------------------------------------------------------------------------
// PageSession
// ---------------------------------------------------------------------------

/// A browsing session bound to one request.
///
/// Implementations keep their own cookie state across `render` calls. A
/// session is never shared between requests.
pub trait PageSession {
    /// Navigate to `url`, wait for the page to settle and return its content.
    fn render(&mut self, url: &Url) -> impl Future<Output = Result<RawPageContent>> + Send;

    /// Cookies the session currently holds for the last rendered page.
    fn cookies(&self) -> Result<Cookies>;
}

// ---------------------------------------------------------------------------
// Cookies
// ---------------------------------------------------------------------------

/// Cookie name/value pairs. Sessions report them sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookies(Vec<(String, String)>);

impl Cookies {
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    /// Parse a `Cookie` request header (`a=1; b=2`).
    pub fn parse_header(header: &str) -> Self {
        let pairs = header
            .split(';')
            .filter_map(|part| {
                let part = part.trim();
                if part.is_empty() {
                    return None;
                }
                let (name, value) = part.split_once('=').unwrap_or((part, ""));
                Some((name.trim().to_string(), value.trim().to_string()))
            })
            .collect();
        Self(pairs)
    }

    /// Sort by name, keeping the relative order of duplicates.
    pub fn sorted(mut self) -> Self {
        self.0.sort_by(|a, b| a.0.cmp(&b.0));
        self
    }

    /// `name=value` pairs joined by `;`.
    pub fn header_string(&self) -> String {
        self.0
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Name to value; later duplicates win.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.0.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip_keeps_order() {
        let cookies = Cookies::parse_header("ASP.NET_SessionId=abc123; zeta=1; alpha=2");
        let names: Vec<&str> = cookies.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["ASP.NET_SessionId", "zeta", "alpha"]);
        assert_eq!(cookies.header_string(), "ASP.NET_SessionId=abc123;zeta=1;alpha=2");
    }

    #[test]
    fn sorted_orders_by_name() {
        let cookies = Cookies::parse_header("visitor=42; ASP.NET_SessionId=abc; alpha=1").sorted();
        assert_eq!(cookies.header_string(), "ASP.NET_SessionId=abc;alpha=1;visitor=42");
    }

    #[test]
    fn values_may_contain_equals() {
        let cookies = Cookies::parse_header("token=a=b==");
        assert_eq!(cookies.to_map().get("token").map(String::as_str), Some("a=b=="));
    }

    #[test]
    fn empty_header_is_empty() {
        let cookies = Cookies::parse_header("  ");
        assert!(cookies.is_empty());
        assert_eq!(cookies.header_string(), "");
        assert_eq!(cookies.len(), 0);
    }
}
