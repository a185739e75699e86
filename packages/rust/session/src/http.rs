//! HTTP page session backed by `reqwest` with a per-session cookie jar.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, instrument};
use url::Url;

use tenderlens_shared::{RawPageContent, Result, SessionConfig, TenderlensError};

use crate::text::render_text;
use crate::{Cookies, PageSession};

/// One fresh client and cookie jar per session; nothing is pooled across requests.
pub struct HttpSession {
    client: Client,
    jar: Arc<Jar>,
    settle: Duration,
    current: Option<Url>,
}

impl HttpSession {
    /// Create a session using the launch settings in `config` and the given
    /// settle delay (usually [`SessionConfig::settle_for`] a site).
    pub fn new(config: &SessionConfig, settle: Duration) -> Result<Self> {
        let jar = Arc::new(Jar::default());

        let mut headers = HeaderMap::new();
        headers.insert(
            "viewport-width",
            HeaderValue::from(config.viewport_width),
        );
        headers.insert(
            "sec-ch-viewport-height",
            HeaderValue::from(config.viewport_height),
        );

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .cookie_provider(jar.clone())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(config.timeout())
            .build()
            .map_err(|e| TenderlensError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            jar,
            settle,
            current: None,
        })
    }

    /// URL of the last rendered page, after redirects.
    pub fn current_url(&self) -> Option<&Url> {
        self.current.as_ref()
    }
}

impl PageSession for HttpSession {
    #[instrument(skip_all, fields(url = %url))]
    async fn render(&mut self, url: &Url) -> Result<RawPageContent> {
        debug!("navigating");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| TenderlensError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TenderlensError::Network(format!("{url}: HTTP {status}")));
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| TenderlensError::Network(format!("{url}: body read failed: {e}")))?;

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let text = render_text(&html);
        debug!(
            status = status.as_u16(),
            html_len = html.len(),
            text_len = text.len(),
            "page settled"
        );

        let page = RawPageContent::new(text, html).with_url(final_url.as_str());
        self.current = Some(final_url);
        Ok(page)
    }

    fn cookies(&self) -> Result<Cookies> {
        let Some(url) = &self.current else {
            return Ok(Cookies::default());
        };
        let cookies = match self.jar.cookies(url) {
            Some(header) => {
                let header = header.to_str().map_err(|e| {
                    TenderlensError::Network(format!("unreadable cookie header: {e}"))
                })?;
                Cookies::parse_header(header).sorted()
            }
            None => Cookies::default(),
        };
        debug!(count = cookies.len(), "cookies read");
        Ok(cookies)
    }
}
