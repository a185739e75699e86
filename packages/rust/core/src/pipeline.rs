//! Scrape pipelines: render a page through a session, run the site's
//! extractor, and package the result with the session's cookies.
//!
//! Any session failure aborts the request; nothing partial is returned once
//! navigation has failed. Extraction problems are never failures here, they
//! travel as diagnostics on the payload.

use tracing::{info, instrument, warn};
use url::Url;

use tenderlens_extract::{extract_detail, extract_listing};
use tenderlens_session::PageSession;
use tenderlens_shared::{Diagnostic, Result, SiteSchema, TenderlensError};

use crate::envelope::{CookiePayload, DetailPayload, ListingPayload};

/// Start offset used when a listing page is requested without one.
pub const DEFAULT_STARTNUM: u32 = 121;

/// Placeholder in `listing_url` templates.
const STARTNUM_PLACEHOLDER: &str = "{startnum}";

/// Build the listing URL for `site` at `startnum` (default [`DEFAULT_STARTNUM`]).
pub fn listing_url(site: &SiteSchema, startnum: Option<u32>) -> Result<Url> {
    let template = site.listing_url.as_deref().ok_or_else(|| {
        TenderlensError::validation(format!("site '{}' has no listing URL", site.id))
    })?;
    let startnum = startnum.unwrap_or(DEFAULT_STARTNUM).to_string();
    let raw = template.replace(STARTNUM_PLACEHOLDER, &startnum);

    Url::parse(&raw)
        .map_err(|e| TenderlensError::parse(format!("site '{}': invalid listing URL '{raw}': {e}", site.id)))
}

/// Render a listing page and extract its records.
#[instrument(skip_all, fields(site = %site.id, url = %url))]
pub async fn scrape_listing<S: PageSession>(
    session: &mut S,
    site: &SiteSchema,
    url: &Url,
) -> Result<ListingPayload> {
    let strategy = site.listing.as_ref().ok_or_else(|| {
        TenderlensError::validation(format!("site '{}' declares no listing strategy", site.id))
    })?;

    let page = session.render(url).await?;
    info!(text_len = page.text.len(), "page rendered");

    let extraction = extract_listing(&page, strategy);
    report(&extraction.diagnostics);
    let cookies = session.cookies()?;

    info!(
        records = extraction.records.len(),
        diagnostics = extraction.diagnostics.len(),
        cookies = cookies.len(),
        "listing scraped"
    );

    Ok(ListingPayload {
        url: page.url.unwrap_or_else(|| url.to_string()),
        site: site.id.clone(),
        total_records: extraction.records.len(),
        records: extraction.records,
        diagnostics: extraction.diagnostics,
        cookies: cookies.header_string(),
    })
}

/// Render a detail page and extract its record and attachments.
#[instrument(skip_all, fields(site = %site.id, url = %url))]
pub async fn scrape_detail<S: PageSession>(
    session: &mut S,
    site: &SiteSchema,
    url: &Url,
) -> Result<DetailPayload> {
    let detail = site.detail.as_ref().ok_or_else(|| {
        TenderlensError::validation(format!("site '{}' declares no detail schema", site.id))
    })?;
    let origin = site.origin_url()?;

    let page = session.render(url).await?;
    info!(text_len = page.text.len(), "page rendered");

    let extraction = extract_detail(&page, detail, &origin, &site.attachments);
    report(&extraction.diagnostics);
    let cookies = session.cookies()?;

    info!(
        attachments = extraction.attachments.len(),
        diagnostics = extraction.diagnostics.len(),
        "detail scraped"
    );

    Ok(DetailPayload {
        url: page.url.unwrap_or_else(|| url.to_string()),
        site: site.id.clone(),
        record: extraction.record,
        attachments: extraction.attachments,
        diagnostics: extraction.diagnostics,
        cookies: cookies.header_string(),
    })
}

/// Visit the site's cookie page (or its origin) and return the session cookies.
#[instrument(skip_all, fields(site = %site.id))]
pub async fn harvest_cookies<S: PageSession>(
    session: &mut S,
    site: &SiteSchema,
) -> Result<CookiePayload> {
    let url = match &site.cookie_url {
        Some(raw) => Url::parse(raw).map_err(|e| {
            TenderlensError::parse(format!("site '{}': invalid cookie URL '{raw}': {e}", site.id))
        })?,
        None => site.origin_url()?,
    };

    session.render(&url).await?;
    let cookies = session.cookies()?;
    info!(url = %url, count = cookies.len(), "cookies harvested");

    Ok(CookiePayload {
        cookie_string: cookies.header_string(),
        cookie_count: cookies.len(),
        cookies: cookies.to_map(),
    })
}

fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        warn!(%diagnostic, "extraction diagnostic");
    }
}
