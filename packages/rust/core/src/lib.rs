//! Scrape orchestration for tenderlens.
//!
//! This crate ties a [`PageSession`](tenderlens_session::PageSession) to the
//! extraction engine and wraps results in the JSON envelopes the CLI prints.

pub mod envelope;
pub mod pipeline;

pub use envelope::{CookiePayload, DetailPayload, Envelope, ErrorEnvelope, ListingPayload};
pub use pipeline::{DEFAULT_STARTNUM, harvest_cookies, listing_url, scrape_detail, scrape_listing};
