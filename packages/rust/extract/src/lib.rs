//! Extraction and correlation engine for rendered procurement portal pages.
//!
//! This crate provides:
//! - [`fields`]: every occurrence of every labeled field, in document order
//! - [`correlate`]: positional join of field occurrences into records
//! - [`segment`]: delimiter-bounded block layouts with title lookback
//! - [`attachments`]: document link classification for detail pages
//! - [`strategy`]: dispatch from a site's declared strategy to an extractor
//! - [`SiteRegistry`]: built-in and user-declared site schemas
//!
//! Everything here is synchronous and pure: text/HTML in, records out.

pub mod attachments;
pub mod correlate;
pub mod fields;
mod patterns;
pub mod registry;
pub mod segment;
pub mod strategy;

pub use attachments::classify_attachments;
pub use correlate::{correlate, record_count, validate_alignment};
pub use fields::{FieldScanner, Occurrences, extract_occurrences};
pub use registry::SiteRegistry;
pub use segment::{Block, segment, split_blocks};
pub use strategy::{
    DetailExtractor, ListingExtractor, extract_detail, extract_listing, extract_positional,
};
