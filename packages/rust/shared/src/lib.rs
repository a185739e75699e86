//! Shared types, error model, site schemas, and configuration for tenderlens.
//!
//! This crate is the foundation depended on by all other tenderlens crates.
//! It provides:
//! - [`TenderlensError`]: the unified error type
//! - Domain types ([`RawPageContent`], [`Record`], [`AttachmentLink`], [`Diagnostic`])
//! - Declarative site schemas ([`SiteSchema`], [`ListingStrategy`], [`FieldSchema`])
//! - Configuration ([`AppConfig`], [`SessionConfig`], config loading)

pub mod config;
pub mod error;
pub mod schema;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, SessionConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{Result, TenderlensError};
pub use schema::{
    AttachmentRules, DetailSchema, FieldSchema, FieldSpec, ListingStrategy, SiteSchema,
};
pub use types::{
    AttachmentLink, DetailExtraction, Diagnostic, Extraction, RawPageContent, Record,
};
