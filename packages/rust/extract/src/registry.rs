//! Site schema registry: built-in portals plus user-declared ones.

use serde::Deserialize;
use tenderlens_shared::{Result, SiteSchema, TenderlensError};
use tracing::debug;

/// Embedded schema document for the portals tenderlens ships with.
const BUILTIN_SITES: &str = include_str!("../sites/builtin.toml");

#[derive(Deserialize)]
struct SiteDocument {
    #[serde(default)]
    sites: Vec<SiteSchema>,
}

/// Holds site schemas in registration order.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    sites: Vec<SiteSchema>,
}

impl SiteRegistry {
    /// Registry with only the built-in sites.
    pub fn builtin() -> Result<Self> {
        let doc: SiteDocument = toml::from_str(BUILTIN_SITES)
            .map_err(|e| TenderlensError::parse(format!("built-in site schemas: {e}")))?;
        let mut registry = Self { sites: Vec::new() };
        for site in doc.sites {
            registry.register(site)?;
        }
        Ok(registry)
    }

    /// Built-in sites, then `overrides` (replacing built-ins with the same id).
    pub fn with_overrides(overrides: impl IntoIterator<Item = SiteSchema>) -> Result<Self> {
        let mut registry = Self::builtin()?;
        for site in overrides {
            registry.register(site)?;
        }
        Ok(registry)
    }

    /// Validate and add a site, replacing any existing site with the same id.
    pub fn register(&mut self, site: SiteSchema) -> Result<()> {
        site.validate()?;
        match self.sites.iter_mut().find(|s| s.id == site.id) {
            Some(existing) => {
                debug!(site = %site.id, "replacing site schema");
                *existing = site;
            }
            None => {
                debug!(site = %site.id, "registering site schema");
                self.sites.push(site);
            }
        }
        Ok(())
    }

    /// Look up a site by id.
    pub fn get(&self, id: &str) -> Result<&SiteSchema> {
        self.sites
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| TenderlensError::UnknownSite(id.to_string()))
    }

    /// All registered sites.
    pub fn iter(&self) -> impl Iterator<Item = &SiteSchema> {
        self.sites.iter()
    }
}
