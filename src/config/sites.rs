// src/config/sites.rs
//
// Crawl targets per region, loaded from a TOML file:
//
//   [[site]]
//   region = "Berlin"
//   target_urls = ["https://www.awoberlin.de/wer-wir-sind/awo-in-berlin/"]
//   base_url = "https://www.awoberlin.de/impressum/"
//   page_with_contacts = true

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(rename = "site", default)]
    pub sites: Vec<SiteEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteEntry {
    pub region: String,
    #[serde(default)]
    pub target_urls: Vec<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Overview pages that mostly link to branch pages.
    #[serde(default)]
    pub page_with_links: bool,
    /// Pages that carry contact details directly.
    #[serde(default)]
    pub page_with_contacts: bool,
    /// Container class holding the useful part of the page (sitemaps).
    #[serde(default)]
    pub page_attribute: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Links,
    Contacts,
    PageAttribute,
}

impl SiteEntry {
    pub fn has(&self, cap: Capability) -> bool {
        match cap {
            Capability::Links => self.page_with_links,
            Capability::Contacts => self.page_with_contacts,
            Capability::PageAttribute => self.page_attribute.is_some(),
        }
    }

    /// Trimmed target URLs, blanks dropped.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.target_urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty())
    }
}

/// One page to crawl.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageTarget {
    pub region: String,
    pub url: String,
    pub capability: Capability,
    pub page_attribute: Option<String>,
}

impl SiteConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let cfg: SiteConfig =
            toml::from_str(&text).map_err(|source| Error::Toml { path: path.to_path_buf(), source })?;
        if cfg.sites.is_empty() {
            return Err(Error::config(format!("{}: no [[site]] entries", path.display())));
        }
        Ok(cfg)
    }

    /// Crawl list: link pages, then contact pages, then attribute pages.
    /// A URL listed under several capabilities is fetched once per capability.
    pub fn targets(&self) -> Vec<PageTarget> {
        let mut out = Vec::new();
        for cap in [Capability::Links, Capability::Contacts, Capability::PageAttribute] {
            for site in self.sites.iter().filter(|s| s.has(cap)) {
                for url in site.urls() {
                    out.push(PageTarget {
                        region: site.region.clone(),
                        url: s!(url),
                        capability: cap,
                        page_attribute: site.page_attribute.clone(),
                    });
                }
            }
        }
        out
    }
}
