//! SEO metadata resolution.
//!
//! Every page has two independent sources for each metadata field:
//!
//! - **Stored override**: what an admin saved for the slug, if anything.
//! - **Config default**: the compiled-in value from [`crate::pages`].
//!
//! ## Resolution priority
//!
//! Each field is resolved independently. A stored title with no stored
//! description yields the stored title and the *default* description:
//!
//! - **Title**: stored `meta_title` → `default_title`
//! - **Description**: stored `meta_description` → `default_description`
//! - **Keywords**: stored `keywords` → `default_keywords` → none
//!
//! Blank stored titles and descriptions fall through to the default, which
//! keeps the floor invariant: an [`EffectiveSeoPage`] never has an empty
//! title or description. Keywords use plain presence: a stored empty string
//! means "no keywords" and suppresses the default.
//!
//! ## Failure modes
//!
//! A slug without a config entry is [`ResolveError::ConfigNotFound`]. A store
//! read failure is *not* an error here: public rendering must never fail
//! because SEO storage is down, so the resolver logs it and resolves as if no
//! override existed.

use crate::config::SiteConfig;
use crate::pages::{self, PAGES};
use crate::store::{SeoStore, StoreError};
use crate::types::{AdminRow, EffectiveSeoPage, SeoEntry, SeoPageConfig};
use crate::url;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no SEO config for slug '{0}'")]
    ConfigNotFound(String),
}

/// First source that is present, even if empty (`a ?? b ?? c`).
pub fn first_present<'a>(sources: &[Option<&'a str>]) -> Option<&'a str> {
    sources.iter().copied().flatten().next()
}

/// First source that is present and not blank (`a || b || c`).
///
/// The returned value is not trimmed: what was stored is what is served.
pub fn first_non_blank<'a>(sources: &[Option<&'a str>]) -> Option<&'a str> {
    sources
        .iter()
        .copied()
        .flatten()
        .find(|s| !s.trim().is_empty())
}

/// Split a comma-separated keyword string into trimmed, non-empty tokens.
///
/// `"a, b,  c"` → `["a", "b", "c"]`; `""` or `None` → `[]`.
pub fn split_keywords(keywords: Option<&str>) -> Vec<String> {
    keywords
        .map(|k| {
            k.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Merge one page config with its optional stored entry.
pub fn merge(config: &SeoPageConfig, entry: Option<&SeoEntry>) -> EffectiveSeoPage {
    let stored_title = entry.and_then(|e| e.meta_title.as_deref());
    let stored_description = entry.and_then(|e| e.meta_description.as_deref());
    let stored_keywords = entry.and_then(|e| e.keywords.as_deref());

    let title = first_non_blank(&[stored_title]).unwrap_or(config.default_title);
    let description =
        first_non_blank(&[stored_description]).unwrap_or(config.default_description);
    let keywords = first_present(&[stored_keywords, config.default_keywords]);

    EffectiveSeoPage {
        slug: config.slug.to_string(),
        path: config.path.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        keywords: keywords.map(String::from),
        keyword_tokens: split_keywords(keywords),
    }
}

/// Build the admin listing row for one page.
pub fn admin_row(config: &SeoPageConfig, entry: Option<&SeoEntry>) -> AdminRow {
    let effective = merge(config, entry);
    AdminRow {
        page: *config,
        meta_title: effective.title,
        meta_description: effective.description,
        keywords: effective.keywords.unwrap_or_default(),
    }
}

/// A resolved page and whether it was built without the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub page: EffectiveSeoPage,
    pub degraded: bool,
}

/// Resolves effective metadata from the page table and a store.
#[derive(Debug)]
pub struct SeoResolver<S> {
    store: Arc<S>,
    pages: &'static [SeoPageConfig],
    base_url: String,
    site_name: String,
}

impl<S: SeoStore> SeoResolver<S> {
    /// Resolver over the compiled-in page table.
    pub fn new(store: Arc<S>, config: &SiteConfig) -> Self {
        Self {
            store,
            pages: PAGES,
            base_url: config.base_url().to_string(),
            site_name: config.site.name.clone(),
        }
    }

    /// Swap the page table (tests, alternate sites).
    pub fn with_pages(mut self, pages: &'static [SeoPageConfig]) -> Self {
        self.pages = pages;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn pages(&self) -> &'static [SeoPageConfig] {
        self.pages
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    /// Look up a page config by slug.
    pub fn page(&self, slug: &str) -> Result<&'static SeoPageConfig, ResolveError> {
        pages::find_by_slug(self.pages, slug)
            .ok_or_else(|| ResolveError::ConfigNotFound(slug.to_string()))
    }

    /// Effective metadata for one page.
    ///
    /// Fails only when the slug is not configured. Store errors degrade to
    /// defaults.
    pub async fn resolve(&self, slug: &str) -> Result<EffectiveSeoPage, ResolveError> {
        self.resolve_with_status(slug).await.map(|r| r.page)
    }

    /// Like [`resolve`](Self::resolve), but reports whether the store read
    /// failed and defaults stood in for stored values.
    pub async fn resolve_with_status(&self, slug: &str) -> Result<Resolution, ResolveError> {
        let config = self.page(slug)?;
        let (entry, degraded) = match self.store.fetch_one(slug).await {
            Ok(entry) => (entry, false),
            Err(e) => {
                warn!(slug, error = %e, "SEO store read failed, using defaults");
                (None, true)
            }
        };
        Ok(Resolution {
            page: merge(config, entry.as_ref()),
            degraded,
        })
    }

    /// One row per configured page, in declaration order.
    ///
    /// Unlike [`resolve`](Self::resolve), a failed wholesale fetch is returned
    /// so the admin view can show an error state.
    pub async fn list_all(&self) -> Result<Vec<AdminRow>, StoreError> {
        let entries = self.store.fetch_all().await?;
        let by_slug: HashMap<&str, &SeoEntry> =
            entries.iter().map(|e| (e.slug.as_str(), e)).collect();
        Ok(self
            .pages
            .iter()
            .map(|page| admin_row(page, by_slug.get(page.slug).copied()))
            .collect())
    }

    /// The listing as it would look with no stored overrides.
    pub fn default_rows(&self) -> Vec<AdminRow> {
        self.pages.iter().map(|page| admin_row(page, None)).collect()
    }

    /// `base_url + path` for a configured slug.
    pub fn canonical_url(&self, slug: &str) -> Result<String, ResolveError> {
        Ok(url::join(&self.base_url, self.page(slug)?.path))
    }
}
