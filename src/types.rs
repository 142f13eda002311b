//! Shared types used across the resolver, the store, and the admin surfaces.
//!
//! [`SeoPageConfig`] is compiled in (see [`crate::pages`]), [`SeoEntry`] is what
//! the store persists, and [`EffectiveSeoPage`] / [`AdminRow`] are derived on
//! every read and never written back.

use serde::{Deserialize, Serialize};

/// Static SEO configuration for one public page.
///
/// Defaults here are the floor values: an [`EffectiveSeoPage`] built from
/// this config can never end up with an empty title or description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoPageConfig {
    /// Storage and lookup key.
    pub slug: &'static str,
    /// Site-relative URL of the page (`/about-us`).
    pub path: &'static str,
    /// Display name in the admin listing.
    pub label: &'static str,
    pub default_title: &'static str,
    pub default_description: &'static str,
    pub default_keywords: Option<&'static str>,
    /// Extra cached paths that embed this page's metadata and must be
    /// invalidated alongside `path`.
    pub revalidate_paths: &'static [&'static str],
}

/// A stored override for one page.
///
/// Every field is optional: a missing field means "use the config default"
/// for that field only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoEntry {
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// Unix seconds of the last save, stamped by the store.
    #[serde(default)]
    pub updated_at: u64,
}

impl SeoEntry {
    /// An entry carrying only a slug. Resolves to pure defaults.
    pub fn empty(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            meta_title: None,
            meta_description: None,
            keywords: None,
            updated_at: 0,
        }
    }
}

/// The merged result of a page's defaults and its stored override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveSeoPage {
    pub slug: String,
    pub path: String,
    pub title: String,
    pub description: String,
    /// Raw keyword string as resolved (stored or default), before splitting.
    pub keywords: Option<String>,
    /// `keywords` split on commas, trimmed, empties dropped.
    pub keyword_tokens: Vec<String>,
}

/// One row of the admin SEO listing.
///
/// Carries the page config for placeholder display next to the effective
/// values the editor starts from. `keywords` is empty when none resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRow {
    #[serde(flatten)]
    pub page: SeoPageConfig,
    pub meta_title: String,
    pub meta_description: String,
    pub keywords: String,
}

impl AdminRow {
    pub fn slug(&self) -> &'static str {
        self.page.slug
    }
}
