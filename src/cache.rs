//! Rendered-page cache for the public site.
//!
//! Public pages embed resolved SEO metadata in their `<head>`. Rendering needs
//! a store read, so the server keeps the rendered HTML per path and serves it
//! until the path is invalidated. Invalidation is the only way an entry
//! leaves the cache: there is no TTL here, and the revalidation dispatcher is
//! responsible for evicting exactly the paths a save affects.
//!
//! # Design
//!
//! - Keys are site-relative paths, normalized so `/faqs` and `/faqs/` share
//!   one entry.
//! - Each entry carries a SHA-256 of its HTML, served as a strong `ETag`.
//!   Two renders of identical metadata produce the same tag, so clients keep
//!   their copy across a no-op save.
//! - Invalidating a path that is not cached is a no-op. Invalidation is
//!   idempotent and safe to call redundantly.
//! - Every invalidation bumps a per-path generation. A render started before
//!   an invalidation carries the old generation and is refused by
//!   [`PageCache::insert_if_generation`], so a slow render of pre-save data
//!   can never land in the cache after the save evicted it.

use crate::revalidate::{CacheInvalidator, InvalidationError};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// A rendered page held in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    pub html: Arc<str>,
    /// Quoted SHA-256 hex of `html`, ready for an `ETag` header.
    pub etag: String,
}

impl CachedPage {
    pub fn new(html: impl Into<Arc<str>>) -> Self {
        let html = html.into();
        let etag = format!("\"{}\"", hash_html(&html));
        Self { html, etag }
    }
}

/// SHA-256 of rendered HTML, returned as a hex string.
pub fn hash_html(html: &str) -> String {
    let digest = Sha256::digest(html.as_bytes());
    format!("{:x}", digest)
}

/// Collapse `/faqs/` and `/faqs` to one key. The root stays `/`.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    match path.trim_end_matches('/') {
        "" => "/".to_string(),
        p if p.starts_with('/') => p.to_string(),
        p => format!("/{p}"),
    }
}

#[derive(Debug, Default)]
struct Entries {
    pages: HashMap<String, CachedPage>,
    generations: HashMap<String, u64>,
}

impl Entries {
    fn generation(&self, key: &str) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }
}

/// In-memory rendered-page cache keyed by path.
#[derive(Debug, Default)]
pub struct PageCache {
    entries: RwLock<Entries>,
    hits: AtomicU32,
    misses: AtomicU32,
    invalidations: AtomicU32,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached page for `path`, counting a hit or a miss.
    pub async fn get(&self, path: &str) -> Option<CachedPage> {
        let found = self
            .entries
            .read()
            .await
            .pages
            .get(&normalize_path(path))
            .cloned();
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Current invalidation generation of `path`. Read it before rendering
    /// and hand it back to [`insert_if_generation`](Self::insert_if_generation).
    pub async fn generation(&self, path: &str) -> u64 {
        self.entries.read().await.generation(&normalize_path(path))
    }

    /// Store rendered HTML for `path` unless the path was invalidated since
    /// `generation` was read. Returns `None` when the render is stale.
    pub async fn insert_if_generation(
        &self,
        path: &str,
        generation: u64,
        html: impl Into<Arc<str>>,
    ) -> Option<CachedPage> {
        let key = normalize_path(path);
        let mut entries = self.entries.write().await;
        if entries.generation(&key) != generation {
            debug!(path = %key, "render outdated by invalidation, not cached");
            return None;
        }
        let page = CachedPage::new(html);
        entries.pages.insert(key, page.clone());
        Some(page)
    }

    /// Whether `path` currently has a cached rendering.
    pub async fn contains(&self, path: &str) -> bool {
        self.entries
            .read()
            .await
            .pages
            .contains_key(&normalize_path(path))
    }

    /// Drop `path` and bump its generation. Returns whether an entry was
    /// removed.
    pub async fn remove(&self, path: &str) -> bool {
        let key = normalize_path(path);
        let mut entries = self.entries.write().await;
        *entries.generations.entry(key.clone()).or_insert(0) += 1;
        let removed = entries.pages.remove(&key).is_some();
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.pages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.pages.is_empty()
    }

    /// Snapshot of hit/miss/invalidation counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

impl CacheInvalidator for PageCache {
    async fn invalidate(&self, path: &str) -> Result<(), InvalidationError> {
        let removed = self.remove(path).await;
        debug!(path, removed, "page cache invalidated");
        Ok(())
    }
}

/// Summary of cache activity since startup.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    pub invalidations: u32,
}

impl CacheStats {
    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} rendered ({} total), {} invalidated",
                self.hits,
                self.misses,
                self.total(),
                self.invalidations
            )
        } else {
            write!(
                f,
                "{} rendered, {} invalidated",
                self.misses, self.invalidations
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Path normalization
    // =========================================================================

    #[test]
    fn normalize_path_variants() {
        assert_eq!(normalize_path("/faqs/"), "/faqs");
        assert_eq!(normalize_path("/faqs"), "/faqs");
        assert_eq!(normalize_path("faqs"), "/faqs");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/blog?page=2"), "/blog");
    }

    // =========================================================================
    // PageCache
    // =========================================================================

    async fn fill(cache: &PageCache, path: &str, html: &str) -> CachedPage {
        let generation = cache.generation(path).await;
        cache
            .insert_if_generation(path, generation, html)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn insert_then_get_hits() {
        let cache = PageCache::new();
        fill(&cache, "/faqs", "<html></html>").await;
        let page = cache.get("/faqs/").await.unwrap();
        assert_eq!(&*page.html, "<html></html>");
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn get_missing_counts_miss() {
        let cache = PageCache::new();
        assert!(cache.get("/team").await.is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn invalidate_removes_only_that_path() {
        let cache = PageCache::new();
        fill(&cache, "/faqs", "a").await;
        fill(&cache, "/team", "b").await;

        cache.invalidate("/faqs").await.unwrap();

        assert!(!cache.contains("/faqs").await);
        assert!(cache.contains("/team").await);
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[tokio::test]
    async fn invalidate_is_idempotent() {
        let cache = PageCache::new();
        fill(&cache, "/", "home").await;
        cache.invalidate("/").await.unwrap();
        cache.invalidate("/").await.unwrap();
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn render_started_before_invalidation_is_not_cached() {
        let cache = PageCache::new();
        let generation = cache.generation("/faqs").await;

        cache.invalidate("/faqs/").await.unwrap();

        assert!(
            cache
                .insert_if_generation("/faqs", generation, "old")
                .await
                .is_none()
        );
        assert!(!cache.contains("/faqs").await);

        let fresh = cache.generation("/faqs").await;
        assert_eq!(fresh, generation + 1);
        assert!(
            cache
                .insert_if_generation("/faqs", fresh, "new")
                .await
                .is_some()
        );
    }

    #[tokio::test]
    async fn invalidation_only_bumps_its_own_path() {
        let cache = PageCache::new();
        let team = cache.generation("/team").await;
        cache.invalidate("/faqs").await.unwrap();
        assert!(cache.insert_if_generation("/team", team, "t").await.is_some());
    }

    // =========================================================================
    // ETags
    // =========================================================================

    #[test]
    fn etag_is_quoted_sha256() {
        let page = CachedPage::new("hello");
        assert_eq!(page.etag.len(), 66);
        assert!(page.etag.starts_with('"') && page.etag.ends_with('"'));
    }

    #[test]
    fn etag_is_deterministic_and_content_sensitive() {
        assert_eq!(CachedPage::new("x").etag, CachedPage::new("x").etag);
        assert_ne!(CachedPage::new("x").etag, CachedPage::new("y").etag);
    }

    // =========================================================================
    // CacheStats
    // =========================================================================

    #[test]
    fn cache_stats_display_with_hits() {
        let s = CacheStats {
            hits: 5,
            misses: 2,
            invalidations: 1,
        };
        assert_eq!(format!("{}", s), "5 cached, 2 rendered (7 total), 1 invalidated");
    }

    #[test]
    fn cache_stats_display_no_hits() {
        let s = CacheStats {
            hits: 0,
            misses: 3,
            invalidations: 0,
        };
        assert_eq!(format!("{}", s), "3 rendered, 0 invalidated");
    }
}
