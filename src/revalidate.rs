//! Cache revalidation after SEO edits.
//!
//! A save is authoritative the moment the store accepts it. Revalidation is
//! best-effort cleanup on top: it evicts the cached rendering of the edited
//! page (plus any extra paths its config lists) and, unconditionally, the
//! admin listing. Failures are logged and reported to the caller, who must
//! not roll the save back; a stale page heals on its next natural
//! invalidation.
//!
//! The admin listing is invalidated even when the slug has no config entry,
//! so an edit is always visible in the admin view immediately.

use crate::pages::{self, ADMIN_SEO_PATH, PAGES};
use crate::types::SeoPageConfig;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// A single path could not be invalidated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to invalidate {path}: {reason}")]
pub struct InvalidationError {
    pub path: String,
    pub reason: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RevalidateError {
    /// The slug has no page config, so its public path is unknown. The admin
    /// listing was still invalidated.
    #[error("no page path for slug '{0}'")]
    UnknownSlug(String),
    #[error(transparent)]
    Invalidation(#[from] InvalidationError),
}

/// Evicts cached renderings by path. Must be idempotent.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, path: &str) -> impl Future<Output = Result<(), InvalidationError>> + Send;
}

/// Maps slugs to the cached paths their metadata appears on.
#[derive(Debug)]
pub struct RevalidationDispatcher<C> {
    cache: Arc<C>,
    pages: &'static [SeoPageConfig],
}

impl<C: CacheInvalidator> RevalidationDispatcher<C> {
    pub fn new(cache: Arc<C>) -> Self {
        Self { cache, pages: PAGES }
    }

    /// Swap the page table (tests, alternate sites).
    pub fn with_pages(mut self, pages: &'static [SeoPageConfig]) -> Self {
        self.pages = pages;
        self
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// The paths a save to `slug` makes stale, admin listing last.
    ///
    /// An unknown slug still yields the admin listing.
    pub fn paths_for_slug(&self, slug: &str) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if let Some(page) = pages::find_by_slug(self.pages, slug) {
            paths.push(page.path);
            paths.extend(page.revalidate_paths.iter().copied());
        }
        paths.push(ADMIN_SEO_PATH);
        paths
    }

    /// Invalidate everything a save to `slug` affects.
    ///
    /// Every path is attempted even if an earlier one fails; the first error
    /// is returned.
    pub async fn invalidate_for_slug(&self, slug: &str) -> Result<(), RevalidateError> {
        let mut first_error = None;
        if pages::find_by_slug(self.pages, slug).is_none() {
            warn!(slug, "no page config, only the admin listing is revalidated");
            first_error = Some(RevalidateError::UnknownSlug(slug.to_string()));
        }

        for path in self.paths_for_slug(slug) {
            if let Err(e) = self.cache.invalidate(path).await {
                warn!(slug, path, error = %e, "revalidation failed");
                first_error.get_or_insert(e.into());
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Invalidate every configured page and the admin listing.
    ///
    /// Returns the number of paths invalidated.
    pub async fn revalidate_all(&self) -> Result<usize, RevalidateError> {
        let mut paths: Vec<&'static str> = Vec::new();
        for page in self.pages {
            paths.push(page.path);
            paths.extend(page.revalidate_paths.iter().copied());
        }
        paths.push(ADMIN_SEO_PATH);
        paths.dedup();

        let mut first_error = None;
        let mut done = 0;
        for path in &paths {
            match self.cache.invalidate(path).await {
                Ok(()) => done += 1,
                Err(e) => {
                    warn!(path, error = %e, "revalidation failed");
                    first_error.get_or_insert(RevalidateError::from(e));
                }
            }
        }
        info!(count = done, "revalidated all pages");

        match first_error {
            Some(e) => Err(e),
            None => Ok(done),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn paths_for_known_slug() {
        let dispatcher = RevalidationDispatcher::new(Arc::new(RecordingInvalidator::default()))
            .with_pages(TEST_PAGES);
        assert_eq!(
            dispatcher.paths_for_slug("beta"),
            vec!["/beta", "/beta/feed", ADMIN_SEO_PATH]
        );
    }

    #[test]
    fn paths_for_unknown_slug_is_admin_only() {
        let dispatcher = RevalidationDispatcher::new(Arc::new(RecordingInvalidator::default()))
            .with_pages(TEST_PAGES);
        assert_eq!(dispatcher.paths_for_slug("ghost"), vec![ADMIN_SEO_PATH]);
    }

    #[tokio::test]
    async fn invalidate_for_slug_hits_page_and_admin() {
        let recorder = Arc::new(RecordingInvalidator::default());
        let dispatcher = RevalidationDispatcher::new(Arc::clone(&recorder)).with_pages(TEST_PAGES);

        dispatcher.invalidate_for_slug("alpha").await.unwrap();

        assert_eq!(recorder.paths(), vec!["/alpha", ADMIN_SEO_PATH]);
    }

    #[tokio::test]
    async fn unknown_slug_still_invalidates_admin() {
        let recorder = Arc::new(RecordingInvalidator::default());
        let dispatcher = RevalidationDispatcher::new(Arc::clone(&recorder)).with_pages(TEST_PAGES);

        let result = dispatcher.invalidate_for_slug("ghost").await;

        assert_eq!(
            result,
            Err(RevalidateError::UnknownSlug("ghost".to_string()))
        );
        assert_eq!(recorder.paths(), vec![ADMIN_SEO_PATH]);
    }

    #[tokio::test]
    async fn failing_public_path_still_reaches_admin() {
        let recorder = Arc::new(RecordingInvalidator::failing_on("/alpha"));
        let dispatcher = RevalidationDispatcher::new(Arc::clone(&recorder)).with_pages(TEST_PAGES);

        let err = dispatcher.invalidate_for_slug("alpha").await.unwrap_err();

        assert!(matches!(err, RevalidateError::Invalidation(ref e) if e.path == "/alpha"));
        assert_eq!(recorder.paths(), vec!["/alpha", ADMIN_SEO_PATH]);
    }

    #[tokio::test]
    async fn revalidate_all_covers_every_page() {
        let recorder = Arc::new(RecordingInvalidator::default());
        let dispatcher = RevalidationDispatcher::new(Arc::clone(&recorder)).with_pages(TEST_PAGES);

        let count = dispatcher.revalidate_all().await.unwrap();

        assert_eq!(count, 4);
        assert_eq!(
            recorder.paths(),
            vec!["/alpha", "/beta", "/beta/feed", ADMIN_SEO_PATH]
        );
    }

    #[tokio::test]
    async fn revalidate_all_default_table_includes_root() {
        let recorder = Arc::new(RecordingInvalidator::default());
        let dispatcher = RevalidationDispatcher::new(Arc::clone(&recorder));

        let count = dispatcher.revalidate_all().await.unwrap();

        assert_eq!(count, PAGES.len() + 1);
        assert_eq!(recorder.paths()[0], "/");
    }
}
