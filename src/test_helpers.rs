//! Shared test utilities.
//!
//! Provides a small two-page table, store and invalidator fakes, and
//! constructors that wire them together.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let resolver = test_resolver(MemoryStore::new());
//! let actions = test_actions(FailingStore);
//! let recorder = Arc::new(RecordingInvalidator::failing_on("/alpha"));
//! let parked = ParkedStore::parking_reads();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::admin::AdminActions;
use crate::config::SiteConfig;
use crate::resolve::SeoResolver;
use crate::revalidate::{CacheInvalidator, InvalidationError, RevalidationDispatcher};
use crate::store::{SeoStore, StoreError};
use crate::types::{SeoEntry, SeoPageConfig};

pub use crate::store::MemoryStore;

// =========================================================================
// Page table
// =========================================================================

pub const TEST_BASE_URL: &str = "https://test.example.com";
pub const TEST_SITE_NAME: &str = "Test Site";

/// Two pages: `alpha` has default keywords, `beta` has none but lists an
/// extra revalidation path.
pub const TEST_PAGES: &[SeoPageConfig] = &[
    SeoPageConfig {
        slug: "alpha",
        path: "/alpha",
        label: "Alpha",
        default_title: "Alpha Default Title",
        default_description: "Alpha default description.",
        default_keywords: Some("alpha, beta"),
        revalidate_paths: &[],
    },
    SeoPageConfig {
        slug: "beta",
        path: "/beta",
        label: "Beta",
        default_title: "Beta Default Title",
        default_description: "Beta default description.",
        default_keywords: None,
        revalidate_paths: &["/beta/feed"],
    },
];

pub fn test_config() -> SiteConfig {
    let mut config = SiteConfig::default();
    config.site.base_url = TEST_BASE_URL.to_string();
    config.site.name = TEST_SITE_NAME.to_string();
    config
}

pub fn test_resolver<S: SeoStore>(store: S) -> SeoResolver<S> {
    SeoResolver::new(Arc::new(store), &test_config()).with_pages(TEST_PAGES)
}

/// Admin actions over `store` with a recording invalidator, on [`TEST_PAGES`].
pub fn test_actions<S: SeoStore>(store: S) -> AdminActions<S, RecordingInvalidator> {
    test_actions_with(store, RecordingInvalidator::default())
}

pub fn test_actions_with<S: SeoStore>(
    store: S,
    invalidator: RecordingInvalidator,
) -> AdminActions<S, RecordingInvalidator> {
    let dispatcher = RevalidationDispatcher::new(Arc::new(invalidator)).with_pages(TEST_PAGES);
    AdminActions::new(Arc::new(store), dispatcher)
}

/// An entry with only a stored title.
pub fn title_only_entry(slug: &str, title: &str) -> SeoEntry {
    SeoEntry {
        meta_title: Some(title.to_string()),
        ..SeoEntry::empty(slug)
    }
}

// =========================================================================
// Fakes
// =========================================================================

/// A store whose every operation fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStore;

impl SeoStore for FailingStore {
    async fn fetch_one(&self, _slug: &str) -> Result<Option<SeoEntry>, StoreError> {
        Err(StoreError::Unavailable("database offline".into()))
    }

    async fn fetch_all(&self) -> Result<Vec<SeoEntry>, StoreError> {
        Err(StoreError::Unavailable("database offline".into()))
    }

    async fn save(
        &self,
        _slug: &str,
        _meta_title: &str,
        _meta_description: &str,
        _keywords: Option<&str>,
    ) -> Result<SeoEntry, StoreError> {
        Err(StoreError::Unavailable("database offline".into()))
    }
}

/// Records every invalidated path; optionally fails on one of them.
///
/// A failing path is still recorded, so tests can check it was attempted.
#[derive(Debug, Default)]
pub struct RecordingInvalidator {
    paths: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingInvalidator {
    pub fn failing_on(path: &str) -> Self {
        Self {
            paths: Mutex::default(),
            fail_on: Some(path.to_string()),
        }
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl CacheInvalidator for RecordingInvalidator {
    async fn invalidate(&self, path: &str) -> Result<(), InvalidationError> {
        self.paths.lock().unwrap().push(path.to_string());
        if self.fail_on.as_deref() == Some(path) {
            return Err(InvalidationError {
                path: path.to_string(),
                reason: "edge cache unreachable".to_string(),
            });
        }
        Ok(())
    }
}

/// A store that can be switched off and on between requests.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    down: AtomicBool,
}

impl FlakyStore {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Store a title override directly, bypassing the outage switch.
    pub async fn seed(&self, slug: &str, title: &str) {
        self.inner
            .save(slug, title, "Stored description.", None)
            .await
            .unwrap();
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

impl SeoStore for FlakyStore {
    async fn fetch_one(&self, slug: &str) -> Result<Option<SeoEntry>, StoreError> {
        self.check()?;
        self.inner.fetch_one(slug).await
    }

    async fn fetch_all(&self) -> Result<Vec<SeoEntry>, StoreError> {
        self.check()?;
        self.inner.fetch_all().await
    }

    async fn save(
        &self,
        slug: &str,
        meta_title: &str,
        meta_description: &str,
        keywords: Option<&str>,
    ) -> Result<SeoEntry, StoreError> {
        self.check()?;
        self.inner
            .save(slug, meta_title, meta_description, keywords)
            .await
    }
}

/// A memory store that holds its first read (or first save) open until the
/// test releases it.
///
/// The parked operation has already run against the inner store, so a parked
/// read carries whatever was stored before it was parked.
///
/// ```text
/// let store = ParkedStore::parking_saves();
/// // task A: store.save(..) parks
/// store.entered().await; // A is parked
/// store.release();       // A continues
/// ```
#[derive(Debug)]
pub struct ParkedStore {
    inner: MemoryStore,
    park_reads: bool,
    armed: AtomicBool,
    entered: Notify,
    released: Notify,
}

impl ParkedStore {
    fn parking(park_reads: bool) -> Self {
        Self {
            inner: MemoryStore::new(),
            park_reads,
            armed: AtomicBool::new(true),
            entered: Notify::new(),
            released: Notify::new(),
        }
    }

    /// Parks the first `fetch_one`.
    pub fn parking_reads() -> Self {
        Self::parking(true)
    }

    /// Parks the first `save`.
    pub fn parking_saves() -> Self {
        Self::parking(false)
    }

    /// Wait until the parked operation has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the parked operation return.
    pub fn release(&self) {
        self.released.notify_one();
    }

    async fn park(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.released.notified().await;
        }
    }
}

impl SeoStore for ParkedStore {
    async fn fetch_one(&self, slug: &str) -> Result<Option<SeoEntry>, StoreError> {
        let entry = self.inner.fetch_one(slug).await;
        if self.park_reads {
            self.park().await;
        }
        entry
    }

    async fn fetch_all(&self) -> Result<Vec<SeoEntry>, StoreError> {
        self.inner.fetch_all().await
    }

    async fn save(
        &self,
        slug: &str,
        meta_title: &str,
        meta_description: &str,
        keywords: Option<&str>,
    ) -> Result<SeoEntry, StoreError> {
        let entry = self
            .inner
            .save(slug, meta_title, meta_description, keywords)
            .await;
        if !self.park_reads {
            self.park().await;
        }
        entry
    }
}
