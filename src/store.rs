//! Persistence boundary for stored SEO overrides.
//!
//! The rest of the crate only sees the [`SeoStore`] trait: fetch one entry,
//! fetch all entries, save one entry. Storage technology is opaque behind it.
//! Two implementations ship:
//!
//! - [`MemoryStore`]: a map behind an async lock. Used by tests and as a
//!   scratch store.
//! - [`JsonFileStore`]: a single JSON document keyed by slug, rewritten
//!   atomically (temp file + rename) on every save.
//!
//! ## File format
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": {
//!     "faqs": { "slug": "faqs", "meta_title": "FAQ", "updated_at": 1760000000 }
//!   }
//! }
//! ```
//!
//! A missing file is an empty store. A corrupt file or a version mismatch is
//! an error: unlike a build cache, stored overrides are the source of truth
//! and must not be silently dropped.
//!
//! ## Concurrency
//!
//! Saves are last-writer-wins per slug. The file store serializes its
//! read-modify-write cycle so concurrent saves to *different* slugs never
//! lose each other's entries.

use crate::types::SeoEntry;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Version of the entry file format.
const FILE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported entry file version {found}")]
    UnsupportedVersion { found: u32 },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read/write access to stored SEO overrides, keyed by slug.
pub trait SeoStore: Send + Sync {
    /// The stored entry for `slug`, or `None` if it was never saved.
    fn fetch_one(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<SeoEntry>, StoreError>> + Send;

    /// Every stored entry, in no particular order.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<SeoEntry>, StoreError>> + Send;

    /// Create or overwrite the entry for `slug`. Returns the entry as stored.
    fn save(
        &self,
        slug: &str,
        meta_title: &str,
        meta_description: &str,
        keywords: Option<&str>,
    ) -> impl Future<Output = Result<SeoEntry, StoreError>> + Send;
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn build_entry(
    slug: &str,
    meta_title: &str,
    meta_description: &str,
    keywords: Option<&str>,
) -> SeoEntry {
    SeoEntry {
        slug: slug.to_string(),
        meta_title: Some(meta_title.to_string()),
        meta_description: Some(meta_description.to_string()),
        keywords: keywords.map(str::to_string),
        updated_at: now_unix(),
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Entries held in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, SeoEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing entries.
    pub fn with_entries(entries: impl IntoIterator<Item = SeoEntry>) -> Self {
        let map = entries.into_iter().map(|e| (e.slug.clone(), e)).collect();
        Self {
            entries: RwLock::new(map),
        }
    }
}

impl SeoStore for MemoryStore {
    async fn fetch_one(&self, slug: &str) -> Result<Option<SeoEntry>, StoreError> {
        Ok(self.entries.read().await.get(slug).cloned())
    }

    async fn fetch_all(&self) -> Result<Vec<SeoEntry>, StoreError> {
        Ok(self.entries.read().await.values().cloned().collect())
    }

    async fn save(
        &self,
        slug: &str,
        meta_title: &str,
        meta_description: &str,
        keywords: Option<&str>,
    ) -> Result<SeoEntry, StoreError> {
        let entry = build_entry(slug, meta_title, meta_description, keywords);
        self.entries
            .write()
            .await
            .insert(slug.to_string(), entry.clone());
        Ok(entry)
    }
}

// ============================================================================
// JSON file store
// ============================================================================

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct EntryFile {
    version: u32,
    entries: BTreeMap<String, SeoEntry>,
}

impl EntryFile {
    fn empty() -> Self {
        Self {
            version: FILE_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// Entries persisted as one JSON document on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Held across the read-modify-write of a save.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<EntryFile, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(EntryFile::empty()),
            Err(e) => return Err(e.into()),
        };
        let file: EntryFile = serde_json::from_str(&content)?;
        if file.version != FILE_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: file.version,
            });
        }
        Ok(file)
    }

    async fn write(&self, file: &EntryFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl SeoStore for JsonFileStore {
    async fn fetch_one(&self, slug: &str) -> Result<Option<SeoEntry>, StoreError> {
        let mut file = self.load().await?;
        Ok(file.entries.remove(slug))
    }

    async fn fetch_all(&self) -> Result<Vec<SeoEntry>, StoreError> {
        Ok(self.load().await?.entries.into_values().collect())
    }

    async fn save(
        &self,
        slug: &str,
        meta_title: &str,
        meta_description: &str,
        keywords: Option<&str>,
    ) -> Result<SeoEntry, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.load().await?;
        let entry = build_entry(slug, meta_title, meta_description, keywords);
        file.entries.insert(slug.to_string(), entry.clone());
        self.write(&file).await?;
        debug!(slug, path = %self.path.display(), "entry written");
        Ok(entry)
    }
}
