//! Admin save action: persist an SEO override, then revalidate.
//!
//! This is the server side of the admin listing's save button. The request
//! body is JSON:
//!
//! ```json
//! { "slug": "faqs", "metaTitle": "FAQ", "metaDescription": "...", "keywords": "a, b" }
//! ```
//!
//! and the response is `{ "success": true }` or
//! `{ "success": false, "error": "..." }`.
//!
//! ## Ordering
//!
//! 1. Reject the save if one for the same slug is already in flight.
//! 2. Save to the store. A store error fails the action.
//! 3. Invalidate the page and the admin listing. An invalidation error is
//!    logged and swallowed: the save already happened.
//!
//! No lock is held across the store write and the invalidation.
//!
//! ## Length limits
//!
//! Title and description limits are advisory. [`LengthCheck`] reports them for
//! display and never blocks a save.

use crate::config::LimitsConfig;
use crate::revalidate::{CacheInvalidator, RevalidationDispatcher};
use crate::store::{SeoStore, StoreError};
use crate::types::SeoEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("a save for '{0}' is already in progress")]
    InFlight(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Body of a save request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub slug: String,
    pub meta_title: String,
    pub meta_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

impl SaveRequest {
    /// Keywords to persist. Blank is treated as absent.
    pub fn keywords(&self) -> Option<&str> {
        self.keywords.as_deref().filter(|k| !k.trim().is_empty())
    }
}

/// Body of a save response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for SaveResponse {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(e) => Self::failed(e),
        }
    }
}

/// Character count of a field against its advisory limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LengthCheck {
    pub len: usize,
    pub limit: usize,
}

impl LengthCheck {
    /// Counts characters, not bytes.
    pub fn new(value: &str, limit: usize) -> Self {
        Self {
            len: value.chars().count(),
            limit,
        }
    }

    pub fn is_over(&self) -> bool {
        self.len > self.limit
    }
}

/// Length indicators for a title/description pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LengthReport {
    pub title: LengthCheck,
    pub description: LengthCheck,
}

impl LengthReport {
    pub fn new(title: &str, description: &str, limits: &LimitsConfig) -> Self {
        Self {
            title: LengthCheck::new(title, limits.title),
            description: LengthCheck::new(description, limits.description),
        }
    }
}

/// Slugs with a save in progress. The guard releases its slug on drop.
#[derive(Debug, Default)]
struct InFlight {
    slugs: Mutex<HashSet<String>>,
}

struct InFlightGuard<'a> {
    owner: &'a InFlight,
    slug: String,
}

impl InFlight {
    fn acquire(&self, slug: &str) -> Option<InFlightGuard<'_>> {
        let mut slugs = self.slugs.lock().unwrap_or_else(PoisonError::into_inner);
        slugs.insert(slug.to_string()).then(|| InFlightGuard {
            owner: self,
            slug: slug.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.owner
            .slugs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.slug);
    }
}

/// Store save plus revalidation, shared by the HTTP handler and the admin
/// session.
#[derive(Debug)]
pub struct AdminActions<S, C> {
    store: Arc<S>,
    dispatcher: RevalidationDispatcher<C>,
    in_flight: InFlight,
}

impl<S: SeoStore, C: CacheInvalidator> AdminActions<S, C> {
    pub fn new(store: Arc<S>, dispatcher: RevalidationDispatcher<C>) -> Self {
        Self {
            store,
            dispatcher,
            in_flight: InFlight::default(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn dispatcher(&self) -> &RevalidationDispatcher<C> {
        &self.dispatcher
    }

    /// Save one override and revalidate the affected paths.
    pub async fn upsert(&self, request: &SaveRequest) -> Result<SeoEntry, SaveError> {
        let slug = request.slug.as_str();
        let _guard = self
            .in_flight
            .acquire(slug)
            .ok_or_else(|| SaveError::InFlight(slug.to_string()))?;

        let entry = self
            .store
            .save(
                slug,
                &request.meta_title,
                &request.meta_description,
                request.keywords(),
            )
            .await
            .inspect_err(|e| warn!(slug, error = %e, "SEO save failed"))?;

        if let Err(e) = self.dispatcher.invalidate_for_slug(slug).await {
            warn!(slug, error = %e, "saved, but revalidation failed");
        }
        info!(slug, "SEO metadata saved");
        Ok(entry)
    }

    /// [`upsert`](Self::upsert) shaped as the HTTP response body.
    pub async fn handle(&self, request: &SaveRequest) -> SaveResponse {
        self.upsert(request).await.into()
    }
}
