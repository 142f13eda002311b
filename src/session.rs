//! Admin listing edit session.
//!
//! Holds the rows shown in the admin SEO listing and which one, if any, is
//! being edited. Editing is a single tagged state: there is never more than
//! one edit target, and the rows themselves are only touched by a successful
//! save or by restoring a snapshot.
//!
//! ```text
//!             begin_edit(a)                 begin_edit(b)
//!   Viewing ───────────────▶ Editing(a) ───────────────▶ Editing(b)
//!      ▲                       │   │                    (a's draft dropped)
//!      │        save() ok      │   │ save() err
//!      └───────────────────────┘   └──▶ Editing(a) + error, draft kept
//!      ▲        cancel()       │
//!      └───────────────────────┘
//! ```

use crate::admin::{AdminActions, LengthReport, SaveError, SaveRequest};
use crate::config::LimitsConfig;
use crate::resolve::{self, SeoResolver};
use crate::revalidate::CacheInvalidator;
use crate::store::SeoStore;
use crate::types::AdminRow;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no row is being edited")]
    NotEditing,
    #[error("no row for slug '{0}'")]
    UnknownSlug(String),
    #[error("save failed: {0}")]
    Save(#[from] SaveError),
}

/// An editable field of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Description,
    Keywords,
}

/// Uncommitted field values for the row being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeoDraft {
    pub meta_title: String,
    pub meta_description: String,
    pub keywords: String,
}

impl From<&AdminRow> for SeoDraft {
    fn from(row: &AdminRow) -> Self {
        Self {
            meta_title: row.meta_title.clone(),
            meta_description: row.meta_description.clone(),
            keywords: row.keywords.clone(),
        }
    }
}

impl SeoDraft {
    fn set(&mut self, field: DraftField, value: String) {
        match field {
            DraftField::Title => self.meta_title = value,
            DraftField::Description => self.meta_description = value,
            DraftField::Keywords => self.keywords = value,
        }
    }

    fn to_request(&self, slug: &str) -> SaveRequest {
        SaveRequest {
            slug: slug.to_string(),
            meta_title: self.meta_title.clone(),
            meta_description: self.meta_description.clone(),
            keywords: Some(self.keywords.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTarget {
    pub slug: &'static str,
    pub draft: SeoDraft,
    /// The row as it was when editing began.
    pub snapshot: AdminRow,
    /// Message from the last failed save.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Viewing,
    Editing(EditTarget),
}

/// The admin listing and its edit state.
#[derive(Debug, Clone)]
pub struct SeoAdminSession {
    rows: Vec<AdminRow>,
    state: EditState,
    limits: LimitsConfig,
    load_error: Option<String>,
}

impl SeoAdminSession {
    pub fn new(rows: Vec<AdminRow>, limits: LimitsConfig) -> Self {
        Self {
            rows,
            state: EditState::Viewing,
            limits,
            load_error: None,
        }
    }

    /// Load the listing. If the store is down the rows fall back to defaults
    /// and [`load_error`](Self::load_error) is set.
    pub async fn load<S: SeoStore>(resolver: &SeoResolver<S>, limits: LimitsConfig) -> Self {
        match resolver.list_all().await {
            Ok(rows) => Self::new(rows, limits),
            Err(e) => {
                warn!(error = %e, "failed to load SEO entries, showing defaults");
                Self {
                    load_error: Some(e.to_string()),
                    ..Self::new(resolver.default_rows(), limits)
                }
            }
        }
    }

    pub fn rows(&self) -> &[AdminRow] {
        &self.rows
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn editing_slug(&self) -> Option<&'static str> {
        match &self.state {
            EditState::Editing(target) => Some(target.slug),
            EditState::Viewing => None,
        }
    }

    /// Total number of pages, regardless of any search filter.
    pub fn page_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows whose label or slug contains `query`, case-insensitively.
    ///
    /// A blank query matches everything.
    pub fn filtered(&self, query: &str) -> Vec<&AdminRow> {
        let needle = query.trim().to_lowercase();
        self.rows
            .iter()
            .filter(|row| {
                needle.is_empty()
                    || row.page.label.to_lowercase().contains(&needle)
                    || row.slug().to_lowercase().contains(&needle)
            })
            .collect()
    }

    fn index_of(&self, slug: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.slug() == slug)
    }

    fn restore(&mut self, snapshot: AdminRow) {
        if let Some(index) = self.index_of(snapshot.slug()) {
            self.rows[index] = snapshot;
        }
    }

    /// Start editing `slug`. Any other draft in progress is discarded.
    pub fn begin_edit(&mut self, slug: &str) -> Result<(), SessionError> {
        let index = self
            .index_of(slug)
            .ok_or_else(|| SessionError::UnknownSlug(slug.to_string()))?;

        if let EditState::Editing(previous) = std::mem::take(&mut self.state) {
            debug!(slug = previous.slug, "discarding draft");
            self.restore(previous.snapshot);
        }

        let row = &self.rows[index];
        self.state = EditState::Editing(EditTarget {
            slug: row.slug(),
            draft: SeoDraft::from(row),
            snapshot: row.clone(),
            error: None,
        });
        Ok(())
    }

    /// Change one field of the draft. Rows are untouched.
    pub fn update_draft_field(
        &mut self,
        field: DraftField,
        value: impl Into<String>,
    ) -> Result<(), SessionError> {
        match &mut self.state {
            EditState::Editing(target) => {
                target.draft.set(field, value.into());
                Ok(())
            }
            EditState::Viewing => Err(SessionError::NotEditing),
        }
    }

    /// Length indicators for the current draft.
    pub fn draft_lengths(&self) -> Option<LengthReport> {
        match &self.state {
            EditState::Editing(target) => Some(LengthReport::new(
                &target.draft.meta_title,
                &target.draft.meta_description,
                &self.limits,
            )),
            EditState::Viewing => None,
        }
    }

    /// Commit the draft through `actions`.
    ///
    /// On success the row takes the saved values and the session returns to
    /// viewing. On failure the session stays in edit mode with the draft
    /// intact and the error recorded on the target.
    pub async fn save<S: SeoStore, C: CacheInvalidator>(
        &mut self,
        actions: &AdminActions<S, C>,
    ) -> Result<LengthReport, SessionError> {
        let (slug, request) = match &self.state {
            EditState::Editing(target) => (target.slug, target.draft.to_request(target.slug)),
            EditState::Viewing => return Err(SessionError::NotEditing),
        };
        let lengths = LengthReport::new(&request.meta_title, &request.meta_description, &self.limits);

        match actions.upsert(&request).await {
            Ok(entry) => {
                if let Some(index) = self.index_of(slug) {
                    let page = self.rows[index].page;
                    self.rows[index] = resolve::admin_row(&page, Some(&entry));
                }
                self.state = EditState::Viewing;
                Ok(lengths)
            }
            Err(e) => {
                if let EditState::Editing(target) = &mut self.state {
                    target.error = Some(e.to_string());
                }
                Err(e.into())
            }
        }
    }

    /// Drop the draft and restore the row as it was before editing.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        match std::mem::take(&mut self.state) {
            EditState::Editing(target) => {
                self.restore(target.snapshot);
                Ok(())
            }
            EditState::Viewing => Err(SessionError::NotEditing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    async fn session() -> SeoAdminSession {
        let resolver = test_resolver(MemoryStore::new());
        SeoAdminSession::load(&resolver, LimitsConfig::default()).await
    }

    // =========================================================================
    // Loading and filtering
    // =========================================================================

    #[tokio::test]
    async fn load_starts_viewing_with_all_rows() {
        let s = session().await;
        assert_eq!(s.state(), &EditState::Viewing);
        assert_eq!(s.page_count(), TEST_PAGES.len());
        assert!(s.load_error().is_none());
    }

    #[tokio::test]
    async fn load_failure_falls_back_to_defaults() {
        let resolver = test_resolver(FailingStore);
        let s = SeoAdminSession::load(&resolver, LimitsConfig::default()).await;
        assert!(s.load_error().unwrap().contains("database offline"));
        assert_eq!(s.rows()[0].meta_title, TEST_PAGES[0].default_title);
    }

    #[tokio::test]
    async fn filtered_matches_label_or_slug() {
        let s = session().await;
        let labels: Vec<&str> = s.filtered("ALP").iter().map(|r| r.page.label).collect();
        assert_eq!(labels, vec!["Alpha"]);
        assert_eq!(s.filtered("").len(), 2);
        assert!(s.filtered("zzz").is_empty());
        assert_eq!(s.page_count(), 2);
    }

    // =========================================================================
    // State transitions
    // =========================================================================

    #[tokio::test]
    async fn cancel_restores_row_exactly() {
        let mut s = session().await;
        let before = s.rows()[0].clone();

        s.begin_edit("alpha").unwrap();
        s.update_draft_field(DraftField::Title, "Changed").unwrap();
        s.update_draft_field(DraftField::Keywords, "").unwrap();
        s.cancel().unwrap();

        assert_eq!(s.rows()[0], before);
        assert_eq!(s.state(), &EditState::Viewing);
    }

    #[tokio::test]
    async fn switching_target_discards_previous_draft() {
        let mut s = session().await;
        let alpha_before = s.rows()[0].clone();

        s.begin_edit("alpha").unwrap();
        s.update_draft_field(DraftField::Title, "Unsaved").unwrap();
        s.begin_edit("beta").unwrap();

        assert_eq!(s.editing_slug(), Some("beta"));
        assert_eq!(s.rows()[0], alpha_before);
        match s.state() {
            EditState::Editing(target) => {
                assert_eq!(target.draft.meta_title, TEST_PAGES[1].default_title)
            }
            EditState::Viewing => panic!("expected editing"),
        }
    }

    #[tokio::test]
    async fn switching_target_does_not_persist() {
        let resolver = test_resolver(MemoryStore::new());
        let mut s = SeoAdminSession::load(&resolver, LimitsConfig::default()).await;

        s.begin_edit("alpha").unwrap();
        s.update_draft_field(DraftField::Title, "Unsaved").unwrap();
        s.begin_edit("beta").unwrap();

        assert!(resolver.store().fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn draft_edits_do_not_touch_rows() {
        let mut s = session().await;
        s.begin_edit("alpha").unwrap();
        s.update_draft_field(DraftField::Description, "Draft").unwrap();
        assert_eq!(s.rows()[0].meta_description, TEST_PAGES[0].default_description);
    }

    #[tokio::test]
    async fn operations_require_editing() {
        let mut s = session().await;
        let actions = test_actions(MemoryStore::new());
        assert!(matches!(
            s.update_draft_field(DraftField::Title, "x"),
            Err(SessionError::NotEditing)
        ));
        assert!(matches!(s.cancel(), Err(SessionError::NotEditing)));
        assert!(matches!(s.save(&actions).await, Err(SessionError::NotEditing)));
        assert!(s.draft_lengths().is_none());
    }

    #[tokio::test]
    async fn begin_edit_unknown_slug() {
        let mut s = session().await;
        assert!(matches!(
            s.begin_edit("ghost"),
            Err(SessionError::UnknownSlug(slug)) if slug == "ghost"
        ));
        assert_eq!(s.state(), &EditState::Viewing);
    }

    // =========================================================================
    // Saving
    // =========================================================================

    #[tokio::test]
    async fn save_success_updates_row_and_returns_to_viewing() {
        let mut s = session().await;
        let actions = test_actions(MemoryStore::new());
        let long_title = "t".repeat(64);

        s.begin_edit("beta").unwrap();
        s.update_draft_field(DraftField::Title, long_title.clone()).unwrap();
        s.update_draft_field(DraftField::Keywords, "x, y").unwrap();
        let lengths = s.save(&actions).await.unwrap();

        assert!(lengths.title.is_over());
        assert_eq!(s.state(), &EditState::Viewing);
        assert_eq!(s.rows()[1].meta_title, long_title);
        assert_eq!(s.rows()[1].keywords, "x, y");
        assert!(actions.dispatcher().cache().paths().contains(&"/beta".to_string()));
    }

    #[tokio::test]
    async fn save_failure_keeps_draft_and_sets_error() {
        let mut s = session().await;
        let actions = test_actions(FailingStore);

        s.begin_edit("alpha").unwrap();
        s.update_draft_field(DraftField::Title, "Kept").unwrap();
        assert!(s.save(&actions).await.is_err());

        match s.state() {
            EditState::Editing(target) => {
                assert_eq!(target.draft.meta_title, "Kept");
                assert!(target.error.as_deref().unwrap().contains("database offline"));
            }
            EditState::Viewing => panic!("expected editing"),
        }
        assert_eq!(s.rows()[0].meta_title, TEST_PAGES[0].default_title);
    }

    #[tokio::test]
    async fn blank_keywords_save_restores_default_keywords() {
        let mut s = session().await;
        let actions = test_actions(MemoryStore::new());

        s.begin_edit("alpha").unwrap();
        s.update_draft_field(DraftField::Keywords, "  ").unwrap();
        s.save(&actions).await.unwrap();

        assert_eq!(s.rows()[0].keywords, "alpha, beta");
    }
}
