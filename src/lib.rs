//! # pagemeta
//!
//! Per-page SEO metadata for a marketing site with an attached admin area.
//! Every public page has compiled-in default metadata; admins can override
//! the title, description, and keywords per page, and a save evicts exactly
//! the cached renderings that embed the changed metadata.
//!
//! # Data Flow
//!
//! ```text
//! pages::PAGES ──┐
//!                ├──▶ SeoResolver ──▶ EffectiveSeoPage ──▶ head::PageMetadata ──▶ <head>
//! SeoStore ──────┘         │
//!                          └──▶ AdminRow ──▶ SeoAdminSession ──▶ admin listing
//!
//! save: AdminActions ──▶ SeoStore::save ──▶ RevalidationDispatcher ──▶ PageCache
//! ```
//!
//! Reads never fail because of storage: a store error during public rendering
//! degrades to the defaults. Saves are authoritative once stored; revalidation
//! after a save is best-effort and never rolls it back.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pages`] | Compiled-in page table with default metadata |
//! | [`types`] | Shared types: page config, stored entry, effective page, admin row |
//! | [`store`] | Persistence boundary: `SeoStore` trait, in-memory and JSON file stores |
//! | [`resolve`] | Field-by-field merge of defaults and stored overrides |
//! | [`revalidate`] | Maps a saved slug to the cached paths it invalidates |
//! | [`cache`] | In-memory rendered-page cache with ETags and stats |
//! | [`admin`] | Save action: store write, revalidation, advisory length checks |
//! | [`session`] | Admin listing edit state machine |
//! | [`head`] | Page-render boundary: `PageMetadata` and `<head>` tags |
//! | [`render`] | HTML documents for the admin listing and public pages (Maud) |
//! | [`serve`] | HTTP server (tiny_http + rayon workers driving tokio) |
//! | [`config`] | `config.toml` loading, validation, and merging |
//! | [`url`] | Canonical URL joining and admin display URLs |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Explicit Fallback Chains
//!
//! Each field resolves through an ordered list of sources with one of two
//! rules: [`resolve::first_present`] (an empty string counts) or
//! [`resolve::first_non_blank`] (blank falls through). Titles and
//! descriptions use the second so a page can never render an empty `<title>`.
//!
//! ## Async Boundaries Without Trait Objects
//!
//! `SeoStore` and `CacheInvalidator` return `impl Future` from their methods.
//! Components are generic over them and hold them in `Arc`, so the store and
//! the cache can be swapped for fakes in tests with no boxing.
//!
//! ## Targeted Invalidation
//!
//! A save invalidates the page's own path, any extra paths its config lists,
//! and the admin listing. Nothing else is touched, so an edit to the FAQ page
//! never costs a re-render of the home page.

pub mod admin;
pub mod cache;
pub mod config;
pub mod head;
pub mod output;
pub mod pages;
pub mod render;
pub mod resolve;
pub mod revalidate;
pub mod serve;
pub mod session;
pub mod store;
pub mod types;
pub mod url;

#[cfg(test)]
pub(crate) mod test_helpers;
