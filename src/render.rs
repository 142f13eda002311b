//! HTML documents served by the site: the admin SEO listing and the public
//! page skeleton that carries resolved `<head>` metadata.
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating, so
//! every stored value is escaped on the way out.
//!
//! Static assets are embedded at compile time:
//! - `static/admin.css`: listing styles
//! - `static/admin.js`: posts edited rows to the save action as JSON

use crate::admin::LengthCheck;
use crate::head::{PageMetadata, render_head};
use crate::pages::ADMIN_SEO_PATH;
use crate::session::SeoAdminSession;
use crate::types::AdminRow;
use crate::url;
use maud::{DOCTYPE, Markup, PreEscaped, html};

const ADMIN_CSS: &str = include_str!("../static/admin.css");
const ADMIN_JS: &str = include_str!("../static/admin.js");

/// What the admin listing page shows.
#[derive(Debug, Clone)]
pub struct ListingView<'a> {
    pub rows: Vec<&'a AdminRow>,
    /// Page count before filtering.
    pub total: usize,
    pub base_url: &'a str,
    pub title_limit: usize,
    pub description_limit: usize,
    pub error: Option<&'a str>,
    pub query: &'a str,
}

impl<'a> ListingView<'a> {
    pub fn from_session(session: &'a SeoAdminSession, base_url: &'a str, query: &'a str) -> Self {
        Self {
            rows: session.filtered(query),
            total: session.page_count(),
            base_url,
            title_limit: session.limits().title,
            description_limit: session.limits().description,
            error: session.load_error(),
            query,
        }
    }
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(head_tags: Markup, body_class: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                (head_tags)
            }
            body class=[body_class] {
                (content)
            }
        }
    }
}

/// `12 / 60` counter, red when over the limit.
fn length_indicator(check: LengthCheck) -> Markup {
    html! {
        span.length.over[check.is_over()] { (check.len) " / " (check.limit) }
    }
}

fn render_row(row: &AdminRow, view: &ListingView) -> Markup {
    let title = LengthCheck::new(&row.meta_title, view.title_limit);
    let description = LengthCheck::new(&row.meta_description, view.description_limit);
    let keywords_placeholder = row.page.default_keywords.unwrap_or("comma, separated, keywords");

    html! {
        tr id={ "seo-" (row.slug()) } {
            td {
                strong { (row.page.label) }
                div.display-url { (url::display_url(view.base_url, row.page.path)) }
            }
            td {
                form.seo-edit action=(ADMIN_SEO_PATH) method="post" data-slug=(row.slug()) {
                    label {
                        "Meta title "
                        (length_indicator(title))
                        input type="text" name="metaTitle" value=(row.meta_title)
                            placeholder=(row.page.default_title);
                    }
                    label {
                        "Meta description "
                        (length_indicator(description))
                        textarea name="metaDescription" rows="3"
                            placeholder=(row.page.default_description) { (row.meta_description) }
                    }
                    label {
                        "Keywords"
                        input type="text" name="keywords" value=(row.keywords)
                            placeholder=(keywords_placeholder);
                    }
                    button type="submit" { "Save" }
                    p.save-error role="alert" {}
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// The admin SEO listing with one inline edit form per page.
pub fn render_admin_page(view: &ListingView) -> Markup {
    let head_tags = html! {
        title { "SEO settings" }
        meta name="robots" content="noindex, nofollow";
        style { (PreEscaped(ADMIN_CSS)) }
    };

    let content = html! {
        main.admin-seo {
            h1 { "SEO settings" }
            p.page-count {
                @if view.query.trim().is_empty() {
                    (view.total) " pages"
                } @else {
                    (view.rows.len()) " of " (view.total) " pages match \"" (view.query) "\""
                }
            }
            form.search method="get" action=(ADMIN_SEO_PATH) {
                input type="search" name="q" value=(view.query) placeholder="Search pages";
            }
            @if let Some(error) = view.error {
                div.banner-error role="alert" {
                    "Could not load saved SEO settings, showing defaults: " (error)
                }
            }
            table.seo-rows {
                thead {
                    tr { th { "Page" } th { "Metadata" } }
                }
                tbody {
                    @for row in &view.rows {
                        (render_row(row, view))
                    }
                }
            }
        }
        script { (PreEscaped(ADMIN_JS)) }
    };

    base_document(head_tags, Some("admin"), content)
}

/// A public page skeleton whose `<head>` carries the resolved metadata.
pub fn render_public_page(page: &PageMetadata, label: &str) -> Markup {
    let content = html! {
        main.page {
            h1 { (label) }
        }
    };
    base_document(render_head(page), None, content)
}
