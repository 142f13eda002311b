//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every page is shown by its positional index and label, with URL and field
//! values as indented context lines. Field lengths are shown next to their
//! advisory limit and flagged when over.
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! SEO pages (9)
//! 001 Home
//!     URL: BRIGHTLEASING.COM.AU/
//!     Title: Novated Leasing Made Simple | Bright Leasing (46/60)
//!     Description: Bright Leasing makes novated leasing simple... (148/155)
//!     Keywords: novated leasing, car leasing, salary packaging
//! ```
//!
//! ## Resolve
//!
//! ```text
//! faqs → https://brightleasing.com.au/faqs
//!     Title: FAQ | Bright Leasing
//!     Description: Answers to common questions...
//!     Keywords: faq, novated lease questions
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::admin::{LengthCheck, LengthReport};
use crate::config::LimitsConfig;
use crate::types::{AdminRow, EffectiveSeoPage, SeoEntry};
use crate::url;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// `(46/60)`, or `(64/60, over)` when the value exceeds its limit.
fn length_tag(check: LengthCheck) -> String {
    if check.is_over() {
        format!("({}/{}, over)", check.len, check.limit)
    } else {
        format!("({}/{})", check.len, check.limit)
    }
}

fn keywords_line(keywords: &str) -> Option<String> {
    (!keywords.trim().is_empty()).then(|| format!("{}Keywords: {}", indent(1), keywords))
}

// ============================================================================
// List
// ============================================================================

/// Format the admin listing. `total` is the page count before filtering.
pub fn format_listing(
    rows: &[&AdminRow],
    total: usize,
    base_url: &str,
    limits: &LimitsConfig,
) -> Vec<String> {
    let mut lines = Vec::new();
    if rows.len() == total {
        lines.push(format!("SEO pages ({})", total));
    } else {
        lines.push(format!("SEO pages ({} of {})", rows.len(), total));
    }

    for (i, row) in rows.iter().enumerate() {
        let lengths = LengthReport::new(&row.meta_title, &row.meta_description, limits);
        lines.push(format!("{} {}", format_index(i + 1), row.page.label));
        lines.push(format!(
            "{}URL: {}",
            indent(1),
            url::display_url(base_url, row.page.path)
        ));
        lines.push(format!(
            "{}Title: {} {}",
            indent(1),
            row.meta_title,
            length_tag(lengths.title)
        ));
        lines.push(format!(
            "{}Description: {} {}",
            indent(1),
            truncate_desc(&row.meta_description, 60),
            length_tag(lengths.description)
        ));
        lines.extend(keywords_line(&row.keywords));
    }
    lines
}

pub fn print_listing(rows: &[&AdminRow], total: usize, base_url: &str, limits: &LimitsConfig) {
    for line in format_listing(rows, total, base_url, limits) {
        println!("{}", line);
    }
}

/// Format a listing load failure.
pub fn format_load_error(error: &str) -> String {
    format!("Could not load stored SEO entries, showing defaults: {}", error)
}

// ============================================================================
// Resolve
// ============================================================================

pub fn format_resolved(page: &EffectiveSeoPage, canonical_url: &str) -> Vec<String> {
    let mut lines = vec![
        format!("{} → {}", page.slug, canonical_url),
        format!("{}Title: {}", indent(1), page.title),
        format!("{}Description: {}", indent(1), page.description),
    ];
    if !page.keyword_tokens.is_empty() {
        lines.push(format!(
            "{}Keywords: {}",
            indent(1),
            page.keyword_tokens.join(", ")
        ));
    }
    lines
}

pub fn print_resolved(page: &EffectiveSeoPage, canonical_url: &str) {
    for line in format_resolved(page, canonical_url) {
        println!("{}", line);
    }
}

// ============================================================================
// Save / revalidate
// ============================================================================

pub fn format_saved(entry: &SeoEntry, lengths: &LengthReport) -> Vec<String> {
    let mut lines = vec![format!("Saved {}", entry.slug)];
    if let Some(title) = &entry.meta_title {
        lines.push(format!(
            "{}Title: {} {}",
            indent(1),
            title,
            length_tag(lengths.title)
        ));
    }
    if let Some(description) = &entry.meta_description {
        lines.push(format!(
            "{}Description: {} {}",
            indent(1),
            truncate_desc(description, 60),
            length_tag(lengths.description)
        ));
    }
    lines.extend(entry.keywords.as_deref().and_then(keywords_line));
    lines
}

pub fn print_saved(entry: &SeoEntry, lengths: &LengthReport) {
    for line in format_saved(entry, lengths) {
        println!("{}", line);
    }
}

/// Reminder printed after a CLI save: the store changed, server caches did not.
pub fn format_server_cache_note(revalidate_path: &str) -> String {
    format!(
        "Store updated. A running server keeps cached pages until POST {}",
        revalidate_path
    )
}
