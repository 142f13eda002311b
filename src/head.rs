//! Page `<head>` metadata: the public page-render boundary.
//!
//! Callers hand in a slug and optional field-level overrides and get back a
//! [`PageMetadata`]: title, description, keyword list, canonical URL, robots
//! directives, and Open Graph / Twitter card fields. [`render_head`] turns it
//! into tags with maud, so every interpolated value is escaped.
//!
//! ## Fallbacks
//!
//! Rendering never fails. A slug with no page config is a programming error,
//! but the page still gets the site-wide defaults (canonical `/`) and the
//! miss is logged. Store outages are absorbed one level down by the resolver.
//!
//! ## Overrides
//!
//! Overrides replace the resolved value before the social fields are filled,
//! so `og:title` and `twitter:title` always mirror the final `<title>`.
//!
//! ## Posts
//!
//! Blog posts carry their own SEO fields instead of a page-config row.
//! [`build_post_metadata`] resolves them against the post itself: stored
//! meta title → post title, stored meta description → excerpt → site
//! description. Blank values fall through.

use crate::pages::{DEFAULT_DESCRIPTION, DEFAULT_KEYWORDS, DEFAULT_TITLE};
use crate::resolve::{Resolution, ResolveError, SeoResolver, first_non_blank, split_keywords};
use crate::store::SeoStore;
use crate::url;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Robots directives. Every public page is indexable with full previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Robots {
    pub index: bool,
    pub follow: bool,
    /// `-1` means no limit.
    pub max_video_preview: i32,
    pub max_image_preview: &'static str,
    /// `-1` means no limit.
    pub max_snippet: i32,
}

impl Default for Robots {
    fn default() -> Self {
        Self {
            index: true,
            follow: true,
            max_video_preview: -1,
            max_image_preview: "large",
            max_snippet: -1,
        }
    }
}

impl Robots {
    /// Render as a `content` attribute value.
    pub fn content(&self) -> String {
        format!(
            "{}, {}, max-image-preview:{}, max-snippet:{}, max-video-preview:{}",
            if self.index { "index" } else { "noindex" },
            if self.follow { "follow" } else { "nofollow" },
            self.max_image_preview,
            self.max_snippet,
            self.max_video_preview,
        )
    }
}

/// `og:type` values used by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OgType {
    Website,
    Article,
}

impl OgType {
    pub fn as_str(self) -> &'static str {
        match self {
            OgType::Website => "website",
            OgType::Article => "article",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenGraph {
    pub title: String,
    pub description: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: OgType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    pub site_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TwitterCard {
    pub card: &'static str,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// Everything a page needs in its `<head>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub canonical_url: String,
    pub robots: Robots,
    pub open_graph: OpenGraph,
    pub twitter: TwitterCard,
}

/// Field-level overrides supplied by the page being rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataOverrides {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub canonical_url: Option<String>,
    pub robots: Option<Robots>,
    /// Social preview images.
    pub images: Option<Vec<String>>,
}

/// Resolved values before overrides and mirroring.
struct BaseFields {
    title: String,
    description: String,
    keywords: Vec<String>,
    canonical_url: String,
    kind: OgType,
    images: Vec<String>,
}

fn assemble(base: BaseFields, site_name: &str, overrides: &MetadataOverrides) -> PageMetadata {
    let title = overrides.title.clone().unwrap_or(base.title);
    let description = overrides.description.clone().unwrap_or(base.description);
    let keywords = overrides.keywords.clone().unwrap_or(base.keywords);
    let canonical_url = overrides
        .canonical_url
        .clone()
        .unwrap_or(base.canonical_url);
    let images = overrides.images.clone().unwrap_or(base.images);

    PageMetadata {
        open_graph: OpenGraph {
            title: title.clone(),
            description: description.clone(),
            url: canonical_url.clone(),
            kind: base.kind,
            images: images.clone(),
            site_name: site_name.to_string(),
        },
        twitter: TwitterCard {
            card: "summary_large_image",
            title: title.clone(),
            description: description.clone(),
            images,
        },
        robots: overrides.robots.unwrap_or_default(),
        title,
        description,
        keywords,
        canonical_url,
    }
}

/// Metadata for a configured public page.
///
/// Never fails: an unconfigured slug gets the site-wide defaults.
pub async fn build_page_metadata<S: SeoStore>(
    resolver: &SeoResolver<S>,
    slug: &str,
    overrides: &MetadataOverrides,
) -> PageMetadata {
    page_metadata_with_status(resolver, slug, overrides).await.0
}

/// [`build_page_metadata`] plus whether a failed store read forced defaults.
/// A degraded result must not be cached.
pub async fn page_metadata_with_status<S: SeoStore>(
    resolver: &SeoResolver<S>,
    slug: &str,
    overrides: &MetadataOverrides,
) -> (PageMetadata, bool) {
    let (base, degraded) = match resolver.resolve_with_status(slug).await {
        Ok(Resolution { page, degraded }) => (
            BaseFields {
                canonical_url: url::join(resolver.base_url(), &page.path),
                title: page.title,
                description: page.description,
                keywords: page.keyword_tokens,
                kind: OgType::Website,
                images: Vec::new(),
            },
            degraded,
        ),
        Err(ResolveError::ConfigNotFound(_)) => {
            warn!(slug, "no SEO config for page, using site defaults");
            (site_defaults(resolver.base_url()), false)
        }
    };
    (assemble(base, resolver.site_name(), overrides), degraded)
}

fn site_defaults(base_url: &str) -> BaseFields {
    BaseFields {
        title: DEFAULT_TITLE.to_string(),
        description: DEFAULT_DESCRIPTION.to_string(),
        keywords: split_keywords(Some(DEFAULT_KEYWORDS)),
        canonical_url: url::join(base_url, "/"),
        kind: OgType::Website,
        images: Vec::new(),
    }
}

/// SEO-relevant fields of a blog post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostSeo {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

/// Metadata for a blog post published under `base_path` (e.g. `/blog/posts`).
pub fn build_post_metadata(
    post: &PostSeo,
    base_url: &str,
    site_name: &str,
    base_path: &str,
    overrides: &MetadataOverrides,
) -> PageMetadata {
    let title = first_non_blank(&[post.meta_title.as_deref()]).unwrap_or(post.title.as_str());
    let description = first_non_blank(&[
        post.meta_description.as_deref(),
        post.excerpt.as_deref(),
    ])
    .unwrap_or(DEFAULT_DESCRIPTION);
    let keywords = first_non_blank(&[post.keywords.as_deref()]);
    let path = format!("{}/{}", base_path.trim_end_matches('/'), post.slug);

    let base = BaseFields {
        title: title.to_string(),
        description: description.to_string(),
        keywords: split_keywords(keywords),
        canonical_url: url::join(base_url, &path),
        kind: OgType::Article,
        images: post
            .cover_image
            .as_deref()
            .and_then(url::ensure_absolute_url)
            .into_iter()
            .collect(),
    };
    assemble(base, site_name, overrides)
}

/// Render `<head>` children for a page.
pub fn render_head(page: &PageMetadata) -> Markup {
    let robots = page.robots.content();
    html! {
        title { (page.title) }
        meta name="description" content=(page.description);
        @if !page.keywords.is_empty() {
            meta name="keywords" content=(page.keywords.join(", "));
        }
        meta name="robots" content=(robots);
        meta name="googlebot" content=(robots);
        link rel="canonical" href=(page.canonical_url);
        meta property="og:title" content=(page.open_graph.title);
        meta property="og:description" content=(page.open_graph.description);
        meta property="og:url" content=(page.open_graph.url);
        meta property="og:type" content=(page.open_graph.kind.as_str());
        meta property="og:site_name" content=(page.open_graph.site_name);
        @for image in &page.open_graph.images {
            meta property="og:image" content=(image);
        }
        meta name="twitter:card" content=(page.twitter.card);
        meta name="twitter:title" content=(page.twitter.title);
        meta name="twitter:description" content=(page.twitter.description);
        @for image in &page.twitter.images {
            meta name="twitter:image" content=(image);
        }
    }
}
