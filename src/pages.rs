//! Compiled-in SEO configuration for every public page.
//!
//! The table is the source of truth for which pages exist. A slug missing
//! here is a programming error, not a runtime condition: the resolver reports
//! it as [`ResolveError::ConfigNotFound`](crate::resolve::ResolveError) and the
//! head builder falls back to the site-wide defaults below.
//!
//! Order matters: the admin listing shows pages in declaration order.

use crate::types::SeoPageConfig;

/// Site-wide fallback title, used when a slug has no config entry.
pub const DEFAULT_TITLE: &str = "Bright Leasing | Novated Leasing Made Easy";

/// Site-wide fallback description.
pub const DEFAULT_DESCRIPTION: &str = "The smartest way to own and run a car. Novated leasing made easy — save money, skip the hassle, and enjoy the car you really want.";

/// Site-wide fallback keywords.
pub const DEFAULT_KEYWORDS: &str =
    "novated leasing, salary packaging, car leasing, vehicle finance, Bright Leasing";

/// Cached path of the admin SEO listing. Invalidated on every save.
pub const ADMIN_SEO_PATH: &str = "/admin/seo";

/// Every known public page, in admin display order.
pub const PAGES: &[SeoPageConfig] = &[
    SeoPageConfig {
        slug: "home",
        path: "/",
        label: "Home",
        default_title: DEFAULT_TITLE,
        default_description: DEFAULT_DESCRIPTION,
        default_keywords: Some(DEFAULT_KEYWORDS),
        revalidate_paths: &[],
    },
    SeoPageConfig {
        slug: "about",
        path: "/about-us",
        label: "About Us",
        default_title: "About Us | Bright Leasing",
        default_description: "Learn about Bright Leasing and our mission to make car ownership simple and affordable through novated leasing.",
        default_keywords: Some(
            "about Bright Leasing, novated leasing company, car leasing experts",
        ),
        revalidate_paths: &[],
    },
    SeoPageConfig {
        slug: "contact",
        path: "/contact",
        label: "Contact",
        default_title: "Contact Us | Bright Leasing",
        default_description: "Get in touch with Bright Leasing. Have questions about novated leasing? We're here to help!",
        default_keywords: Some(
            "contact Bright Leasing, novated leasing inquiry, car leasing contact",
        ),
        revalidate_paths: &[],
    },
    SeoPageConfig {
        slug: "blog",
        path: "/blog",
        label: "Blog",
        default_title: "Blog | Bright Leasing",
        default_description: "Read the latest articles and insights about novated leasing, car ownership, and vehicle finance.",
        default_keywords: Some(
            "novated leasing blog, car leasing articles, vehicle finance tips",
        ),
        revalidate_paths: &[],
    },
    SeoPageConfig {
        slug: "faqs",
        path: "/faqs",
        label: "FAQs",
        default_title: "Frequently Asked Questions | Bright Leasing",
        default_description: "Find answers to common questions about novated leasing, salary packaging, and car ownership.",
        default_keywords: Some(
            "novated leasing FAQ, salary packaging questions, car leasing FAQ",
        ),
        revalidate_paths: &[],
    },
    SeoPageConfig {
        slug: "team",
        path: "/team",
        label: "Team",
        default_title: "Our Team | Bright Leasing",
        default_description: "Meet the team at Bright Leasing, dedicated to making your car ownership journey simple and affordable.",
        default_keywords: Some(
            "Bright Leasing team, novated leasing experts, car leasing professionals",
        ),
        revalidate_paths: &[],
    },
    SeoPageConfig {
        slug: "privacy-policy",
        path: "/privacy-policy",
        label: "Privacy Policy",
        default_title: "Privacy Policy | Bright Leasing",
        default_description: "Read our privacy policy to understand how Bright Leasing collects, uses, and protects your personal information.",
        default_keywords: Some("privacy policy, data protection, Bright Leasing privacy"),
        revalidate_paths: &[],
    },
    SeoPageConfig {
        slug: "terms-and-conditions",
        path: "/terms-and-conditions",
        label: "Terms and Conditions",
        default_title: "Terms and Conditions | Bright Leasing",
        default_description: "Review the terms and conditions for using Bright Leasing services and novated leasing products.",
        default_keywords: Some(
            "terms and conditions, Bright Leasing terms, novated leasing terms",
        ),
        revalidate_paths: &[],
    },
    SeoPageConfig {
        slug: "terms-of-use",
        path: "/terms-of-use",
        label: "Terms of Use",
        default_title: "Terms of Use | Bright Leasing",
        default_description: "Read the terms of use for the Bright Leasing website and online services.",
        default_keywords: Some("terms of use, website terms, Bright Leasing terms"),
        revalidate_paths: &[],
    },
];

/// Find a page config by slug.
pub fn find_by_slug<'a>(pages: &'a [SeoPageConfig], slug: &str) -> Option<&'a SeoPageConfig> {
    pages.iter().find(|p| p.slug == slug)
}

/// Find a page config by its site-relative path.
///
/// A trailing slash is ignored except for the root path.
pub fn find_by_path<'a>(pages: &'a [SeoPageConfig], path: &str) -> Option<&'a SeoPageConfig> {
    let normalized = match path.trim_end_matches('/') {
        "" => "/",
        p => p,
    };
    pages.iter().find(|p| p.path == normalized)
}
