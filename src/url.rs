//! URL helpers for canonical links and admin display.

/// Normalize a possibly scheme-less URL to an absolute `https://` URL.
///
/// - `"https://x.com"` / `"http://x.com"` → unchanged (trimmed)
/// - `"//x.com"` → `"https://x.com"`
/// - `"x.com"` → `"https://x.com"`
/// - blank → `None`
pub fn ensure_absolute_url(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Some(trimmed.to_string());
    }
    if let Some(rest) = trimmed.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    Some(format!("https://{trimmed}"))
}

/// Join a base URL and a site-relative path without doubling the slash.
pub fn join(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Admin display form of a page URL: scheme stripped, host uppercased.
///
/// `("https://brightleasing.com.au", "/faqs")` → `"BRIGHTLEASING.COM.AU/faqs"`
pub fn display_url(base_url: &str, path: &str) -> String {
    let host = base_url
        .strip_prefix("https://")
        .or_else(|| base_url.strip_prefix("http://"))
        .unwrap_or(base_url)
        .trim_end_matches('/');
    format!("{}{}", host.to_uppercase(), path)
}
