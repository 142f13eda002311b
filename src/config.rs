//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by the user's file, and the base URL can additionally be
//! overridden by the `SITE_BASE_URL` environment variable.
//!
//! The loaded [`SiteConfig`] is immutable and process-wide: it is built once
//! in `main` and handed to the resolver, dispatcher and server at
//! construction. Nothing reads the environment ad hoc after that.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! base_url = "https://brightleasing.com.au"  # Canonical URL prefix
//! name = "Bright Leasing"
//!
//! [store]
//! path = "seo-entries.json"  # JSON file holding stored overrides
//!
//! [serve]
//! interface = "127.0.0.1"
//! port = 4000
//! threads = 4                # Request worker threads
//!
//! [limits]
//! title = 60                 # Recommended, never enforced
//! description = 155
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! [serve]
//! port = 8080
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::url::ensure_absolute_url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding `site.base_url`.
pub const BASE_URL_ENV: &str = "SITE_BASE_URL";

/// Hardcoded base URL used when neither the env var nor the file sets one.
pub const FALLBACK_BASE_URL: &str = "https://brightleasing.com.au";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Public site identity (base URL, name).
    pub site: SiteSection,
    /// Where stored overrides live.
    pub store: StoreConfig,
    /// HTTP server settings.
    pub serve: ServeConfig,
    /// Recommended field lengths for the admin indicators.
    pub limits: LimitsConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site.base_url must not be empty".into(),
            ));
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation("store.path must not be empty".into()));
        }
        if self.serve.threads == 0 {
            return Err(ConfigError::Validation(
                "serve.threads must be at least 1".into(),
            ));
        }
        if self.limits.title == 0 || self.limits.description == 0 {
            return Err(ConfigError::Validation(
                "limits.title and limits.description must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Base URL without a trailing slash, so `base_url() + path` is canonical.
    pub fn base_url(&self) -> &str {
        self.site.base_url.trim_end_matches('/')
    }

    /// Replace the base URL with `value` if it is present and non-blank.
    ///
    /// The value is normalized to an absolute `https://` URL.
    pub fn apply_base_url_override(&mut self, value: Option<&str>) {
        if let Some(url) = value.and_then(ensure_absolute_url) {
            self.site.base_url = url;
        }
    }
}

/// Public site identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    /// Prefix for canonical and Open Graph URLs.
    pub base_url: String,
    /// Site name, used for `og:site_name`.
    pub name: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            base_url: FALLBACK_BASE_URL.to_string(),
            name: "Bright Leasing".to_string(),
        }
    }
}

/// Storage settings for the file-backed store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// JSON file holding stored overrides, keyed by slug.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("seo-entries.json"),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    pub interface: IpAddr,
    pub port: u16,
    /// Number of request worker threads.
    pub threads: usize,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 4000,
            threads: 4,
        }
    }
}

/// Recommended lengths, in characters. Over-limit values are flagged, never
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    pub title: usize,
    pub description: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            title: 60,
            description: 155,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, apply the base URL override,
/// then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
    base_url_override: Option<&str>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let mut config: SiteConfig = merged.try_into()?;
    config.apply_base_url_override(base_url_override);
    config.validate()?;
    Ok(config)
}

/// Load config from the given file path.
///
/// Merges user values on top of stock defaults, rejects unknown keys, applies
/// `SITE_BASE_URL` when set, and validates the result. A missing file yields
/// the stock defaults.
pub fn load_config(config_path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(config_path)?;
    let env_base_url = std::env::var(BASE_URL_ENV).ok();
    resolve_config(base, overlay, env_base_url.as_deref())
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pagemeta Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
# Prefix for canonical and Open Graph URLs. The SITE_BASE_URL environment
# variable takes precedence over this value when set.
base_url = "https://brightleasing.com.au"

# Site name, emitted as og:site_name.
name = "Bright Leasing"

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[store]
# JSON file holding the stored SEO overrides, keyed by page slug.
path = "seo-entries.json"

# ---------------------------------------------------------------------------
# HTTP server (pagemeta serve)
# ---------------------------------------------------------------------------
[serve]
interface = "127.0.0.1"
port = 4000

# Request worker threads.
threads = 4

# ---------------------------------------------------------------------------
# Recommended field lengths (characters)
# ---------------------------------------------------------------------------
# Longer values are flagged in the admin listing but still saved.
[limits]
title = 60
description = 155
"##
}
