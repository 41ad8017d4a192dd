//! Site configuration for docpress.
//!
//! Each documentation site is described by a `docpress.toml` at the site
//! root: the `[site]` settings plus the ordered `[[categories]]` catalog.
//! The file is read once at process start and treated as immutable for the
//! process lifetime.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocpressError, Result};
use crate::types::{CatalogEntry, Category};

/// Site configuration file name, looked up at the site root.
pub const SITE_CONFIG_FILE: &str = "docpress.toml";

// ---------------------------------------------------------------------------
// Config structs (matching docpress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level site config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// `[site]` settings.
    #[serde(default)]
    pub site: SiteMeta,

    /// The document catalog, in sidebar and navigation order.
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteMeta {
    /// Site title, shown in the build manifest and page chrome.
    #[serde(default = "default_title")]
    pub title: String,

    /// Fixed address prefix for document routes.
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,

    /// Directory holding the markdown content, relative to the site root.
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// Directory the static build writes into, relative to the site root.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: default_title(),
            route_prefix: default_route_prefix(),
            content_dir: default_content_dir(),
            out_dir: default_out_dir(),
        }
    }
}

fn default_title() -> String {
    "Documentation".into()
}
fn default_route_prefix() -> String {
    "/docs".into()
}
fn default_content_dir() -> String {
    "content".into()
}
fn default_out_dir() -> String {
    "dist".into()
}

impl SiteConfig {
    /// Absolute content directory for a site rooted at `site_root`.
    pub fn content_root(&self, site_root: &Path) -> PathBuf {
        site_root.join(&self.site.content_dir)
    }

    /// Absolute build output directory for a site rooted at `site_root`.
    pub fn out_root(&self, site_root: &Path) -> PathBuf {
        site_root.join(&self.site.out_dir)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Path to the config file for a site rooted at `site_root`.
pub fn site_config_path(site_root: &Path) -> PathBuf {
    site_root.join(SITE_CONFIG_FILE)
}

/// Load the site config for the site rooted at `site_root`.
///
/// A missing file is a hard error: a site without a catalog has nothing to
/// serve, so failing early with a hint beats silently building nothing.
pub fn load_site_config(site_root: &Path) -> Result<SiteConfig> {
    let path = site_config_path(site_root);

    if !path.exists() {
        return Err(DocpressError::config(format!(
            "no {SITE_CONFIG_FILE} found in {}.\n\
             Run `docpress init` to scaffold a new site.",
            site_root.display()
        )));
    }

    load_site_config_from(&path)
}

/// Load a site config from a specific file path.
pub fn load_site_config_from(path: &Path) -> Result<SiteConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocpressError::io(path, e))?;

    let config: SiteConfig = toml::from_str(&content).map_err(|e| {
        DocpressError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    tracing::debug!(
        path = %path.display(),
        categories = config.categories.len(),
        "loaded site config"
    );
    Ok(config)
}

/// Scaffold a new site: write a starter `docpress.toml` and a starter
/// content page. Returns the path to the created config file.
///
/// Refuses to overwrite an existing config.
pub fn init_site(site_root: &Path) -> Result<PathBuf> {
    let path = site_config_path(site_root);
    if path.exists() {
        return Err(DocpressError::config(format!(
            "{} already exists, refusing to overwrite",
            path.display()
        )));
    }

    std::fs::create_dir_all(site_root).map_err(|e| DocpressError::io(site_root, e))?;

    let config = starter_config();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocpressError::config(e.to_string()))?;
    std::fs::write(&path, content).map_err(|e| DocpressError::io(&path, e))?;

    let content_dir = config.content_root(site_root);
    std::fs::create_dir_all(&content_dir).map_err(|e| DocpressError::io(&content_dir, e))?;

    let page_path = content_dir.join("index.md");
    std::fs::write(&page_path, STARTER_PAGE).map_err(|e| DocpressError::io(&page_path, e))?;

    tracing::info!(path = %path.display(), "created starter site");
    Ok(path)
}

/// The catalog a freshly scaffolded site starts with.
fn starter_config() -> SiteConfig {
    SiteConfig {
        site: SiteMeta::default(),
        categories: vec![Category {
            title: "Getting Started".into(),
            entries: vec![CatalogEntry {
                title: "Introduction".into(),
                slug: String::new(),
                file: "index.md".into(),
            }],
        }],
    }
}

const STARTER_PAGE: &str = r#"---
title: Introduction
description: What this site covers and where to start.
---

Welcome to your new documentation site.

## Add a page

Create a markdown file under `content/` and register it in
`docpress.toml`:

```toml
[[categories.entries]]
title = "My Page"
slug = "my-page"
file = "my-page.md"
```

## Build

```shell
docpress build
```
"#;
