//! The navigation index: the catalog flattened into one ordered sequence.
//!
//! Built once from the site config at process start and immutable after
//! that. Lookup, previous/next navigation, and the sidebar projection are
//! all reads over precomputed data, safe to share across any number of
//! concurrent request handlers without synchronization.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use docpress_shared::{Category, DocpressError, Result};

/// Slug shape: kebab-case segments, optionally slash-separated
/// (`guide`, `guide/deploy`). The empty root slug is allowed separately.
static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*(?:/[a-z0-9]+(?:-[a-z0-9]+)*)*$").expect("valid regex")
});

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A catalog entry in flattened order, augmented with its owning category
/// title and computed address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatEntry {
    /// Title of the category this entry belongs to.
    pub category: String,
    /// Entry display title.
    pub title: String,
    /// Lookup key; empty for the root document.
    pub slug: String,
    /// Backing markdown file, relative to the content root.
    pub file: String,
    /// Navigable address derived from the route prefix and slug.
    pub href: String,
}

/// A lightweight reference to a neighboring page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavRef {
    pub title: String,
    pub href: String,
}

/// Previous/next pages in flattened order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<NavRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<NavRef>,
}

/// One sidebar group: a category title plus its entry links, in catalog
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarCategory {
    pub title: String,
    pub links: Vec<SidebarLink>,
}

/// A single sidebar link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarLink {
    pub title: String,
    pub href: String,
}

// ---------------------------------------------------------------------------
// NavIndex
// ---------------------------------------------------------------------------

/// The flattened, validated catalog.
#[derive(Debug, Clone)]
pub struct NavIndex {
    route_prefix: String,
    entries: Vec<FlatEntry>,
    by_slug: HashMap<String, usize>,
    sidebar: Vec<SidebarCategory>,
}

impl NavIndex {
    /// Flatten a catalog in category-then-entry order and validate it:
    /// slugs must be unique across the whole sequence, well-formed, and
    /// not the reserved `index`.
    #[instrument(skip_all, fields(categories = categories.len()))]
    pub fn new(categories: &[Category], route_prefix: &str) -> Result<Self> {
        let route_prefix = normalize_prefix(route_prefix);

        let mut entries: Vec<FlatEntry> = Vec::new();
        let mut by_slug: HashMap<String, usize> = HashMap::new();

        for category in categories {
            for entry in &category.entries {
                validate_slug(&entry.slug)?;
                let flat = FlatEntry {
                    category: category.title.clone(),
                    title: entry.title.clone(),
                    slug: entry.slug.clone(),
                    file: entry.file.clone(),
                    href: doc_href(&route_prefix, &entry.slug),
                };
                if by_slug.insert(flat.slug.clone(), entries.len()).is_some() {
                    return Err(DocpressError::validation(format!(
                        "duplicate slug {:?} in catalog",
                        flat.slug
                    )));
                }
                entries.push(flat);
            }
        }

        let sidebar = categories
            .iter()
            .map(|category| SidebarCategory {
                title: category.title.clone(),
                links: category
                    .entries
                    .iter()
                    .map(|entry| SidebarLink {
                        title: entry.title.clone(),
                        href: doc_href(&route_prefix, &entry.slug),
                    })
                    .collect(),
            })
            .collect();

        debug!(entries = entries.len(), "navigation index built");

        Ok(Self {
            route_prefix,
            entries,
            by_slug,
            sidebar,
        })
    }

    /// Exact slug lookup; the empty slug resolves the root document.
    pub fn resolve(&self, slug: &str) -> Option<&FlatEntry> {
        self.by_slug.get(slug).map(|&idx| &self.entries[idx])
    }

    /// Previous/next entries in flattened order. The first entry has no
    /// previous and the last no next; an unknown slug gets the empty
    /// result, since reporting a missing page is `resolve`'s job.
    pub fn neighbors(&self, slug: &str) -> Neighbors {
        let Some(&idx) = self.by_slug.get(slug) else {
            return Neighbors::default();
        };

        let nav_ref = |entry: &FlatEntry| NavRef {
            title: entry.title.clone(),
            href: entry.href.clone(),
        };
        Neighbors {
            previous: idx.checked_sub(1).map(|i| nav_ref(&self.entries[i])),
            next: self.entries.get(idx + 1).map(nav_ref),
        }
    }

    /// The sidebar projection, in catalog order.
    pub fn sidebar(&self) -> &[SidebarCategory] {
        &self.sidebar
    }

    /// All entries in flattened order.
    pub fn entries(&self) -> &[FlatEntry] {
        &self.entries
    }

    /// The normalized route prefix addresses are built from.
    pub fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    /// Number of entries in the flattened sequence.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Compute the address for a slug: the route prefix itself for the root
/// document, `prefix/slug` otherwise.
pub fn doc_href(route_prefix: &str, slug: &str) -> String {
    if slug.is_empty() {
        if route_prefix.is_empty() {
            "/".to_string()
        } else {
            route_prefix.to_string()
        }
    } else if route_prefix.is_empty() {
        format!("/{slug}")
    } else {
        format!("{route_prefix}/{slug}")
    }
}

/// Normalize a configured prefix: leading slash on, trailing slash off.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn validate_slug(slug: &str) -> Result<()> {
    // the root document's payload is written as index.json, so this slug
    // would shadow it on disk
    if slug == "index" {
        return Err(DocpressError::validation(
            "slug \"index\" is reserved for the root document (use an empty slug)",
        ));
    }
    if slug.is_empty() || SLUG_RE.is_match(slug) {
        return Ok(());
    }
    Err(DocpressError::validation(format!(
        "invalid slug {slug:?}: expected kebab-case segments like \"guide/deploy\""
    )))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
