//! Core domain types for the docpress catalog.
//!
//! The catalog is fixed configuration: an ordered list of categories, each
//! holding an ordered list of entries. It is read once at process start and
//! never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Current schema version for the emitted `site.json` manifest.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// CatalogEntry
// ---------------------------------------------------------------------------

/// A single document in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Display title used in the sidebar and as the page-title fallback.
    pub title: String,

    /// Identifying path segment. The empty string denotes the root
    /// document; otherwise kebab-case segments, optionally slash-separated
    /// (`guide`, `guide/deploy`). Unique across the whole catalog.
    #[serde(default)]
    pub slug: String,

    /// Markdown file backing this entry, relative to the content root.
    pub file: String,
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// An ordered group of catalog entries under one sidebar heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category heading shown in the sidebar.
    pub title: String,

    /// Entries in display and navigation order.
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_slug_defaults_to_root() {
        let entry: CatalogEntry = toml::from_str(
            r#"
title = "Introduction"
file = "index.md"
"#,
        )
        .expect("parse entry");
        assert_eq!(entry.slug, "");
        assert_eq!(entry.file, "index.md");
    }

    #[test]
    fn category_serialization_roundtrip() {
        let category = Category {
            title: "Guides".into(),
            entries: vec![
                CatalogEntry {
                    title: "Routing".into(),
                    slug: "guide/routing".into(),
                    file: "guide/routing.md".into(),
                },
                CatalogEntry {
                    title: "Deployment".into(),
                    slug: "guide/deploy".into(),
                    file: "guide/deploy.md".into(),
                },
            ],
        };

        let toml_str = toml::to_string_pretty(&category).expect("serialize");
        let parsed: Category = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed, category);
    }

    #[test]
    fn catalog_fixture_validates() {
        #[derive(Deserialize)]
        struct CatalogFile {
            categories: Vec<Category>,
        }

        let fixture = std::fs::read_to_string("../../../fixtures/toml/catalog.fixture.toml")
            .expect("read fixture");
        let parsed: CatalogFile = toml::from_str(&fixture).expect("parse fixture catalog");
        assert_eq!(parsed.categories.len(), 2);
        assert_eq!(parsed.categories[0].title, "Getting Started");
        assert_eq!(parsed.categories[0].entries[0].slug, "");
    }
}
