//! Single-page rendering: resolve a slug against the navigation index,
//! parse the backing document, and assemble the request-facing payload.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use docpress_markdown::{Heading, ParsedDocument};
use docpress_nav::{FlatEntry, NavIndex, NavRef, Neighbors};
use docpress_shared::{DocpressError, Result};

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Everything a page view needs: the rendered document plus its place in
/// the navigation sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagePayload {
    /// The slug this page was resolved under; empty for the root document.
    pub slug: String,
    /// Navigable address of this page.
    pub href: String,
    /// Frontmatter title, falling back to the catalog entry title.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rendered HTML for the document body.
    pub markup: String,
    /// Document outline in source order.
    pub headings: Vec<Heading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<NavRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<NavRef>,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the page registered under `slug`.
///
/// Returns [`DocpressError::NotFound`] both for slugs absent from the
/// catalog and for catalog entries whose backing file cannot be read: the
/// caller sees one uniform "no such page" outcome, while the read failure
/// itself is logged for the operator.
#[instrument(skip(nav, content_root))]
pub async fn render_page(nav: &NavIndex, content_root: &Path, slug: &str) -> Result<PagePayload> {
    let Some(entry) = nav.resolve(slug) else {
        debug!(slug, "slug not in catalog");
        return Err(DocpressError::not_found(slug));
    };

    let path = content_root.join(&entry.file);
    let parsed = match docpress_markdown::load_and_parse(&path).await {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(
                slug,
                path = %path.display(),
                error = %e,
                "catalog entry has no readable source"
            );
            return Err(DocpressError::not_found(slug));
        }
    };

    Ok(assemble_payload(entry, parsed, nav.neighbors(slug)))
}

/// Combine a catalog entry, its parsed document, and its neighbors into
/// the payload. The frontmatter title wins over the catalog title when
/// present.
pub(crate) fn assemble_payload(
    entry: &FlatEntry,
    parsed: ParsedDocument,
    neighbors: Neighbors,
) -> PagePayload {
    let ParsedDocument {
        markup,
        headings,
        metadata,
    } = parsed;

    PagePayload {
        slug: entry.slug.clone(),
        href: entry.href.clone(),
        title: metadata.title.unwrap_or_else(|| entry.title.clone()),
        description: metadata.description,
        markup,
        headings,
        previous: neighbors.previous,
        next: neighbors.next,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
