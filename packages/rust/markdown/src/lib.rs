//! The document pipeline: frontmatter extraction, markdown rendering with
//! stable heading anchors, and syntax-highlighted code fences.
//!
//! [`parse`] is infallible by contract: malformed metadata and failed
//! highlighting degrade to safe fallbacks (empty metadata, plain code)
//! rather than erroring. Only [`load_and_parse`] can fail, and only on I/O.
//! Documents are parsed fresh on every call; nothing is cached.

mod frontmatter;
mod highlight;
mod render;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use docpress_shared::{DocpressError, Result};

pub use frontmatter::{Frontmatter, FrontmatterStatus, inspect as inspect_frontmatter};
pub use highlight::highlight;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A heading anchor collected during rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Anchor id, unique within the document, derived from the text.
    pub id: String,
    /// The heading's plain text.
    pub text: String,
    /// Heading level, 1 through 6 (2 and 3 in practice).
    pub level: u8,
}

/// Result of parsing one raw document. Produced per load, never persisted.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Rendered HTML for the document body.
    pub markup: String,
    /// Heading anchors in document order.
    pub headings: Vec<Heading>,
    /// Parsed frontmatter; empty when the header is absent or malformed.
    pub metadata: Frontmatter,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Parse a raw document into markup, headings, and metadata.
///
/// 1. Split off the optional `---`-delimited YAML header. A malformed or
///    unterminated header degrades to empty metadata with the whole input
///    kept as the body.
/// 2. Render the body to HTML: every heading gets a deterministic anchor
///    id, and every fenced code block is replaced by its highlighted
///    markup. Fences highlight concurrently; source order is preserved.
/// 3. Collect the headings side channel.
///
/// Never fails. Rendering the same input twice yields identical output.
#[instrument(skip(raw), fields(len = raw.len()))]
pub async fn parse(raw: &str) -> ParsedDocument {
    let (metadata, body) = frontmatter::extract(raw);
    let rendered = render::render(body).await;

    debug!(
        headings = rendered.headings.len(),
        markup_len = rendered.html.len(),
        has_title = metadata.title.is_some(),
        "document parsed"
    );

    ParsedDocument {
        markup: rendered.html,
        headings: rendered.headings,
        metadata,
    }
}

/// Read a file and parse it.
///
/// The one fallible call in the pipeline: an unreadable file surfaces as
/// an I/O error and no partial document is produced.
#[instrument(fields(path = %path.display()))]
pub async fn load_and_parse(path: &Path) -> Result<ParsedDocument> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DocpressError::io(path, e))?;
    Ok(parse(&raw).await)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
