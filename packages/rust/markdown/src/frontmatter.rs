//! Frontmatter extraction: the optional YAML header between `---` lines.
//!
//! Parsing never fails. A malformed header degrades to "no metadata" with
//! the whole input treated as the document body; each degrade is logged so
//! operators can find it, and `docpress check` reports them explicitly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Header delimiter. Must be the entire line; trailing carriage returns
/// are tolerated.
const DELIMITER: &str = "---";

// ---------------------------------------------------------------------------
// Frontmatter
// ---------------------------------------------------------------------------

/// Parsed document metadata.
///
/// `title` and `description` get first-class fields; any other keys the
/// author writes are preserved in `extra` in sorted key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Page title, overriding the catalog entry title when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Short summary used for page metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Remaining key/value pairs, passed through untouched.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Frontmatter {
    /// True when no metadata at all was found.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.extra.is_empty()
    }
}

/// Operator-facing classification of a document's header, used by site
/// checks. `parse` itself never distinguishes these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterStatus {
    /// No header block.
    Absent,
    /// A delimited block that parses cleanly.
    Valid,
    /// A delimited block the YAML parser rejects. The pipeline degrades
    /// these to empty metadata.
    Malformed,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Split a raw document into metadata and body.
///
/// Returns empty metadata with the whole input as body when the header is
/// absent, unterminated, or malformed. Never fails.
pub(crate) fn extract(raw: &str) -> (Frontmatter, &str) {
    match scan(raw) {
        Scan::Absent => (Frontmatter::default(), raw),
        Scan::Unterminated => {
            // A lone leading `---` is also legal markdown (thematic break),
            // so this is not worth an operator warning.
            debug!("unterminated frontmatter delimiter, treating whole input as body");
            (Frontmatter::default(), raw)
        }
        Scan::Block { yaml, body } => match parse_block(yaml) {
            Ok(frontmatter) => (frontmatter, body),
            Err(e) => {
                warn!(error = %e, "malformed frontmatter, treating whole input as body");
                (Frontmatter::default(), raw)
            }
        },
    }
}

/// Classify the header of a raw document without rendering it.
pub fn inspect(raw: &str) -> FrontmatterStatus {
    match scan(raw) {
        Scan::Absent | Scan::Unterminated => FrontmatterStatus::Absent,
        Scan::Block { yaml, .. } => match parse_block(yaml) {
            Ok(_) => FrontmatterStatus::Valid,
            Err(_) => FrontmatterStatus::Malformed,
        },
    }
}

/// Result of scanning the raw text for a delimited header block.
enum Scan<'a> {
    /// First line is not a delimiter.
    Absent,
    /// Opening delimiter without a closing one.
    Unterminated,
    /// The YAML between the delimiters, and the body after the closing one.
    Block { yaml: &'a str, body: &'a str },
}

fn scan(raw: &str) -> Scan<'_> {
    let mut lines = raw.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Scan::Absent;
    };
    if trim_line_end(first) != DELIMITER {
        return Scan::Absent;
    }

    let mut offset = first.len();
    for line in lines {
        if trim_line_end(line) == DELIMITER {
            return Scan::Block {
                yaml: &raw[first.len()..offset],
                body: &raw[offset + line.len()..],
            };
        }
        offset += line.len();
    }
    Scan::Unterminated
}

fn trim_line_end(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}

/// Parse the YAML between the delimiters. An empty or whitespace-only
/// block is a well-formed empty header.
fn parse_block(yaml: &str) -> serde_yaml::Result<Frontmatter> {
    let parsed: Option<Frontmatter> = serde_yaml::from_str(yaml)?;
    Ok(parsed.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
