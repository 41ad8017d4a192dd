//! Site health check: verify every catalog entry has a readable source
//! and a well-formed frontmatter header.
//!
//! Rendering degrades malformed frontmatter silently; this is where those
//! problems become visible to an operator before a deploy.

use std::path::Path;

use tracing::{info, instrument, warn};

use docpress_markdown::FrontmatterStatus;
use docpress_nav::NavIndex;

/// Outcome of a site check.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    /// Entries that read and parsed without degradation.
    pub ok: usize,
    /// Entries whose backing file could not be read, as `(slug, message)`.
    pub missing: Vec<(String, String)>,
    /// Slugs whose frontmatter block is malformed; rendering falls back
    /// to empty metadata for these.
    pub degraded: Vec<String>,
}

impl CheckReport {
    /// Missing sources fail a check. Degraded frontmatter is a warning
    /// only, since rendering still succeeds.
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Check every catalog entry against the content on disk.
#[instrument(skip_all, fields(pages = nav.len()))]
pub async fn check_site(nav: &NavIndex, content_root: &Path) -> CheckReport {
    let mut report = CheckReport::default();

    for entry in nav.entries() {
        let path = content_root.join(&entry.file);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    slug = %entry.slug,
                    path = %path.display(),
                    error = %e,
                    "catalog entry has no readable source"
                );
                report.missing.push((entry.slug.clone(), e.to_string()));
                continue;
            }
        };

        match docpress_markdown::inspect_frontmatter(&raw) {
            FrontmatterStatus::Malformed => {
                warn!(
                    slug = %entry.slug,
                    path = %path.display(),
                    "malformed frontmatter, page will render without metadata"
                );
                report.degraded.push(entry.slug.clone());
            }
            FrontmatterStatus::Absent | FrontmatterStatus::Valid => report.ok += 1,
        }
    }

    info!(
        ok = report.ok,
        missing = report.missing.len(),
        degraded = report.degraded.len(),
        "site check finished"
    );
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
