//! The static site build: render every catalog entry to a JSON payload on
//! disk, plus the navigation and site manifests.
//!
//! Layout under the output root:
//!
//! ```text
//! dist/
//! ├── pages/
//! │   ├── index.json          <- root document (empty slug)
//! │   ├── getting-started.json
//! │   └── guide/
//! │       └── routing.json    <- nested slugs become nested directories
//! ├── nav.json                <- route prefix + sidebar projection
//! └── site.json               <- build manifest
//! ```
//!
//! Builds are incremental: `site.json` records per page a source hash
//! and a navigation-context fingerprint. A page is skipped only when
//! both match the previous build and its payload is still on disk, so a
//! catalog edit rebuilds the pages whose title, address, or neighbors
//! shifted even though their sources did not change. A forced build
//! rebuilds everything.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use docpress_nav::{FlatEntry, NavIndex, Neighbors, SidebarCategory};
use docpress_shared::{CURRENT_SCHEMA_VERSION, DocpressError, Result};

use crate::page::assemble_payload;

// ---------------------------------------------------------------------------
// Config and results
// ---------------------------------------------------------------------------

/// Inputs for one site build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Site title recorded in the manifest.
    pub site_title: String,
    /// Directory the catalog's `file` paths are relative to.
    pub content_root: PathBuf,
    /// Directory the build writes into.
    pub out_root: PathBuf,
    /// Generator version recorded in the manifest.
    pub generator_version: String,
    /// Whether to delete payloads for pages no longer in the catalog.
    pub prune: bool,
    /// Rebuild every page even when hashes match.
    pub force: bool,
}

/// What a build did.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub pages_written: usize,
    pub pages_skipped: usize,
    pub pages_pruned: usize,
    /// Per-page failures as `(slug, message)`; the build keeps going.
    pub errors: Vec<(String, String)>,
    pub elapsed: Duration,
}

/// Progress callbacks for long builds.
pub trait ProgressReporter: Send + Sync {
    fn phase(&self, name: &str);
    fn page_rendered(&self, slug: &str);
    fn done(&self, result: &BuildResult);
}

/// No-op reporter for tests and library callers.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_rendered(&self, _slug: &str) {}
    fn done(&self, _result: &BuildResult) {}
}

// ---------------------------------------------------------------------------
// Manifests
// ---------------------------------------------------------------------------

/// `site.json`: the build manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteManifest {
    pub schema_version: u32,
    pub site_title: String,
    pub generator_version: String,
    pub built_at: DateTime<Utc>,
    pub page_count: usize,
    pub pages: Vec<PageRecord>,
}

/// One built page in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub slug: String,
    pub href: String,
    /// Catalog entry title (not the frontmatter override).
    pub title: String,
    pub file: String,
    /// Hex sha256 of the raw source, for incremental rebuild checks.
    pub content_hash: String,
    /// Hex sha256 of the navigation context rendered into the payload
    /// (title, address, neighbors); catalog edits invalidate through it.
    pub nav_hash: String,
}

/// `nav.json`: what a frontend needs to draw the sidebar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavManifest {
    pub route_prefix: String,
    pub sidebar: Vec<SidebarCategory>,
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// Build the whole site into `config.out_root`.
///
/// Unreadable page sources are logged, recorded on the result, and
/// skipped; only trouble with the output tree itself aborts the build.
#[instrument(skip_all, fields(pages = nav.len(), out = %config.out_root.display()))]
pub async fn build_site(
    config: &BuildConfig,
    nav: &NavIndex,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let started = Instant::now();

    progress.phase("preparing output directory");
    let pages_dir = config.out_root.join("pages");
    tokio::fs::create_dir_all(&pages_dir)
        .await
        .map_err(|e| DocpressError::io(&pages_dir, e))?;

    let previous_records = read_previous_records(&config.out_root).await;

    progress.phase("rendering pages");
    let mut result = BuildResult {
        pages_written: 0,
        pages_skipped: 0,
        pages_pruned: 0,
        errors: Vec::new(),
        elapsed: Duration::default(),
    };
    let mut records: Vec<PageRecord> = Vec::new();

    for entry in nav.entries() {
        let source_path = config.content_root.join(&entry.file);
        let raw = match tokio::fs::read_to_string(&source_path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    slug = %entry.slug,
                    path = %source_path.display(),
                    error = %e,
                    "skipping page with unreadable source"
                );
                result.errors.push((entry.slug.clone(), e.to_string()));
                continue;
            }
        };

        let neighbors = nav.neighbors(&entry.slug);
        let content_hash = sha256_hex(raw.as_bytes());
        let nav_hash = nav_context_hash(entry, &neighbors);
        let payload_path = pages_dir.join(payload_rel_path(&entry.slug));

        let unchanged = !config.force
            && previous_records.get(&entry.slug).is_some_and(|record| {
                record.content_hash == content_hash && record.nav_hash == nav_hash
            })
            && payload_path.exists();
        if unchanged {
            debug!(slug = %entry.slug, "source and navigation unchanged, skipping");
            result.pages_skipped += 1;
        } else {
            let parsed = docpress_markdown::parse(&raw).await;
            let payload = assemble_payload(entry, parsed, neighbors);
            write_json(&payload_path, &payload).await?;
            result.pages_written += 1;
            progress.page_rendered(&entry.slug);
        }

        records.push(PageRecord {
            slug: entry.slug.clone(),
            href: entry.href.clone(),
            title: entry.title.clone(),
            file: entry.file.clone(),
            content_hash,
            nav_hash,
        });
    }

    if config.prune {
        progress.phase("pruning stale payloads");
        result.pages_pruned = prune_stale_payloads(&pages_dir, nav).await?;
    }

    progress.phase("writing manifests");
    let nav_manifest = NavManifest {
        route_prefix: nav.route_prefix().to_string(),
        sidebar: nav.sidebar().to_vec(),
    };
    write_json(&config.out_root.join("nav.json"), &nav_manifest).await?;

    let site_manifest = SiteManifest {
        schema_version: CURRENT_SCHEMA_VERSION,
        site_title: config.site_title.clone(),
        generator_version: config.generator_version.clone(),
        built_at: Utc::now(),
        page_count: records.len(),
        pages: records,
    };
    write_json(&config.out_root.join("site.json"), &site_manifest).await?;

    result.elapsed = started.elapsed();
    info!(
        written = result.pages_written,
        skipped = result.pages_skipped,
        pruned = result.pages_pruned,
        failed = result.errors.len(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "site build finished"
    );
    progress.done(&result);
    Ok(result)
}

/// Relative path of a page payload under `pages/`: `index.json` for the
/// root document, `<slug>.json` otherwise. Catalog validation rejects
/// the slug `index`, so the root payload cannot be shadowed.
pub fn payload_rel_path(slug: &str) -> PathBuf {
    if slug.is_empty() {
        PathBuf::from("index.json")
    } else {
        PathBuf::from(format!("{slug}.json"))
    }
}

/// Delete payloads under `pages/` that no catalog entry produces
/// anymore. Returns how many files were removed.
async fn prune_stale_payloads(pages_dir: &Path, nav: &NavIndex) -> Result<usize> {
    let expected: HashSet<PathBuf> = nav
        .entries()
        .iter()
        .map(|entry| pages_dir.join(payload_rel_path(&entry.slug)))
        .collect();

    let mut pruned = 0;
    let mut stack = vec![pages_dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut dir_entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| DocpressError::io(&dir, e))?;
        while let Some(dirent) = dir_entries
            .next_entry()
            .await
            .map_err(|e| DocpressError::io(&dir, e))?
        {
            let path = dirent.path();
            let file_type = dirent
                .file_type()
                .await
                .map_err(|e| DocpressError::io(&path, e))?;
            if file_type.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|ext| ext == "json")
                && !expected.contains(&path)
            {
                debug!(path = %path.display(), "pruning stale payload");
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| DocpressError::io(&path, e))?;
                pruned += 1;
            }
        }
    }
    Ok(pruned)
}

/// Per-slug page records from the previous build's manifest, if any.
/// A manifest from another schema version is ignored wholesale, which
/// turns the next build into a full one.
async fn read_previous_records(out_root: &Path) -> HashMap<String, PageRecord> {
    let path = out_root.join("site.json");
    let Ok(content) = tokio::fs::read_to_string(&path).await else {
        return HashMap::new();
    };

    match serde_json::from_str::<SiteManifest>(&content) {
        Ok(manifest) if manifest.schema_version == CURRENT_SCHEMA_VERSION => manifest
            .pages
            .into_iter()
            .map(|record| (record.slug.clone(), record))
            .collect(),
        Ok(manifest) => {
            debug!(
                path = %path.display(),
                schema_version = manifest.schema_version,
                "previous manifest has a different schema, rebuilding everything"
            );
            HashMap::new()
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "ignoring unparseable previous manifest");
            HashMap::new()
        }
    }
}

/// Serialize `value` as pretty JSON and write it atomically: write a
/// dotfile sibling first, then rename over the target.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DocpressError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(value).map_err(|e| {
        DocpressError::validation(format!("cannot serialize {}: {e}", path.display()))
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "out.json".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| DocpressError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| DocpressError::io(path, e))?;
    Ok(())
}

/// Hex sha256 digest of the raw page source.
fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Fingerprint of everything outside the source that shapes a payload:
/// the entry's own title and address plus both neighbor references.
fn nav_context_hash(entry: &FlatEntry, neighbors: &Neighbors) -> String {
    let previous = neighbors.previous.as_ref();
    let next = neighbors.next.as_ref();

    let mut hasher = Sha256::new();
    for field in [
        entry.title.as_str(),
        entry.href.as_str(),
        previous.map_or("", |r| r.title.as_str()),
        previous.map_or("", |r| r.href.as_str()),
        next.map_or("", |r| r.title.as_str()),
        next.map_or("", |r| r.href.as_str()),
    ] {
        hasher.update(field.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PagePayload;

    use docpress_shared::{CatalogEntry, Category, load_site_config_from};

    fn fixtures_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
    }

    fn fixture_nav() -> NavIndex {
        let config = load_site_config_from(&fixtures_root().join("toml/docpress.toml"))
            .expect("fixture config");
        NavIndex::new(&config.categories, &config.site.route_prefix).expect("valid catalog")
    }

    fn make_config(out_root: &Path, force: bool) -> BuildConfig {
        BuildConfig {
            site_title: "Torrent Web Framework".into(),
            content_root: fixtures_root().join("md"),
            out_root: out_root.to_path_buf(),
            generator_version: "0.0.0-test".into(),
            prune: false,
            force,
        }
    }

    fn make_entry(title: &str, slug: &str, file: &str) -> CatalogEntry {
        CatalogEntry {
            title: title.into(),
            slug: slug.into(),
            file: file.into(),
        }
    }

    fn read_payload(out_root: &Path, rel: &str) -> PagePayload {
        let content =
            std::fs::read_to_string(out_root.join("pages").join(rel)).expect("read payload");
        serde_json::from_str(&content).expect("parse payload")
    }

    fn read_manifest(out_root: &Path) -> SiteManifest {
        let content =
            std::fs::read_to_string(out_root.join("site.json")).expect("read site.json");
        serde_json::from_str(&content).expect("parse site.json")
    }

    // --- full build ---

    #[tokio::test]
    async fn build_writes_payloads_and_manifests() {
        let out = tempfile::tempdir().expect("tempdir");
        let nav = fixture_nav();

        let result = build_site(&make_config(out.path(), false), &nav, &SilentProgress)
            .await
            .expect("build");
        assert_eq!(result.pages_written, 4);
        assert_eq!(result.pages_skipped, 0);
        assert!(result.errors.is_empty());

        assert!(out.path().join("pages/index.json").exists());
        assert!(out.path().join("pages/getting-started.json").exists());
        assert!(out.path().join("pages/guide/routing.json").exists());
        assert!(out.path().join("nav.json").exists());

        let manifest = read_manifest(out.path());
        assert_eq!(manifest.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(manifest.page_count, 4);
        assert_eq!(manifest.pages[0].slug, "");
        assert!(!manifest.pages[0].content_hash.is_empty());
        assert!(!manifest.pages[0].nav_hash.is_empty());
    }

    #[tokio::test]
    async fn written_payload_is_the_rendered_page() {
        let out = tempfile::tempdir().expect("tempdir");
        let nav = fixture_nav();
        build_site(&make_config(out.path(), false), &nav, &SilentProgress)
            .await
            .expect("build");

        let payload = read_payload(out.path(), "getting-started.json");
        assert_eq!(payload.title, "Getting Started");
        assert!(payload.markup.contains("<h2"));
        assert_eq!(payload.previous.expect("previous").href, "/docs");
    }

    #[tokio::test]
    async fn nav_manifest_carries_sidebar() {
        let out = tempfile::tempdir().expect("tempdir");
        let nav = fixture_nav();
        build_site(&make_config(out.path(), false), &nav, &SilentProgress)
            .await
            .expect("build");

        let content = std::fs::read_to_string(out.path().join("nav.json")).expect("read nav.json");
        let manifest: NavManifest = serde_json::from_str(&content).expect("parse nav.json");
        assert_eq!(manifest.route_prefix, "/docs");
        assert_eq!(manifest.sidebar.len(), 2);
        assert_eq!(manifest.sidebar[0].links[0].href, "/docs");
    }

    // --- incremental rebuilds ---

    #[tokio::test]
    async fn unchanged_build_skips_every_page() {
        let out = tempfile::tempdir().expect("tempdir");
        let nav = fixture_nav();
        let config = make_config(out.path(), false);

        build_site(&config, &nav, &SilentProgress)
            .await
            .expect("first build");
        let second = build_site(&config, &nav, &SilentProgress)
            .await
            .expect("second build");
        assert_eq!(second.pages_written, 0);
        assert_eq!(second.pages_skipped, 4);
    }

    #[tokio::test]
    async fn force_rebuilds_unchanged_pages() {
        let out = tempfile::tempdir().expect("tempdir");
        let nav = fixture_nav();

        build_site(&make_config(out.path(), false), &nav, &SilentProgress)
            .await
            .expect("first build");
        let forced = build_site(&make_config(out.path(), true), &nav, &SilentProgress)
            .await
            .expect("forced build");
        assert_eq!(forced.pages_written, 4);
        assert_eq!(forced.pages_skipped, 0);
    }

    #[tokio::test]
    async fn deleted_payload_is_rewritten_despite_matching_hash() {
        let out = tempfile::tempdir().expect("tempdir");
        let nav = fixture_nav();
        let config = make_config(out.path(), false);

        build_site(&config, &nav, &SilentProgress)
            .await
            .expect("first build");
        std::fs::remove_file(out.path().join("pages/getting-started.json"))
            .expect("remove payload");

        let second = build_site(&config, &nav, &SilentProgress)
            .await
            .expect("second build");
        assert_eq!(second.pages_written, 1);
        assert_eq!(second.pages_skipped, 3);
        assert!(out.path().join("pages/getting-started.json").exists());
    }

    #[tokio::test]
    async fn catalog_insert_rebuilds_skipped_neighbors() {
        let out = tempfile::tempdir().expect("tempdir");
        let config = make_config(out.path(), false);

        let two = vec![Category {
            title: "Docs".into(),
            entries: vec![
                make_entry("Home", "", "index.md"),
                make_entry("Last", "last", "no-frontmatter.md"),
            ],
        }];
        let nav = NavIndex::new(&two, "/docs").expect("valid catalog");
        build_site(&config, &nav, &SilentProgress)
            .await
            .expect("first build");

        // same sources, one entry inserted between the two
        let three = vec![Category {
            title: "Docs".into(),
            entries: vec![
                make_entry("Home", "", "index.md"),
                make_entry("Middle", "middle", "getting-started.md"),
                make_entry("Last", "last", "no-frontmatter.md"),
            ],
        }];
        let nav = NavIndex::new(&three, "/docs").expect("valid catalog");
        let second = build_site(&config, &nav, &SilentProgress)
            .await
            .expect("second build");

        // both neighbors rebuild despite unchanged sources
        assert_eq!(second.pages_written, 3);
        assert_eq!(second.pages_skipped, 0);
        assert_eq!(
            read_payload(out.path(), "index.json").next.expect("next").href,
            "/docs/middle"
        );
        assert_eq!(
            read_payload(out.path(), "last.json")
                .previous
                .expect("previous")
                .href,
            "/docs/middle"
        );
    }

    #[tokio::test]
    async fn catalog_retitle_rebuilds_only_affected_pages() {
        let out = tempfile::tempdir().expect("tempdir");
        let config = make_config(out.path(), false);
        let catalog = |last_title: &str| {
            vec![Category {
                title: "Docs".into(),
                entries: vec![
                    make_entry("Home", "", "index.md"),
                    make_entry("Setup", "setup", "getting-started.md"),
                    make_entry(last_title, "extras", "no-frontmatter.md"),
                ],
            }]
        };

        let nav = NavIndex::new(&catalog("Extras"), "/docs").expect("valid catalog");
        build_site(&config, &nav, &SilentProgress)
            .await
            .expect("first build");

        let nav = NavIndex::new(&catalog("Odds and Ends"), "/docs").expect("valid catalog");
        let second = build_site(&config, &nav, &SilentProgress)
            .await
            .expect("second build");

        // the retitled page and the neighbor that links to it rebuild;
        // the root page is out of reach and skips
        assert_eq!(second.pages_written, 2);
        assert_eq!(second.pages_skipped, 1);
        assert_eq!(
            read_payload(out.path(), "setup.json").next.expect("next").title,
            "Odds and Ends"
        );
        assert_eq!(read_payload(out.path(), "extras.json").title, "Odds and Ends");
    }

    // --- pruning ---

    #[tokio::test]
    async fn prune_removes_payloads_for_dropped_entries() {
        let out = tempfile::tempdir().expect("tempdir");
        build_site(&make_config(out.path(), false), &fixture_nav(), &SilentProgress)
            .await
            .expect("first build");
        assert!(out.path().join("pages/guide/routing.json").exists());

        // drop the Guides category from the catalog
        let trimmed = vec![Category {
            title: "Getting Started".into(),
            entries: vec![
                make_entry("Introduction", "", "index.md"),
                make_entry("Getting Started", "getting-started", "getting-started.md"),
            ],
        }];
        let nav = NavIndex::new(&trimmed, "/docs").expect("valid catalog");

        // without the flag the stale payloads stay put
        let second = build_site(&make_config(out.path(), false), &nav, &SilentProgress)
            .await
            .expect("second build");
        assert_eq!(second.pages_pruned, 0);
        assert!(out.path().join("pages/guide/routing.json").exists());

        let mut config = make_config(out.path(), false);
        config.prune = true;
        let third = build_site(&config, &nav, &SilentProgress)
            .await
            .expect("third build");
        assert_eq!(third.pages_pruned, 2);
        assert!(!out.path().join("pages/guide/routing.json").exists());
        assert!(!out.path().join("pages/plain.json").exists());
        assert!(out.path().join("pages/index.json").exists());
        assert!(out.path().join("pages/getting-started.json").exists());
    }

    // --- atomic writes ---

    #[tokio::test]
    async fn build_leaves_no_temp_files() {
        let out = tempfile::tempdir().expect("tempdir");
        let nav = fixture_nav();
        build_site(&make_config(out.path(), false), &nav, &SilentProgress)
            .await
            .expect("build");

        // No temp files should remain anywhere in the output tree
        let mut stack = vec![out.path().to_path_buf()];
        while let Some(dir) = stack.pop() {
            for dirent in std::fs::read_dir(&dir).expect("read output dir") {
                let dirent = dirent.expect("dir entry");
                if dirent.path().is_dir() {
                    stack.push(dirent.path());
                } else {
                    let name = dirent.file_name().to_string_lossy().to_string();
                    assert!(!name.starts_with('.'), "temp file left behind: {name}");
                }
            }
        }
    }

    // --- failure handling ---

    #[tokio::test]
    async fn missing_source_is_recorded_not_fatal() {
        let out = tempfile::tempdir().expect("tempdir");
        let catalog = vec![Category {
            title: "Mixed".into(),
            entries: vec![
                make_entry("Introduction", "", "index.md"),
                make_entry("Ghost", "ghost", "ghost.md"),
            ],
        }];
        let nav = NavIndex::new(&catalog, "/docs").expect("valid catalog");

        let result = build_site(&make_config(out.path(), false), &nav, &SilentProgress)
            .await
            .expect("build");
        assert_eq!(result.pages_written, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].0, "ghost");

        // the manifest records only pages that actually built
        let manifest = read_manifest(out.path());
        assert_eq!(manifest.page_count, 1);
        assert_eq!(manifest.pages[0].slug, "");
    }

    // --- helpers ---

    #[test]
    fn payload_paths() {
        assert_eq!(payload_rel_path(""), PathBuf::from("index.json"));
        assert_eq!(
            payload_rel_path("getting-started"),
            PathBuf::from("getting-started.json")
        );
        assert_eq!(
            payload_rel_path("guide/deploy"),
            PathBuf::from("guide/deploy.json")
        );
    }

    #[test]
    fn sha256_hex_is_stable() {
        let a = sha256_hex(b"# Title\n");
        let b = sha256_hex(b"# Title\n");
        let c = sha256_hex(b"# Title!\n");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
