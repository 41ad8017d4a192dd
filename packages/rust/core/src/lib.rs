//! Site-level orchestration for docpress.
//!
//! This crate ties the markdown pipeline and the navigation index into
//! end-to-end workflows: rendering one page, building the whole site to
//! static JSON, and checking a site's content health.

pub mod build;
pub mod check;
pub mod page;

pub use build::{
    BuildConfig, BuildResult, NavManifest, PageRecord, ProgressReporter, SilentProgress,
    SiteManifest, build_site, payload_rel_path,
};
pub use check::{CheckReport, check_site};
pub use page::{PagePayload, render_page};
