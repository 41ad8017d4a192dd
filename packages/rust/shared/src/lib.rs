//! Shared types, error model, and configuration for docpress.
//!
//! This crate is the foundation depended on by all other docpress crates.
//! It provides:
//! - [`DocpressError`]: the unified error type
//! - Catalog types ([`Category`], [`CatalogEntry`])
//! - Site configuration ([`SiteConfig`], config loading, site scaffolding)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    SITE_CONFIG_FILE, SiteConfig, SiteMeta, init_site, load_site_config, load_site_config_from,
    site_config_path,
};
pub use error::{DocpressError, Result};
pub use types::{CURRENT_SCHEMA_VERSION, CatalogEntry, Category};
