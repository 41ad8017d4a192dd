//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docpress_core::{
    BuildConfig, BuildResult, ProgressReporter, build_site, check_site, render_page,
};
use docpress_nav::NavIndex;
use docpress_shared::{SiteConfig, init_site, load_site_config};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docpress — markdown documentation sites, built static.
#[derive(Parser)]
#[command(
    name = "docpress",
    version,
    about = "Build a markdown content tree into a static, navigable documentation site.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Site root: the directory holding docpress.toml.
    #[arg(short, long, default_value = ".", global = true)]
    pub site: PathBuf,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scaffold a new site: a starter docpress.toml plus a first page.
    Init,

    /// Render every catalog page into the output directory.
    Build {
        /// Rebuild every page even when its source is unchanged.
        #[arg(long)]
        force: bool,

        /// Remove payloads for pages no longer in the catalog.
        #[arg(long)]
        prune: bool,
    },

    /// Render a single page and print it.
    Page {
        /// Slug to render; omit for the root document.
        #[arg(default_value = "")]
        slug: String,

        /// Print the full JSON payload instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Verify every catalog entry has readable, well-formed content.
    Check,

    /// List the catalog in navigation order.
    List,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docpress=info",
        1 => "docpress=debug",
        _ => "docpress=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Init => cmd_init(&cli.site),
        Command::Build { force, prune } => cmd_build(&cli.site, force, prune).await,
        Command::Page { slug, json } => cmd_page(&cli.site, &slug, json).await,
        Command::Check => cmd_check(&cli.site).await,
        Command::List => cmd_list(&cli.site),
    }
}

/// Load the site config and build the navigation index from its catalog.
fn load_site(site_root: &Path) -> Result<(SiteConfig, NavIndex)> {
    let config = load_site_config(site_root)?;
    let nav = NavIndex::new(&config.categories, &config.site.route_prefix)?;
    Ok((config, nav))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_init(site_root: &Path) -> Result<()> {
    let path = init_site(site_root)?;
    println!("Site scaffolded at: {}", path.display());
    println!("Edit docpress.toml, add pages, then run `docpress build`.");
    Ok(())
}

async fn cmd_build(site_root: &Path, force: bool, prune: bool) -> Result<()> {
    let (config, nav) = load_site(site_root)?;

    info!(site = %site_root.display(), pages = nav.len(), force, prune, "building site");

    let build_config = BuildConfig {
        site_title: config.site.title.clone(),
        content_root: config.content_root(site_root),
        out_root: config.out_root(site_root),
        generator_version: env!("CARGO_PKG_VERSION").to_string(),
        prune,
        force,
    };

    let reporter = CliProgress::new();
    let result = build_site(&build_config, &nav, &reporter).await?;

    println!();
    println!("  Site built!");
    println!("  Pages:   {}", result.pages_written);
    println!("  Skipped: {}", result.pages_skipped);
    if prune {
        println!("  Pruned:  {}", result.pages_pruned);
    }
    println!("  Output:  {}", build_config.out_root.display());
    println!("  Time:    {:.1}s", result.elapsed.as_secs_f64());
    if !result.errors.is_empty() {
        println!("  Failed:  {}", result.errors.len());
        for (slug, message) in &result.errors {
            println!("    {slug:?}: {message}");
        }
    }
    println!();

    Ok(())
}

async fn cmd_page(site_root: &Path, slug: &str, json: bool) -> Result<()> {
    let (config, nav) = load_site(site_root)?;
    let payload = render_page(&nav, &config.content_root(site_root), slug).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!();
    println!("  {}", payload.title);
    println!("  Address:  {}", payload.href);
    if let Some(description) = &payload.description {
        println!("  About:    {description}");
    }
    println!("  Headings: {}", payload.headings.len());
    println!("  Markup:   {} bytes", payload.markup.len());
    if let Some(previous) = &payload.previous {
        println!("  Previous: {} ({})", previous.title, previous.href);
    }
    if let Some(next) = &payload.next {
        println!("  Next:     {} ({})", next.title, next.href);
    }
    println!();

    Ok(())
}

async fn cmd_check(site_root: &Path) -> Result<()> {
    let (config, nav) = load_site(site_root)?;
    let report = check_site(&nav, &config.content_root(site_root)).await;

    println!();
    println!("  Checked {} catalog entries", nav.len());
    println!("  OK:       {}", report.ok);
    println!("  Degraded: {}", report.degraded.len());
    for slug in &report.degraded {
        println!("    {slug:?}: malformed frontmatter, renders without metadata");
    }
    println!("  Missing:  {}", report.missing.len());
    for (slug, message) in &report.missing {
        println!("    {slug:?}: {message}");
    }
    println!();

    if !report.is_ok() {
        return Err(eyre!(
            "site check failed: {} page source(s) missing",
            report.missing.len()
        ));
    }
    Ok(())
}

fn cmd_list(site_root: &Path) -> Result<()> {
    let (_config, nav) = load_site(site_root)?;

    println!();
    let mut current_category = "";
    for entry in nav.entries() {
        if entry.category != current_category {
            println!("  {}", entry.category);
            current_category = &entry.category;
        }
        println!("    {:<24} {:<28} {}", entry.title, entry.href, entry.file);
    }
    println!();
    println!("  {} pages", nav.len());
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Build progress on an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_rendered(&self, slug: &str) {
        let shown = if slug.is_empty() { "(root)" } else { slug };
        self.spinner.set_message(format!("Rendering {shown}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}
