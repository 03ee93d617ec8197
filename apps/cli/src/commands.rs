//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use discusskit_catalog::{Access, Catalog, Selection};
use discusskit_core::{
    BatchSummary, BundleMode, DownloadConfig, MergeConfig, MergeSummary, ProgressReporter,
};
use discusskit_remote::HttpSource;
use discusskit_shared::{AppConfig, FetchConfig, Group, init_config, load_config};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// discusskit: download item discussions and bundle them by topic.
#[derive(Parser)]
#[command(
    name = "discusskit",
    version,
    about = "Download ranked discussions per catalog item and bundle them by tag or company.",
    long_about = None,
)]
pub(crate) struct Cli {
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

/// Catalog and artifact locations, overriding `[defaults]`.
#[derive(Args, Debug, Default)]
pub(crate) struct PathArgs {
    /// Catalog metadata JSON file.
    #[arg(long, env = "DISCUSSKIT_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Directory holding `{id}.{slug}.txt` artifacts.
    #[arg(long)]
    pub artifacts: Option<PathBuf>,
}

/// Budget overrides, replacing `[fetch]` values.
#[derive(Args, Debug, Default)]
pub(crate) struct BudgetArgs {
    /// Items fetched concurrently.
    #[arg(long)]
    pub item_concurrency: Option<usize>,

    /// Discussion documents fetched concurrently across all items.
    #[arg(long)]
    pub document_concurrency: Option<usize>,

    /// Ranked discussion documents kept per item.
    #[arg(long)]
    pub top_k: Option<usize>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Download artifacts for every selected catalog item.
    Fetch {
        /// Select paid-only items instead of free ones.
        #[arg(long, conflicts_with = "all")]
        restricted: bool,

        /// Select every item regardless of access tier.
        #[arg(long)]
        all: bool,

        /// Skip items whose artifact already exists.
        #[arg(long)]
        resume: bool,

        #[command(flatten)]
        paths: PathArgs,

        #[command(flatten)]
        budgets: BudgetArgs,
    },

    /// Download the artifact for a single item.
    FetchOne {
        /// Item slug, e.g. `two-sum`.
        slug: String,

        #[command(flatten)]
        paths: PathArgs,

        #[command(flatten)]
        budgets: BudgetArgs,
    },

    /// Build bundles from existing artifacts.
    Merge {
        /// Tag to bundle (repeatable).
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Company to bundle (repeatable).
        #[arg(long = "company")]
        companies: Vec<String>,

        /// Bundle every tag mentioned in the catalog.
        #[arg(long)]
        all_tags: bool,

        /// Append to existing bundles instead of rebuilding them (re-runs duplicate content).
        #[arg(long)]
        append: bool,

        /// Root directory for `tags/` and `companies/`.
        #[arg(long)]
        bundle_root: Option<PathBuf>,

        #[command(flatten)]
        paths: PathArgs,
    },

    /// Show catalog statistics.
    Catalog {
        #[command(flatten)]
        paths: PathArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "discusskit=info",
        1 => "discusskit=debug",
        _ => "discusskit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
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
        Command::Fetch {
            restricted,
            all,
            resume,
            paths,
            budgets,
        } => {
            let access = if all {
                Access::Any
            } else if restricted {
                Access::Restricted
            } else {
                Access::Free
            };
            cmd_fetch(Selection { access, resume }, &paths, &budgets).await
        }
        Command::FetchOne {
            slug,
            paths,
            budgets,
        } => cmd_fetch_one(&slug, &paths, &budgets).await,
        Command::Merge {
            tags,
            companies,
            all_tags,
            append,
            bundle_root,
            paths,
        } => cmd_merge(tags, companies, all_tags, append, bundle_root, &paths).await,
        Command::Catalog { paths } => cmd_catalog(&paths).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Config resolution
// ---------------------------------------------------------------------------

/// Config file values with CLI overrides applied.
struct Resolved {
    app: AppConfig,
    fetch: FetchConfig,
    catalog_path: PathBuf,
    artifact_dir: PathBuf,
}

fn resolve(paths: &PathArgs, budgets: &BudgetArgs) -> Result<Resolved> {
    let mut app = load_config()?;
    if let Some(n) = budgets.item_concurrency {
        app.fetch.item_concurrency = n;
    }
    if let Some(n) = budgets.document_concurrency {
        app.fetch.document_concurrency = n;
    }
    if let Some(k) = budgets.top_k {
        app.fetch.top_k = k;
    }

    let fetch = FetchConfig::from_app(&app)?;
    let catalog_path = paths
        .catalog
        .clone()
        .unwrap_or_else(|| PathBuf::from(&app.defaults.catalog_path));
    let artifact_dir = paths
        .artifacts
        .clone()
        .unwrap_or_else(|| PathBuf::from(&app.defaults.artifact_dir));

    Ok(Resolved {
        app,
        fetch,
        catalog_path,
        artifact_dir,
    })
}

fn http_source(resolved: &Resolved) -> Result<Arc<HttpSource>> {
    Ok(Arc::new(HttpSource::new(
        &resolved.fetch,
        &resolved.app.selectors,
    )?))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_fetch(selection: Selection, paths: &PathArgs, budgets: &BudgetArgs) -> Result<()> {
    let resolved = resolve(paths, budgets)?;
    let source = http_source(&resolved)?;

    info!(
        access = ?selection.access,
        resume = selection.resume,
        items = resolved.fetch.item_concurrency,
        documents = resolved.fetch.document_concurrency,
        top_k = resolved.fetch.top_k,
        "starting download"
    );

    let config = DownloadConfig {
        catalog_path: resolved.catalog_path,
        artifact_dir: resolved.artifact_dir,
        selection,
        fetch: resolved.fetch,
    };

    let progress = Arc::new(CliProgress::new());
    let result = discusskit_core::run_download(&config, source, progress.clone()).await;
    progress.finish();

    print_batch(&result?);
    Ok(())
}

async fn cmd_fetch_one(slug: &str, paths: &PathArgs, budgets: &BudgetArgs) -> Result<()> {
    let resolved = resolve(paths, budgets)?;
    let source = http_source(&resolved)?;

    let config = DownloadConfig {
        catalog_path: resolved.catalog_path,
        artifact_dir: resolved.artifact_dir,
        selection: Selection::default(),
        fetch: resolved.fetch,
    };

    let progress = Arc::new(CliProgress::new());
    let result = discusskit_core::fetch_one(&config, slug, source, progress.clone()).await;
    progress.finish();

    print_batch(&result?);
    Ok(())
}

async fn cmd_merge(
    tags: Vec<String>,
    companies: Vec<String>,
    all_tags: bool,
    append: bool,
    bundle_root: Option<PathBuf>,
    paths: &PathArgs,
) -> Result<()> {
    let resolved = resolve(paths, &BudgetArgs::default())?;

    // One task per bundle file.
    let mut tags = tags;
    tags.sort();
    tags.dedup();
    let mut companies = companies;
    companies.sort();
    companies.dedup();

    let mut groups = Vec::new();
    for name in &tags {
        groups.push(Group::tag(name.as_str())?);
    }
    if all_tags {
        let catalog = Catalog::load(&resolved.catalog_path)?;
        for name in catalog.tags() {
            if tags.contains(&name) {
                continue;
            }
            match Group::tag(name.as_str()) {
                Ok(group) => groups.push(group),
                Err(e) => warn!(tag = %name, error = %e, "skipping catalog tag"),
            }
        }
    }
    for name in companies {
        groups.push(Group::company(name)?);
    }
    if groups.is_empty() {
        return Err(eyre!(
            "nothing to merge: pass --tag, --company, or --all-tags"
        ));
    }

    let source = http_source(&resolved)?;
    let config = MergeConfig {
        catalog_path: resolved.catalog_path,
        artifact_dir: resolved.artifact_dir,
        bundle_root: bundle_root
            .unwrap_or_else(|| PathBuf::from(&resolved.app.defaults.bundle_root)),
        groups,
        mode: if append {
            BundleMode::Append
        } else {
            BundleMode::Rebuild
        },
        fetch: resolved.fetch,
    };

    info!(groups = config.groups.len(), mode = ?config.mode, "starting merge");

    let progress = Arc::new(CliProgress::new());
    let result = discusskit_core::run_merge(&config, source, progress.clone()).await;
    progress.finish();

    let summaries = result?;
    println!();
    println!("  Bundles written: {}", summaries.len());
    for summary in &summaries {
        println!(
            "  {:<32} {:>4} merged / {:>4} listed  {}",
            summary.group.to_string(),
            summary.merged,
            summary.listed,
            summary.bundle_path.display()
        );
    }
    println!();

    Ok(())
}

async fn cmd_catalog(paths: &PathArgs) -> Result<()> {
    let resolved = resolve(paths, &BudgetArgs::default())?;
    let catalog = Catalog::load(&resolved.catalog_path)?;
    let stats = catalog.stats();

    let downloaded = catalog
        .entries()
        .iter()
        .filter(|e| discusskit_catalog::is_complete(e, &resolved.artifact_dir))
        .count();

    println!();
    println!("  Catalog:    {}", resolved.catalog_path.display());
    println!("  Items:      {}", stats.total);
    println!("  Free:       {}", stats.free);
    println!("  Restricted: {}", stats.restricted);
    println!("  Downloaded: {downloaded}");
    println!("  Tags:       {}", catalog.tags().len());
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_batch(summary: &BatchSummary) {
    println!();
    println!("  Items fetched: {}/{}", summary.succeeded, summary.submitted);
    println!("  Time:          {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item_done(&self, slug: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetched [{current}/{total}] {slug}"));
    }

    fn item_failed(&self, slug: &str, error: &str) {
        self.spinner.println(format!("  failed: {slug}: {error}"));
    }

    fn group_merged(&self, summary: &MergeSummary) {
        self.spinner.set_message(format!(
            "Merged {} ({} items)",
            summary.group, summary.merged
        ));
    }
}
