//! End-to-end phases: catalog → schedule → artifacts, and groups → bundles.
//!
//! The two phases are independent entry points and are never run together.

use std::path::PathBuf;
use std::sync::Arc;

use discusskit_catalog::{Catalog, FetchJob, Selection};
use discusskit_remote::{RemoteSource, SourceUrls};
use discusskit_shared::{DiscusskitError, FetchConfig, Group, Result};
use tracing::{info, instrument};

use crate::aggregator::{Aggregator, BundleMode, MergeSummary};
use crate::budget::ConcurrencyBudget;
use crate::fetcher::ItemFetcher;
use crate::scheduler::{BatchSummary, Scheduler};
use crate::writer::ArtifactWriter;

/// Progress callback for reporting pipeline status. Every method defaults to a no-op.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, _name: &str) {}
    /// Called when an item fetch begins.
    fn item_started(&self, _slug: &str) {}
    /// Called when an item's artifact has been written.
    fn item_done(&self, _slug: &str, _current: usize, _total: usize) {}
    /// Called when an item fails.
    fn item_failed(&self, _slug: &str, _error: &str) {}
    /// Called when a group bundle has been written.
    fn group_merged(&self, _summary: &MergeSummary) {}
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {}

// ---------------------------------------------------------------------------
// Download phase
// ---------------------------------------------------------------------------

/// Configuration for [`run_download`].
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub catalog_path: PathBuf,
    pub artifact_dir: PathBuf,
    pub selection: Selection,
    pub fetch: FetchConfig,
}

/// Load the catalog, select jobs, and fetch them under both budgets.
#[instrument(skip_all, fields(catalog = %config.catalog_path.display()))]
pub async fn run_download(
    config: &DownloadConfig,
    source: Arc<dyn RemoteSource>,
    progress: Arc<dyn ProgressReporter>,
) -> Result<BatchSummary> {
    progress.phase("Loading catalog");
    let catalog = Catalog::load(&config.catalog_path)?;
    let jobs = catalog.select(&config.selection, &config.artifact_dir);

    info!(
        selected = jobs.len(),
        access = ?config.selection.access,
        resume = config.selection.resume,
        "jobs selected"
    );

    progress.phase("Fetching items");
    build_scheduler(config, source).run(jobs, progress).await
}

/// Fetch a single catalog entry by slug, ignoring selection and resume rules.
#[instrument(skip_all, fields(slug = %slug))]
pub async fn fetch_one(
    config: &DownloadConfig,
    slug: &str,
    source: Arc<dyn RemoteSource>,
    progress: Arc<dyn ProgressReporter>,
) -> Result<BatchSummary> {
    let catalog = Catalog::load(&config.catalog_path)?;
    let entry = catalog
        .get_by_slug(slug)
        .cloned()
        .ok_or_else(|| DiscusskitError::validation(format!("slug '{slug}' is not in the catalog")))?;

    progress.phase("Fetching item");
    build_scheduler(config, source)
        .run(vec![FetchJob { entry }], progress)
        .await
}

fn build_scheduler(config: &DownloadConfig, source: Arc<dyn RemoteSource>) -> Scheduler {
    let fetch = &config.fetch;
    let fetcher = ItemFetcher::new(
        source,
        SourceUrls::new(fetch.base_url.clone()),
        ConcurrencyBudget::new("documents", fetch.document_concurrency),
        fetch.top_k,
    );
    Scheduler::new(
        Arc::new(fetcher),
        ArtifactWriter::new(&config.artifact_dir),
        ConcurrencyBudget::new("items", fetch.item_concurrency),
    )
}

// ---------------------------------------------------------------------------
// Merge phase
// ---------------------------------------------------------------------------

/// Configuration for [`run_merge`].
#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub catalog_path: PathBuf,
    pub artifact_dir: PathBuf,
    pub bundle_root: PathBuf,
    pub groups: Vec<Group>,
    pub mode: BundleMode,
    pub fetch: FetchConfig,
}

/// Build one bundle per group. Fails if any group failed; the others are still written.
#[instrument(skip_all, fields(groups = config.groups.len(), mode = ?config.mode))]
pub async fn run_merge(
    config: &MergeConfig,
    source: Arc<dyn RemoteSource>,
    progress: Arc<dyn ProgressReporter>,
) -> Result<Vec<MergeSummary>> {
    progress.phase("Loading catalog");
    let catalog = Catalog::load(&config.catalog_path)?;
    let index = catalog.slug_index();

    progress.phase("Merging groups");
    let aggregator = Arc::new(Aggregator::new(
        source,
        SourceUrls::new(config.fetch.base_url.clone()),
        &config.artifact_dir,
        &config.bundle_root,
        config.mode,
    ));
    let total = config.groups.len();
    let results = aggregator
        .merge_groups(
            config.groups.clone(),
            index,
            ConcurrencyBudget::new("groups", config.fetch.group_concurrency),
        )
        .await;

    let mut summaries = Vec::with_capacity(total);
    for (_group, outcome) in results {
        if let Ok(summary) = outcome {
            progress.group_merged(&summary);
            summaries.push(summary);
        }
    }

    let failed = total - summaries.len();
    info!(merged = summaries.len(), failed, "merge complete");
    if failed > 0 {
        return Err(DiscusskitError::Batch { failed, total });
    }
    Ok(summaries)
}
