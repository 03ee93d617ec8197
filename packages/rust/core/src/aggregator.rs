//! Aggregator: folds per-item artifacts into per-group bundles.
//!
//! A group's remote listing decides membership and order; local artifacts
//! decide what is available. Slugs that are unknown to the catalog or have
//! no artifact yet are skipped without error.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use discusskit_catalog::SlugIndex;
use discusskit_remote::{ListingKind, RemoteSource, SourceUrls, slug_from_link};
use discusskit_shared::{DiscusskitError, Group, Result, artifact_file_name};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::budget::ConcurrencyBudget;

/// How a bundle file is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BundleMode {
    /// Replace the bundle with this run's content. Re-running is a no-op.
    #[default]
    Rebuild,
    /// Append this run's content to whatever the bundle already holds.
    /// Re-running duplicates content.
    Append,
}

/// Result of merging one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub group: Group,
    /// Item links in the remote listing.
    pub listed: usize,
    /// Artifacts folded into the bundle.
    pub merged: usize,
    /// Listed items without a local artifact (or unknown to the catalog).
    pub skipped: usize,
    pub bundle_path: PathBuf,
}

pub struct Aggregator {
    source: Arc<dyn RemoteSource>,
    urls: SourceUrls,
    artifact_dir: PathBuf,
    bundle_root: PathBuf,
    mode: BundleMode,
}

impl Aggregator {
    pub fn new(
        source: Arc<dyn RemoteSource>,
        urls: SourceUrls,
        artifact_dir: impl Into<PathBuf>,
        bundle_root: impl Into<PathBuf>,
        mode: BundleMode,
    ) -> Self {
        Self {
            source,
            urls,
            artifact_dir: artifact_dir.into(),
            bundle_root: bundle_root.into(),
            mode,
        }
    }

    /// `{bundle_root}/{tags|companies}/{name}.txt`
    pub fn bundle_path(&self, group: &Group) -> PathBuf {
        self.bundle_root
            .join(group.kind().dir_name())
            .join(group.bundle_file_name())
    }

    /// Merge one group. Items are processed sequentially in listing order.
    #[instrument(skip_all, fields(group = %group))]
    pub async fn merge_group(&self, group: &Group, index: &SlugIndex) -> Result<MergeSummary> {
        let url = self.urls.group(group)?;
        let listing = self.source.fetch_listing(&url, ListingKind::Group).await?;

        let mut bundle = Vec::new();
        let mut listed = 0;
        let mut merged = 0;

        for entry in &listing.entries {
            let Some(slug) = slug_from_link(&entry.link) else {
                continue;
            };
            listed += 1;

            let Some(id) = index.get(&slug) else {
                debug!(%slug, "slug not in catalog, skipping");
                continue;
            };

            let path = self.artifact_dir.join(artifact_file_name(id, &slug));
            match tokio::fs::read(&path).await {
                Ok(content) => {
                    bundle.extend_from_slice(&content);
                    merged += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(%slug, "no artifact, skipping");
                }
                Err(e) => return Err(DiscusskitError::io(&path, e)),
            }
        }

        let bundle_path = self.bundle_path(group);
        self.write_bundle(&bundle_path, &bundle).await?;

        let summary = MergeSummary {
            group: group.clone(),
            listed,
            merged,
            skipped: listed - merged,
            bundle_path,
        };
        info!(
            listed = summary.listed,
            merged = summary.merged,
            skipped = summary.skipped,
            mode = ?self.mode,
            "group merged"
        );
        Ok(summary)
    }

    /// Merge several groups concurrently, at most `budget.size()` at a time.
    ///
    /// Each group writes its own bundle, so groups never contend for a file.
    /// Results come back in input order.
    pub async fn merge_groups(
        self: Arc<Self>,
        groups: Vec<Group>,
        index: SlugIndex,
        budget: ConcurrencyBudget,
    ) -> Vec<(Group, Result<MergeSummary>)> {
        let mut handles = Vec::with_capacity(groups.len());
        for group in groups {
            let aggregator = self.clone();
            let index = index.clone();
            let budget = budget.clone();
            let task_group = group.clone();
            let handle = tokio::spawn(async move {
                let _permit = budget.acquire().await?;
                aggregator.merge_group(&task_group, &index).await
            });
            handles.push((group, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (group, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(DiscusskitError::Network(format!("merge task failed: {e}"))),
            };
            if let Err(e) = &outcome {
                warn!(group = %group, error = %e, "group merge failed");
            }
            results.push((group, outcome));
        }
        results
    }

    async fn write_bundle(&self, path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DiscusskitError::io(parent, e))?;
        }

        match self.mode {
            BundleMode::Rebuild => tokio::fs::write(path, content)
                .await
                .map_err(|e| DiscusskitError::io(path, e)),
            BundleMode::Append => {
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await
                    .map_err(|e| DiscusskitError::io(path, e))?;
                file.write_all(content)
                    .await
                    .map_err(|e| DiscusskitError::io(path, e))?;
                file.flush().await.map_err(|e| DiscusskitError::io(path, e))
            }
        }
    }
}
