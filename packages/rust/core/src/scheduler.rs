//! Fetch scheduler: the outer (item) tier of the two-tier concurrency model.
//!
//! Jobs are submitted in the order given, each after acquiring an item permit,
//! so at most `items.size()` items are in flight. The document tier lives in
//! the [`ItemFetcher`] and is shared by every item the scheduler starts.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use discusskit_catalog::FetchJob;
use discusskit_shared::{CatalogEntry, DiscusskitError, Result};
use tracing::{info, instrument, warn};

use crate::budget::ConcurrencyBudget;
use crate::fetcher::ItemFetcher;
use crate::pipeline::ProgressReporter;
use crate::writer::ArtifactWriter;

/// One item that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub id: u32,
    pub slug: String,
    pub error: String,
}

/// Outcome of a batch once every job has settled.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub submitted: usize,
    pub succeeded: usize,
    pub failures: Vec<ItemFailure>,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// All-or-nothing view: any failed item fails the batch.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(DiscusskitError::Batch {
                failed: self.failures.len(),
                total: self.submitted,
            })
        }
    }
}

pub struct Scheduler {
    fetcher: Arc<ItemFetcher>,
    writer: ArtifactWriter,
    items: ConcurrencyBudget,
}

impl Scheduler {
    pub fn new(fetcher: Arc<ItemFetcher>, writer: ArtifactWriter, items: ConcurrencyBudget) -> Self {
        Self {
            fetcher,
            writer,
            items,
        }
    }

    /// Run every job and fail if any of them failed. No retries.
    pub async fn run(
        &self,
        jobs: Vec<FetchJob>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<BatchSummary> {
        self.run_settled(jobs, progress).await?.into_result()
    }

    /// Run every job to completion or failure and report what happened.
    ///
    /// Errors only if the scheduler itself cannot proceed; item failures are
    /// collected in the summary.
    #[instrument(skip_all, fields(jobs = jobs.len(), items = self.items.size()))]
    pub async fn run_settled(
        &self,
        jobs: Vec<FetchJob>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<BatchSummary> {
        let start = Instant::now();
        let total = jobs.len();
        let finished = Arc::new(AtomicUsize::new(0));

        info!(total, "starting batch");

        let mut handles = Vec::with_capacity(total);
        for job in jobs {
            // Blocks submission until an item slot frees up.
            let permit = self.items.acquire().await?;
            let entry = job.entry;
            let fetcher = self.fetcher.clone();
            let writer = self.writer.clone();
            let progress = progress.clone();
            let finished = finished.clone();
            let task_entry = entry.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                progress.item_started(&task_entry.slug);
                let outcome = process(&fetcher, &writer, &task_entry).await;
                let current = finished.fetch_add(1, Ordering::SeqCst) + 1;
                match &outcome {
                    Ok(()) => progress.item_done(&task_entry.slug, current, total),
                    Err(e) => progress.item_failed(&task_entry.slug, &e.to_string()),
                }
                outcome
            });
            handles.push((entry, handle));
        }

        let mut succeeded = 0;
        let mut failures = Vec::new();
        for (entry, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(DiscusskitError::Network(format!("item task failed: {e}"))),
            };
            match outcome {
                Ok(()) => succeeded += 1,
                Err(e) => {
                    warn!(id = entry.id, slug = %entry.slug, error = %e, "item failed");
                    failures.push(ItemFailure {
                        id: entry.id,
                        slug: entry.slug,
                        error: e.to_string(),
                    });
                }
            }
        }

        let summary = BatchSummary {
            submitted: total,
            succeeded,
            failures,
            elapsed: start.elapsed(),
        };

        info!(
            submitted = summary.submitted,
            succeeded = summary.succeeded,
            failed = summary.failures.len(),
            duration_ms = summary.elapsed.as_millis(),
            "batch settled"
        );

        Ok(summary)
    }
}

async fn process(fetcher: &ItemFetcher, writer: &ArtifactWriter, entry: &CatalogEntry) -> Result<()> {
    let record = fetcher.fetch(entry).await?;
    writer.write_item(entry, &record).await?;
    Ok(())
}
