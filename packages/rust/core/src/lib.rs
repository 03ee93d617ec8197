//! Core fetch-and-aggregate pipeline for discusskit.
//!
//! This crate provides:
//! - [`budget`]: named concurrency budgets shared between components
//! - [`fetcher`]: per-item description + top-K discussion fetch
//! - [`scheduler`]: bounded, all-or-nothing batch execution
//! - [`writer`]: append-only artifact files
//! - [`aggregator`]: per-group bundle construction
//! - [`pipeline`]: the download and merge phases end to end

pub mod aggregator;
pub mod budget;
pub mod fetcher;
pub mod pipeline;
pub mod scheduler;
pub mod writer;

#[cfg(test)]
mod testing;

pub use aggregator::{Aggregator, BundleMode, MergeSummary};
pub use budget::ConcurrencyBudget;
pub use fetcher::ItemFetcher;
pub use pipeline::{
    DownloadConfig, MergeConfig, ProgressReporter, SilentProgress, fetch_one, run_download,
    run_merge,
};
pub use scheduler::{BatchSummary, ItemFailure, Scheduler};
pub use writer::{ArtifactWriter, render_block};
