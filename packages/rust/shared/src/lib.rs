//! Shared types, error model, and configuration for discusskit.
//!
//! This crate is the foundation depended on by all other discusskit crates.
//! It provides:
//! - [`DiscusskitError`]: the unified error type
//! - Domain types ([`CatalogEntry`], [`ItemRecord`], [`DocumentRecord`], [`Group`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_DOCUMENT_CONCURRENCY, DEFAULT_ITEM_CONCURRENCY,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TOP_K, DefaultsConfig, FetchConfig, FetchSection,
    SelectorConfig, SourceConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, validate,
};
pub use error::{DiscusskitError, Result};
pub use types::{CatalogEntry, DocumentRecord, Group, GroupKind, ItemRecord, artifact_file_name};
