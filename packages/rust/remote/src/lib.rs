//! Remote source boundary: listing and document retrieval.
//!
//! This crate provides:
//! - [`RemoteSource`]: the trait the core pipeline depends on
//! - [`HttpSource`]: reqwest + scraper implementation driven by configured selectors
//! - [`SourceUrls`]: builds listing/description/group URLs from the source origin

mod extract;
mod http;

use async_trait::async_trait;
use discusskit_shared::{DiscusskitError, Group, Result};
use url::Url;

pub use extract::{CompiledSelectors, slug_from_link};
pub use http::HttpSource;

// ---------------------------------------------------------------------------
// Listing types
// ---------------------------------------------------------------------------

/// One repeated entry of a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub title: String,
    /// Absolute link, resolved against the listing URL.
    pub link: String,
}

/// A listing page: its title region plus entries in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub title: String,
    pub entries: Vec<ListingEntry>,
}

/// Which selector set a listing is extracted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    /// An item's ranked discussion listing.
    Discussions,
    /// A tag or company page listing item links.
    Group,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Retrieval of remote listings and documents.
///
/// Each call is one suspension point and carries the implementation's
/// per-request timeout.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch a listing page and extract its title and entries.
    async fn fetch_listing(&self, url: &Url, kind: ListingKind) -> Result<Listing>;

    /// Fetch a document and return the text of its content region.
    ///
    /// `region` selects between a discussion body and an item description.
    async fn fetch_document(&self, url: &Url, region: ContentRegion) -> Result<String>;
}

/// Content region queried in a fetched document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRegion {
    Discussion,
    Description,
}

// ---------------------------------------------------------------------------
// URLs
// ---------------------------------------------------------------------------

/// Endpoint layout of the remote source.
#[derive(Debug, Clone)]
pub struct SourceUrls {
    base: Url,
}

impl SourceUrls {
    pub fn new(mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { base }
    }

    /// Discussion listing sorted by votes, first page.
    pub fn discussions(&self, slug: &str) -> Result<Url> {
        self.join(&format!(
            "problems/{slug}/discuss/?currentPage=1&orderBy=most_votes"
        ))
    }

    /// Item description page.
    pub fn description(&self, slug: &str) -> Result<Url> {
        self.join(&format!("problems/{slug}/"))
    }

    /// Listing of the items classified under `group`.
    pub fn group(&self, group: &Group) -> Result<Url> {
        self.join(&format!(
            "{}/{}/",
            group.kind().path_segment(),
            group.name()
        ))
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| DiscusskitError::validation(format!("cannot build URL for '{path}': {e}")))
    }
}
