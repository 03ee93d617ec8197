//! Scripted in-memory remote source for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use discusskit_remote::{
    ContentRegion, Listing, ListingEntry, ListingKind, RemoteSource, SourceUrls,
};
use discusskit_shared::{DiscusskitError, Group, Result};
use url::Url;

pub(crate) const BASE: &str = "https://source.test";

pub(crate) fn urls() -> SourceUrls {
    SourceUrls::new(Url::parse(BASE).unwrap())
}

struct Reply {
    text: Option<String>,
    delay: Duration,
}

/// Serves canned listings and documents, recording discussion fetch concurrency.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    listings: HashMap<String, Listing>,
    documents: HashMap<String, Reply>,
    failing_listings: HashSet<String>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register an item: listing, description, and one document per `(title, body, delay_ms)`.
    pub(crate) fn item(
        mut self,
        slug: &str,
        title: &str,
        description: &str,
        docs: &[(&str, &str, u64)],
    ) -> Self {
        let urls = urls();
        let mut entries = Vec::new();
        for (rank, (doc_title, body, delay_ms)) in docs.iter().enumerate() {
            let link = format!("{BASE}/problems/{slug}/discuss/{rank}");
            self.documents.insert(
                link.clone(),
                Reply {
                    text: Some((*body).to_string()),
                    delay: Duration::from_millis(*delay_ms),
                },
            );
            entries.push(ListingEntry {
                title: (*doc_title).to_string(),
                link,
            });
        }
        self.listings.insert(
            urls.discussions(slug).unwrap().to_string(),
            Listing {
                title: title.to_string(),
                entries,
            },
        );
        self.documents.insert(
            urls.description(slug).unwrap().to_string(),
            Reply {
                text: Some(description.to_string()),
                delay: Duration::ZERO,
            },
        );
        self
    }

    /// Make the document at `link` fail after `delay_ms`.
    pub(crate) fn failing_document(mut self, link: &str, delay_ms: u64) -> Self {
        self.documents.insert(
            link.to_string(),
            Reply {
                text: None,
                delay: Duration::from_millis(delay_ms),
            },
        );
        self
    }

    /// Register a group listing of item links, in order.
    pub(crate) fn group(mut self, group: &Group, slugs: &[&str]) -> Self {
        let entries = slugs
            .iter()
            .map(|slug| ListingEntry {
                title: (*slug).to_string(),
                link: format!("{BASE}/problems/{slug}/"),
            })
            .collect();
        self.listings.insert(
            urls().group(group).unwrap().to_string(),
            Listing {
                title: group.name().to_string(),
                entries,
            },
        );
        self
    }

    pub(crate) fn failing_group(mut self, group: &Group) -> Self {
        self.failing_listings
            .insert(urls().group(group).unwrap().to_string());
        self
    }

    /// Highest number of discussion fetches observed in flight at once.
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Discussion links in completion order.
    pub(crate) fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteSource for ScriptedSource {
    async fn fetch_listing(&self, url: &Url, _kind: ListingKind) -> Result<Listing> {
        tokio::task::yield_now().await;
        if self.failing_listings.contains(url.as_str()) {
            return Err(DiscusskitError::Network(format!("{url}: HTTP 503")));
        }
        self.listings
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| DiscusskitError::Network(format!("{url}: HTTP 404")))
    }

    async fn fetch_document(&self, url: &Url, region: ContentRegion) -> Result<String> {
        let Some(reply) = self.documents.get(url.as_str()) else {
            return Err(DiscusskitError::Network(format!("{url}: HTTP 404")));
        };

        let tracked = region == ContentRegion::Discussion;
        if tracked {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        }
        tokio::time::sleep(reply.delay).await;
        if tracked {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.completed.lock().unwrap().push(url.to_string());
        }

        reply
            .text
            .clone()
            .ok_or_else(|| DiscusskitError::parse(format!("{url}: discussion content region not found")))
    }
}
