//! Item fetcher: description plus the top-ranked discussion documents.

use std::sync::Arc;

use discusskit_remote::{ContentRegion, ListingEntry, ListingKind, RemoteSource, SourceUrls};
use discusskit_shared::{CatalogEntry, DiscusskitError, DocumentRecord, ItemRecord, Result};
use tokio::task::JoinHandle;
use tracing::{debug, instrument};
use url::Url;

use crate::budget::ConcurrencyBudget;

/// Fetches one item per call; concurrent calls may overlap and
/// all of them draw from the same document budget.
pub struct ItemFetcher {
    source: Arc<dyn RemoteSource>,
    urls: SourceUrls,
    documents: ConcurrencyBudget,
    top_k: usize,
}

impl ItemFetcher {
    pub fn new(
        source: Arc<dyn RemoteSource>,
        urls: SourceUrls,
        documents: ConcurrencyBudget,
        top_k: usize,
    ) -> Self {
        Self {
            source,
            urls,
            documents,
            top_k: top_k.max(1),
        }
    }

    /// Fetch title, description, and up to `top_k` discussion documents.
    ///
    /// Documents come back in listing rank order whatever order their fetches
    /// finish in. Any single failure fails the item.
    #[instrument(skip_all, fields(id = entry.id, slug = %entry.slug))]
    pub async fn fetch(&self, entry: &CatalogEntry) -> Result<ItemRecord> {
        let listing_url = self.urls.discussions(&entry.slug)?;
        let description_url = self.urls.description(&entry.slug)?;

        let (listing, description_text) = tokio::try_join!(
            self.source
                .fetch_listing(&listing_url, ListingKind::Discussions),
            self.source
                .fetch_document(&description_url, ContentRegion::Description),
        )?;

        let candidates: Vec<ListingEntry> = listing.entries.into_iter().take(self.top_k).collect();
        debug!(candidates = candidates.len(), "discussion candidates selected");

        let handles: Vec<JoinHandle<Result<DocumentRecord>>> = candidates
            .into_iter()
            .map(|candidate| {
                let source = self.source.clone();
                let budget = self.documents.clone();
                tokio::spawn(async move {
                    let _permit = budget.acquire().await?;
                    fetch_document(&*source, candidate).await
                })
            })
            .collect();

        let mut documents = Vec::with_capacity(handles.len());
        let mut pending = handles.into_iter();
        while let Some(handle) = pending.next() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(DiscusskitError::Network(format!("document task failed: {e}"))),
            };
            match outcome {
                Ok(document) => documents.push(document),
                Err(e) => {
                    // Free the shared document budget for other items.
                    for rest in pending {
                        rest.abort();
                    }
                    return Err(e);
                }
            }
        }

        Ok(ItemRecord {
            title: listing.title,
            description_text,
            documents,
        })
    }
}

async fn fetch_document(source: &dyn RemoteSource, candidate: ListingEntry) -> Result<DocumentRecord> {
    let url = Url::parse(&candidate.link)
        .map_err(|e| DiscusskitError::parse(format!("bad discussion link '{}': {e}", candidate.link)))?;
    let body_text = source
        .fetch_document(&url, ContentRegion::Discussion)
        .await?;
    Ok(DocumentRecord {
        title: candidate.title,
        body_text,
        source_link: candidate.link,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::testing::{BASE, ScriptedSource, urls};

    fn two_sum() -> CatalogEntry {
        CatalogEntry {
            id: 1,
            slug: "two-sum".into(),
            is_restricted: false,
            tags: BTreeSet::new(),
        }
    }

    fn fetcher(source: Arc<ScriptedSource>, documents: usize, top_k: usize) -> ItemFetcher {
        ItemFetcher::new(
            source,
            urls(),
            ConcurrencyBudget::new("documents", documents),
            top_k,
        )
    }

    #[tokio::test]
    async fn preserves_rank_order_when_first_finishes_last() {
        let source = Arc::new(ScriptedSource::new().item(
            "two-sum",
            "Two Sum",
            "Desc",
            &[("d1", "one", 80), ("d2", "two", 5), ("d3", "three", 30)],
        ));

        let record = fetcher(source.clone(), 20, 5)
            .fetch(&two_sum())
            .await
            .unwrap();

        let titles: Vec<&str> = record.documents.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["d1", "d2", "d3"]);
        assert_eq!(record.documents[0].body_text, "one");
        assert_eq!(record.title, "Two Sum");
        assert_eq!(record.description_text, "Desc");

        // d1 really did finish last.
        let completed = source.completed();
        assert!(completed.last().unwrap().ends_with("/discuss/0"));
    }

    #[tokio::test]
    async fn truncates_to_top_k() {
        let docs: Vec<(&str, &str, u64)> = (0..8).map(|_| ("t", "b", 0)).collect();
        let source = Arc::new(ScriptedSource::new().item("two-sum", "Two Sum", "Desc", &docs));

        let record = fetcher(source, 20, 5).fetch(&two_sum()).await.unwrap();
        assert_eq!(record.documents.len(), 5);
        assert_eq!(
            record.documents[4].source_link,
            format!("{BASE}/problems/two-sum/discuss/4")
        );
    }

    #[tokio::test]
    async fn document_budget_bounds_fan_out() {
        let docs: Vec<(&str, &str, u64)> = (0..5).map(|_| ("t", "b", 20)).collect();
        let source = Arc::new(ScriptedSource::new().item("two-sum", "Two Sum", "Desc", &docs));

        fetcher(source.clone(), 2, 5).fetch(&two_sum()).await.unwrap();
        assert!(source.max_in_flight() <= 2);
    }

    #[tokio::test]
    async fn single_document_failure_fails_item() {
        let source = Arc::new(
            ScriptedSource::new()
                .item("two-sum", "Two Sum", "Desc", &[("d1", "a", 0), ("d2", "b", 0)])
                .failing_document(&format!("{BASE}/problems/two-sum/discuss/1"), 0),
        );

        let err = fetcher(source, 20, 5).fetch(&two_sum()).await.unwrap_err();
        assert!(matches!(err, DiscusskitError::Parse { .. }));
    }

    #[tokio::test]
    async fn missing_listing_fails_item() {
        let source = Arc::new(ScriptedSource::new());
        let err = fetcher(source, 20, 5).fetch(&two_sum()).await.unwrap_err();
        assert!(matches!(err, DiscusskitError::Network(_)));
    }

    #[tokio::test]
    async fn item_without_discussions_has_only_description() {
        let source = Arc::new(ScriptedSource::new().item("two-sum", "Two Sum", "Desc", &[]));
        let record = fetcher(source, 20, 5).fetch(&two_sum()).await.unwrap();
        assert!(record.documents.is_empty());
        assert_eq!(record.description_text, "Desc");
    }
}
