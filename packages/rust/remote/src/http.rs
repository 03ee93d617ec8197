//! HTTP implementation of [`RemoteSource`].

use async_trait::async_trait;
use discusskit_shared::{DiscusskitError, FetchConfig, Result, SelectorConfig};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::extract::CompiledSelectors;
use crate::{ContentRegion, Listing, ListingKind, RemoteSource};

/// Redirects followed before a request fails.
const MAX_REDIRECTS: usize = 5;

/// Fetches pages with a shared reqwest client and extracts regions with scraper.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    selectors: CompiledSelectors,
}

impl HttpSource {
    /// Build the client (user agent, timeout, redirect limit) and parse selectors.
    pub fn new(config: &FetchConfig, selectors: &SelectorConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DiscusskitError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            selectors: CompiledSelectors::new(selectors)?,
        })
    }

    async fn get_text(&self, url: &Url) -> Result<String> {
        debug!(%url, "fetching");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| DiscusskitError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscusskitError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| DiscusskitError::Network(format!("{url}: body read failed: {e}")))
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_listing(&self, url: &Url, kind: ListingKind) -> Result<Listing> {
        let body = self.get_text(url).await?;
        self.selectors
            .listing(&body, url, kind)
            .map_err(|e| with_url(e, url))
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_document(&self, url: &Url, region: ContentRegion) -> Result<String> {
        let body = self.get_text(url).await?;
        self.selectors
            .region(&body, region)
            .map_err(|e| with_url(e, url))
    }
}

/// Attach the page URL to parse errors so the operator can find the page.
fn with_url(err: DiscusskitError, url: &Url) -> DiscusskitError {
    match err {
        DiscusskitError::Parse { message } => DiscusskitError::parse(format!("{url}: {message}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(server: &MockServer, timeout: Duration) -> HttpSource {
        let config = FetchConfig {
            item_concurrency: 1,
            document_concurrency: 1,
            group_concurrency: 1,
            top_k: 5,
            request_timeout: timeout,
            user_agent: "discusskit-test".into(),
            base_url: Url::parse(&server.uri()).unwrap(),
        };
        HttpSource::new(&config, &SelectorConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn fetches_and_extracts_listing() {
        let server = MockServer::start().await;
        let page = r#"<html><body>
            <div class="title__27Kb">Two Sum</div>
            <div class="topic-item-wrap__2FSZ">
                <a class="title-link__1ay5" href="/problems/two-sum/discuss/1/a"><span class="topic-title__3LYM">T1</span></a>
            </div>
        </body></html>"#;

        Mock::given(method("GET"))
            .and(path("/problems/two-sum/discuss/"))
            .and(query_param("orderBy", "most_votes"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        let source = source_for(&server, Duration::from_secs(5));
        let url = Url::parse(&format!(
            "{}/problems/two-sum/discuss/?currentPage=1&orderBy=most_votes",
            server.uri()
        ))
        .unwrap();
        let listing = source
            .fetch_listing(&url, ListingKind::Discussions)
            .await
            .unwrap();

        assert_eq!(listing.title, "Two Sum");
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(
            listing.entries[0].link,
            format!("{}/problems/two-sum/discuss/1/a", server.uri())
        );
    }

    #[tokio::test]
    async fn http_error_status_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(path("/problems/gone/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = source_for(&server, Duration::from_secs(5));
        let url = Url::parse(&format!("{}/problems/gone/", server.uri())).unwrap();
        let err = source
            .fetch_document(&url, ContentRegion::Description)
            .await
            .unwrap_err();
        assert!(matches!(err, DiscusskitError::Network(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn missing_region_names_the_page() {
        let server = MockServer::start().await;
        Mock::given(path("/discuss/7"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>moved</p>"))
            .mount(&server)
            .await;

        let source = source_for(&server, Duration::from_secs(5));
        let url = Url::parse(&format!("{}/discuss/7", server.uri())).unwrap();
        let err = source
            .fetch_document(&url, ContentRegion::Discussion)
            .await
            .unwrap_err();
        assert!(matches!(err, DiscusskitError::Parse { .. }));
        assert!(err.to_string().contains("/discuss/7"));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<div class=\"discuss-markdown-container\">late</div>")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let source = source_for(&server, Duration::from_millis(200));
        let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();
        let err = source
            .fetch_document(&url, ContentRegion::Discussion)
            .await
            .unwrap_err();
        assert!(matches!(err, DiscusskitError::Network(_)));
    }
}
