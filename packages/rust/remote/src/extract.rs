//! Selector-driven extraction of listings and content regions.
//!
//! Extraction is synchronous and works on the response body string, so no
//! parsed `Html` is ever held across an await point.

use std::sync::LazyLock;

use discusskit_shared::{DiscusskitError, Result, SelectorConfig};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::{ContentRegion, Listing, ListingEntry, ListingKind};

/// Matches the item slug in a link path such as `/problems/two-sum/`.
static PROBLEM_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/problems/([^/?#]+)").expect("problem slug regex"));

/// Configured selectors, parsed once at startup.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    listing_title: Selector,
    listing_entry: Selector,
    entry_title: Selector,
    entry_link: Selector,
    document_content: Selector,
    description_content: Selector,
    group_title: Selector,
    group_entry: Selector,
    group_entry_link: Selector,
}

impl CompiledSelectors {
    /// Parse every configured selector; an invalid one is a config error.
    pub fn new(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            listing_title: parse("listing_title", &config.listing_title)?,
            listing_entry: parse("listing_entry", &config.listing_entry)?,
            entry_title: parse("entry_title", &config.entry_title)?,
            entry_link: parse("entry_link", &config.entry_link)?,
            document_content: parse("document_content", &config.document_content)?,
            description_content: parse("description_content", &config.description_content)?,
            group_title: parse("group_title", &config.group_title)?,
            group_entry: parse("group_entry", &config.group_entry)?,
            group_entry_link: parse("group_entry_link", &config.group_entry_link)?,
        })
    }

    /// Extract a listing from `html`, resolving links against `page_url`.
    pub(crate) fn listing(&self, html: &str, page_url: &Url, kind: ListingKind) -> Result<Listing> {
        let doc = Html::parse_document(html);
        match kind {
            ListingKind::Discussions => self.discussion_listing(&doc, page_url),
            ListingKind::Group => self.group_listing(&doc, page_url),
        }
    }

    /// Text of the requested content region.
    pub(crate) fn region(&self, html: &str, region: ContentRegion) -> Result<String> {
        let doc = Html::parse_document(html);
        let (selector, name) = match region {
            ContentRegion::Discussion => (&self.document_content, "discussion content"),
            ContentRegion::Description => (&self.description_content, "description content"),
        };
        doc.select(selector)
            .next()
            .map(element_text)
            .ok_or_else(|| DiscusskitError::parse(format!("{name} region not found")))
    }

    fn discussion_listing(&self, doc: &Html, page_url: &Url) -> Result<Listing> {
        let title = doc
            .select(&self.listing_title)
            .next()
            .map(element_text)
            .ok_or_else(|| DiscusskitError::parse("listing title region not found"))?;

        let mut entries = Vec::new();
        for (rank, entry) in doc.select(&self.listing_entry).enumerate() {
            let entry_title = entry
                .select(&self.entry_title)
                .next()
                .map(element_text)
                .ok_or_else(|| {
                    DiscusskitError::parse(format!("entry {rank} has no title region"))
                })?;
            let link = entry
                .select(&self.entry_link)
                .next()
                .and_then(|el| el.value().attr("href"))
                .ok_or_else(|| DiscusskitError::parse(format!("entry {rank} has no link")))?;
            entries.push(ListingEntry {
                title: entry_title,
                link: resolve(page_url, link)?,
            });
        }

        Ok(Listing { title, entries })
    }

    fn group_listing(&self, doc: &Html, page_url: &Url) -> Result<Listing> {
        let title = doc
            .select(&self.group_title)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let mut entries = Vec::new();
        for row in doc.select(&self.group_entry) {
            // Header and pagination rows carry no item link.
            let Some(link_el) = row.select(&self.group_entry_link).next() else {
                continue;
            };
            let Some(href) = link_el.value().attr("href") else {
                continue;
            };
            entries.push(ListingEntry {
                title: element_text(link_el),
                link: resolve(page_url, href)?,
            });
        }
        debug!(%page_url, entries = entries.len(), "group listing extracted");

        Ok(Listing { title, entries })
    }
}

/// Slug of the item a link points at, if it is an item link.
pub fn slug_from_link(link: &str) -> Option<String> {
    let path = match Url::parse(link) {
        Ok(url) => url.path().to_string(),
        Err(_) => link.to_string(),
    };
    PROBLEM_SLUG_RE
        .captures(&path)
        .map(|caps| caps[1].to_string())
}

fn parse(name: &str, raw: &str) -> Result<Selector> {
    Selector::parse(raw)
        .map_err(|e| DiscusskitError::config(format!("invalid selectors.{name} '{raw}': {e}")))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn resolve(base: &Url, href: &str) -> Result<String> {
    let mut resolved = base
        .join(href)
        .map_err(|e| DiscusskitError::parse(format!("bad link '{href}': {e}")))?;
    resolved.set_fragment(None);
    Ok(resolved.to_string())
}
