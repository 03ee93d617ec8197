//! Wire schema of the catalog metadata file.
//!
//! The file is the source's problem-list dump:
//! `{ "stat_status_pairs": [ { "stat": { "frontend_question_id", "question__title_slug" },
//! "paid_only", "tags"? } ] }`. Unknown fields are ignored; the listed ones are required
//! except `tags`.

use std::collections::{BTreeSet, HashSet};

use discusskit_shared::{CatalogEntry, DiscusskitError, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct RawCatalog {
    pub stat_status_pairs: Vec<RawPair>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPair {
    pub stat: RawStat,
    pub paid_only: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawStat {
    pub frontend_question_id: u32,
    #[serde(rename = "question__title_slug")]
    pub slug: String,
}

/// Parse and validate metadata JSON into entries sorted by id.
///
/// Any structural problem, empty slug, or duplicate id/slug rejects the whole file.
pub(crate) fn parse_catalog(content: &str) -> Result<Vec<CatalogEntry>> {
    let raw: RawCatalog = serde_json::from_str(content)
        .map_err(|e| DiscusskitError::catalog(format!("malformed metadata: {e}")))?;

    let mut seen_ids = HashSet::new();
    let mut seen_slugs = HashSet::new();
    let mut entries = Vec::with_capacity(raw.stat_status_pairs.len());

    for (index, pair) in raw.stat_status_pairs.into_iter().enumerate() {
        let slug = pair.stat.slug.trim().to_string();
        if slug.is_empty() {
            return Err(DiscusskitError::catalog(format!(
                "entry {index} has an empty slug"
            )));
        }
        if slug.contains(['/', '\\']) {
            return Err(DiscusskitError::catalog(format!(
                "entry {index} has slug '{slug}' containing a path separator"
            )));
        }
        let id = pair.stat.frontend_question_id;
        if !seen_ids.insert(id) {
            return Err(DiscusskitError::catalog(format!("duplicate id {id}")));
        }
        if !seen_slugs.insert(slug.clone()) {
            return Err(DiscusskitError::catalog(format!("duplicate slug '{slug}'")));
        }

        entries.push(CatalogEntry {
            id,
            slug,
            is_restricted: pair.paid_only,
            tags: pair
                .tags
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect::<BTreeSet<_>>(),
        });
    }

    entries.sort_by_key(|e| e.id);
    Ok(entries)
}
