//! Catalog loading, work selection, and the slug index.
//!
//! The catalog is static metadata loaded once per run. Selection turns it into
//! an id-ordered sequence of [`FetchJob`]s for the download phase; the
//! [`SlugIndex`] maps listing slugs back to ids for the merge phase.

mod schema;

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use discusskit_shared::{CatalogEntry, DiscusskitError, Result};
use tracing::{debug, info, instrument};

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Which access tier a batch covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    /// Entries not restricted to paid accounts.
    #[default]
    Free,
    /// Paid-only entries.
    Restricted,
    /// Every entry.
    Any,
}

/// Selection predicate applied once per entry when jobs are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub access: Access,
    /// Skip entries whose artifact is already on disk.
    pub resume: bool,
}

impl Selection {
    /// Evaluate the predicate. Pure in the restriction flag and artifact presence.
    pub fn matches(&self, entry: &CatalogEntry, artifact_dir: &Path) -> bool {
        let tier = match self.access {
            Access::Free => !entry.is_restricted,
            Access::Restricted => entry.is_restricted,
            Access::Any => true,
        };
        tier && !(self.resume && is_complete(entry, artifact_dir))
    }
}

/// Whether the entry's artifact is materialized.
///
/// Checks **presence only**. A truncated artifact left by an interrupted write
/// still counts as complete; making this content-aware changes what `--resume`
/// skips.
pub fn is_complete(entry: &CatalogEntry, artifact_dir: &Path) -> bool {
    artifact_dir.join(entry.artifact_file_name()).is_file()
}

/// One catalog entry bound to the download phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    pub entry: CatalogEntry,
}

// ---------------------------------------------------------------------------
// SlugIndex
// ---------------------------------------------------------------------------

/// Read-only slug → id mapping, cheap to clone and share across tasks.
#[derive(Debug, Clone, Default)]
pub struct SlugIndex {
    ids: Arc<HashMap<String, u32>>,
}

impl SlugIndex {
    pub fn get(&self, slug: &str) -> Option<u32> {
        self.ids.get(slug).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<(String, u32)> for SlugIndex {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self {
            ids: Arc::new(iter.into_iter().collect()),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Counts by access tier, for operator display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    pub total: usize,
    pub free: usize,
    pub restricted: usize,
}

/// Validated catalog, entries sorted by id ascending.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Load and validate the metadata file. Any problem is fatal.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DiscusskitError::catalog(format!("cannot read {}: {e}", path.display()))
        })?;
        let catalog = Self::from_json(&content)?;
        info!(entries = catalog.entries.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Parse and validate metadata from a JSON string.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(Self {
            entries: schema::parse_catalog(content)?,
        })
    }

    /// Build from already-validated entries (sorted by id here).
    pub fn from_entries(mut entries: Vec<CatalogEntry>) -> Self {
        entries.sort_by_key(|e| e.id);
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.slug == slug)
    }

    /// Jobs for every entry matching `selection`, in id order.
    ///
    /// The predicate is evaluated here, once; artifacts appearing later in the
    /// run do not cancel already-selected jobs.
    pub fn select(&self, selection: &Selection, artifact_dir: &Path) -> Vec<FetchJob> {
        let jobs: Vec<FetchJob> = self
            .entries
            .iter()
            .filter(|e| selection.matches(e, artifact_dir))
            .map(|e| FetchJob { entry: e.clone() })
            .collect();
        debug!(
            ?selection,
            selected = jobs.len(),
            total = self.entries.len(),
            "selection evaluated"
        );
        jobs
    }

    pub fn slug_index(&self) -> SlugIndex {
        self.entries
            .iter()
            .map(|e| (e.slug.clone(), e.id))
            .collect()
    }

    /// Union of all tags in the metadata, sorted.
    pub fn tags(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .flat_map(|e| e.tags.iter().cloned())
            .collect()
    }

    pub fn stats(&self) -> CatalogStats {
        let restricted = self.entries.iter().filter(|e| e.is_restricted).count();
        CatalogStats {
            total: self.entries.len(),
            free: self.entries.len() - restricted,
            restricted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, slug: &str, is_restricted: bool) -> CatalogEntry {
        CatalogEntry {
            id,
            slug: slug.into(),
            is_restricted,
            tags: BTreeSet::new(),
        }
    }

    fn sample() -> Catalog {
        Catalog::from_entries(vec![
            entry(3, "longest-substring", false),
            entry(1, "two-sum", false),
            entry(2, "add-two-numbers", true),
            entry(4, "median-of-two-sorted-arrays", true),
        ])
    }

    #[test]
    fn access_tiers_partition_catalog() {
        let catalog = sample();
        let dir = tempfile::tempdir().unwrap();

        let free = catalog.select(&Selection::default(), dir.path());
        let restricted = catalog.select(
            &Selection {
                access: Access::Restricted,
                resume: false,
            },
            dir.path(),
        );

        assert_eq!(free.len() + restricted.len(), catalog.entries().len());
        assert!(free.iter().all(|j| !j.entry.is_restricted));
        assert!(restricted.iter().all(|j| j.entry.is_restricted));
        for job in &free {
            assert!(!restricted.iter().any(|r| r.entry.id == job.entry.id));
        }
    }

    #[test]
    fn jobs_are_sorted_by_id() {
        let catalog = sample();
        let dir = tempfile::tempdir().unwrap();
        let all = catalog.select(
            &Selection {
                access: Access::Any,
                resume: false,
            },
            dir.path(),
        );
        let ids: Vec<u32> = all.iter().map(|j| j.entry.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn resume_skips_materialized_artifacts() {
        let catalog = sample();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1.two-sum.txt"), "partial").unwrap();

        let fresh = catalog.select(&Selection::default(), dir.path());
        assert_eq!(fresh.len(), 2);

        let resumed = catalog.select(
            &Selection {
                access: Access::Free,
                resume: true,
            },
            dir.path(),
        );
        let slugs: Vec<&str> = resumed.iter().map(|j| j.entry.slug.as_str()).collect();
        assert_eq!(slugs, vec!["longest-substring"]);
    }

    #[test]
    fn is_complete_checks_presence_only() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(1, "two-sum", false);
        assert!(!is_complete(&e, dir.path()));
        std::fs::write(dir.path().join("1.two-sum.txt"), "").unwrap();
        assert!(is_complete(&e, dir.path()));
    }

    #[test]
    fn slug_index_resolves_ids() {
        let index = sample().slug_index();
        assert_eq!(index.get("two-sum"), Some(1));
        assert_eq!(index.get("missing"), None);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn load_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load(&dir.path().join("problems.json")).unwrap_err();
        assert!(matches!(err, DiscusskitError::Catalog { .. }));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("problems.json");
        std::fs::write(
            &path,
            r#"{"stat_status_pairs": [
                {"stat": {"frontend_question_id": 1, "question__title_slug": "two-sum"}, "paid_only": false, "tags": ["array"]},
                {"stat": {"frontend_question_id": 2, "question__title_slug": "add-two-numbers"}, "paid_only": true, "tags": ["linked-list", "array"]}
            ]}"#,
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(
            catalog.stats(),
            CatalogStats {
                total: 2,
                free: 1,
                restricted: 1
            }
        );
        let tags: Vec<String> = catalog.tags().into_iter().collect();
        assert_eq!(tags, vec!["array", "linked-list"]);
        assert_eq!(catalog.get_by_slug("add-two-numbers").map(|e| e.id), Some(2));
    }
}
