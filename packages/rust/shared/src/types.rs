//! Core domain types shared by the download and merge phases.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DiscusskitError, Result};

static GROUP_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("valid group name regex"));

// ---------------------------------------------------------------------------
// CatalogEntry
// ---------------------------------------------------------------------------

/// One unit of content to download, identified by a stable id and slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Frontend identifier, unique within the catalog.
    pub id: u32,
    /// Canonical slug, unique within the catalog.
    pub slug: String,
    /// Whether the item is restricted to paid accounts.
    pub is_restricted: bool,
    /// Optional tag associations from the metadata.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl CatalogEntry {
    /// Artifact file name for this entry: `{id}.{slug}.txt`.
    pub fn artifact_file_name(&self) -> String {
        artifact_file_name(self.id, &self.slug)
    }
}

/// Artifact file name for an id/slug pair: `{id}.{slug}.txt`.
pub fn artifact_file_name(id: u32, slug: &str) -> String {
    format!("{id}.{slug}.txt")
}

// ---------------------------------------------------------------------------
// Fetch records
// ---------------------------------------------------------------------------

/// One fetched discussion document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub title: String,
    pub body_text: String,
    pub source_link: String,
}

/// Everything fetched for one catalog entry, documents in rank order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub title: String,
    pub description_text: String,
    pub documents: Vec<DocumentRecord>,
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// Kind of classification a group listing comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Tag,
    Company,
}

impl GroupKind {
    /// Bundle subdirectory for this kind.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Tag => "tags",
            Self::Company => "companies",
        }
    }

    /// Path segment of the remote listing endpoint.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Company => "company",
        }
    }
}

/// A named tag or company classification.
///
/// Names become file names, so construction validates them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Group {
    kind: GroupKind,
    name: String,
}

impl Group {
    pub fn new(kind: GroupKind, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !GROUP_NAME_RE.is_match(&name) {
            return Err(DiscusskitError::validation(format!(
                "invalid group name '{name}': expected lowercase letters, digits and dashes"
            )));
        }
        Ok(Self { kind, name })
    }

    pub fn tag(name: impl Into<String>) -> Result<Self> {
        Self::new(GroupKind::Tag, name)
    }

    pub fn company(name: impl Into<String>) -> Result<Self> {
        Self::new(GroupKind::Company, name)
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bundle file name: `{name}.txt`.
    pub fn bundle_file_name(&self) -> String {
        format!("{}.txt", self.name)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.path_segment(), self.name)
    }
}
