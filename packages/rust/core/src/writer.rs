//! Artifact writer.
//!
//! Artifacts are append-only: every call opens `{dir}/{file_name}` in append
//! mode and adds one `{title}\r\n\r\n{body}\r\n\r\n` block. Appending the same
//! block twice writes it twice; resumable runs never revisit an existing
//! artifact, which is what keeps re-runs clean.

use std::path::PathBuf;

use discusskit_shared::{CatalogEntry, DiscusskitError, ItemRecord, Result};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Block separator between a title, its body, and the next block.
const SEPARATOR: &str = "\r\n\r\n";

/// Render one artifact block.
pub fn render_block(title: &str, body: &str) -> String {
    format!("{title}{SEPARATOR}{body}{SEPARATOR}")
}

#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `{dir}/{id}.{slug}.txt`
    pub fn path_for(&self, entry: &CatalogEntry) -> PathBuf {
        self.dir.join(entry.artifact_file_name())
    }

    /// Append one block to `file_name`, creating the directory and file if needed.
    pub async fn append(&self, file_name: &str, title: &str, body: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DiscusskitError::io(&self.dir, e))?;

        let path = self.dir.join(file_name);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| DiscusskitError::io(&path, e))?;

        file.write_all(render_block(title, body).as_bytes())
            .await
            .map_err(|e| DiscusskitError::io(&path, e))?;
        file.flush().await.map_err(|e| DiscusskitError::io(&path, e))
    }

    /// Write a fetched item: description block, then documents in rank order.
    ///
    /// An I/O error between blocks leaves the blocks already written in place.
    pub async fn write_item(&self, entry: &CatalogEntry, record: &ItemRecord) -> Result<PathBuf> {
        let file_name = entry.artifact_file_name();
        self.append(&file_name, &record.title, &record.description_text)
            .await?;
        for document in &record.documents {
            self.append(&file_name, &document.title, &document.body_text)
                .await?;
        }
        debug!(
            file = %file_name,
            blocks = record.documents.len() + 1,
            "artifact written"
        );
        Ok(self.path_for(entry))
    }
}
