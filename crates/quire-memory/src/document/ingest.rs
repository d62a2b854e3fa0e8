//! Folder ingestion: one document per readable file, per-file failures skipped.

use std::path::{Path, PathBuf};

use super::{DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentReader, read_document};

/// A file left out of the corpus and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub enum Ingestion {
    /// At least one file produced text. Documents are ordered by file name.
    Loaded {
        documents: Vec<Document>,
        skipped: Vec<SkippedFile>,
    },
    /// The folder was empty or no file produced text.
    NothingLoaded { skipped: Vec<SkippedFile> },
}

impl Ingestion {
    #[must_use]
    pub fn skipped(&self) -> &[SkippedFile] {
        match self {
            Self::Loaded { skipped, .. } | Self::NothingLoaded { skipped } => skipped,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ingestor {
    max_file_size: u64,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl Ingestor {
    #[must_use]
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    /// Read every supported file directly inside `folder`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the folder itself cannot be listed. Problems with
    /// individual files are logged and reported in [`Ingestion::skipped`].
    pub async fn ingest_folder(&self, folder: &Path) -> Result<Ingestion, DocumentError> {
        let mut paths = Vec::new();
        let mut skipped = Vec::new();
        let mut entries = tokio::fs::read_dir(folder).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            // Follows symlinks, so a linked file counts as a file.
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => paths.push(path),
                Ok(_) => tracing::debug!(path = %path.display(), "ignoring non-file entry"),
                Err(e) => {
                    tracing::warn!(file = %path.display(), "skipping unreadable entry: {e}");
                    skipped.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
        paths.sort();
        skipped.sort_by(|a, b| a.path.cmp(&b.path));

        let mut documents = Vec::with_capacity(paths.len());

        for path in paths {
            if DocumentReader::for_path(&path) == DocumentReader::Unsupported {
                tracing::warn!(file = %path.display(), "skipping file with unsupported extension");
                skipped.push(SkippedFile {
                    path,
                    reason: "unsupported extension".into(),
                });
                continue;
            }
            match read_document(&path, self.max_file_size).await {
                Ok(doc) => {
                    tracing::debug!(
                        file = %doc.metadata.source,
                        chars = doc.content.chars().count(),
                        "loaded document"
                    );
                    documents.push(doc);
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), "skipping file: {e}");
                    skipped.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            folder = %folder.display(),
            loaded = documents.len(),
            skipped = skipped.len(),
            "document ingestion finished"
        );

        if documents.is_empty() {
            Ok(Ingestion::NothingLoaded { skipped })
        } else {
            Ok(Ingestion::Loaded { documents, skipped })
        }
    }
}
