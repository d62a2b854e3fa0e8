pub mod error;
pub mod ingest;
pub mod loader;
pub mod splitter;
pub mod types;

pub use error::DocumentError;
pub use ingest::{Ingestion, Ingestor, SkippedFile};
pub use loader::TextLoader;
pub use splitter::{SplitterConfig, TextSplitter};
pub use types::{Chunk, Document, DocumentMetadata};

#[cfg(feature = "pdf")]
pub use loader::PdfLoader;

use std::path::Path;

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

pub trait DocumentLoader: Send + Sync {
    fn load(
        &self,
        path: &Path,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Document, DocumentError>> + Send + '_>,
    >;
}

/// Reader chosen for a file by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentReader {
    Pdf,
    PlainText,
    /// Extension we do not read; the file is skipped.
    Unsupported,
}

impl DocumentReader {
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Self::Pdf,
            Some("txt" | "md" | "markdown") => Self::PlainText,
            _ => Self::Unsupported,
        }
    }

    /// Extract the full text of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported formats, oversized files, and read or parse failures.
    pub async fn read(self, path: &Path, max_file_size: u64) -> Result<Document, DocumentError> {
        match self {
            Self::PlainText => TextLoader { max_file_size }.load(path).await,
            #[cfg(feature = "pdf")]
            Self::Pdf => {
                PdfLoader {
                    max_file_size,
                    ..PdfLoader::default()
                }
                .load(path)
                .await
            }
            #[cfg(not(feature = "pdf"))]
            Self::Pdf => Err(DocumentError::UnsupportedFormat(
                "pdf (built without the `pdf` feature)".into(),
            )),
            Self::Unsupported => Err(DocumentError::UnsupportedFormat(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("<none>")
                    .to_owned(),
            )),
        }
    }
}

/// Read a single document, rejecting whitespace-only results.
///
/// # Errors
///
/// Returns [`DocumentError::EmptyContent`] when no text could be extracted,
/// or the reader's error.
pub async fn read_document(path: &Path, max_file_size: u64) -> Result<Document, DocumentError> {
    let doc = DocumentReader::for_path(path)
        .read(path, max_file_size)
        .await?;
    if doc.content.trim().is_empty() {
        return Err(DocumentError::EmptyContent(doc.metadata.source));
    }
    Ok(doc)
}
