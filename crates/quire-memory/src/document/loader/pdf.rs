use std::path::Path;
use std::pin::Pin;

use super::super::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, DocumentMetadata,
};
use super::source_name;

pub struct PdfLoader {
    pub max_file_size: u64,
    /// Inserted between the text of consecutive pages.
    pub page_separator: String,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            page_separator: "\n".to_owned(),
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Document, DocumentError>> + Send + '_>>
    {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        let separator = self.page_separator.clone();
        Box::pin(async move {
            let meta = tokio::fs::metadata(&path).await?;
            if meta.len() > max_size {
                return Err(DocumentError::FileTooLarge(meta.len()));
            }

            let source = source_name(&path);
            let path_buf = path.clone();
            let pages = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_by_pages(&path_buf)
                    .map_err(|e| DocumentError::Pdf(e.to_string()))
            })
            .await
            .map_err(|e| DocumentError::Io(std::io::Error::other(e)))??;

            tracing::debug!(file = %source, pages = pages.len(), "extracted PDF text");

            let content = pages
                .iter()
                .map(|page| page.trim_end())
                .filter(|page| !page.is_empty())
                .collect::<Vec<_>>()
                .join(&separator);

            Ok(Document {
                content,
                metadata: DocumentMetadata::new(source, "application/pdf"),
            })
        })
    }
}
