//! Load a document folder into an index and answer questions from it.

use std::fmt;
use std::path::Path;

use quire_llm::{LlmError, LlmProvider};
use quire_memory::document::{DocumentError, Ingestion, Ingestor, TextSplitter};
use quire_memory::{IndexError, IndexSlot, ScoredChunk, build_index};

use crate::config::{Config, RetrievalConfig};
use crate::prompt::{PromptExtras, answer_prompt, build_context, format_sources};

#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("index not ready: load documents first")]
    IndexNotReady,

    #[error("top_k must be at least 1")]
    InvalidTopK,

    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Outcome of a load action, shown to the user as a status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded {
        chunks: usize,
        files: usize,
        skipped: usize,
    },
    /// The folder was empty or no file yielded text. Any previous index is dropped.
    NoDocuments,
    /// Listing, embedding, or indexing failed. The previous index, if any, is kept.
    Failed(String),
}

impl LoadStatus {
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded {
                chunks,
                files,
                skipped: 0,
            } => write!(f, "Loaded {chunks} chunks from {files} files."),
            Self::Loaded {
                chunks,
                files,
                skipped,
            } => write!(
                f,
                "Loaded {chunks} chunks from {files} files ({skipped} skipped)."
            ),
            Self::NoDocuments => f.write_str("No documents loaded or no text extracted."),
            Self::Failed(reason) => write!(f, "Load failed: {reason}"),
        }
    }
}

/// An answer with the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    /// Rendered citation block; empty when nothing was retrieved.
    pub sources: String,
    pub hits: Vec<ScoredChunk>,
    /// Set when `text` is an error message rather than a model answer.
    pub failed: bool,
}

impl Answer {
    #[must_use]
    pub fn direct(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: String::new(),
            hits: Vec::new(),
            failed: false,
        }
    }

    fn failure(text: String, sources: String, hits: Vec<ScoredChunk>) -> Self {
        Self {
            text,
            sources,
            hits,
            failed: true,
        }
    }
}

pub struct KnowledgeBase<P> {
    provider: P,
    slot: IndexSlot,
    ingestor: Ingestor,
    splitter: TextSplitter,
    embed_batch_size: usize,
    retrieval: RetrievalConfig,
}

impl<P> fmt::Debug for KnowledgeBase<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("ready", &self.slot.is_ready())
            .field("splitter", &self.splitter.config())
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider> KnowledgeBase<P> {
    /// # Errors
    ///
    /// Returns an error if the chunking settings are invalid.
    pub fn new(provider: P, config: &Config) -> Result<Self, RagError> {
        Ok(Self {
            provider,
            slot: IndexSlot::new(),
            ingestor: Ingestor::new(config.documents.max_file_size),
            splitter: TextSplitter::new(config.splitter())?,
            embed_batch_size: config.documents.embed_batch_size,
            retrieval: config.retrieval.clone(),
        })
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub fn retrieval(&self) -> &RetrievalConfig {
        &self.retrieval
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.slot.is_ready()
    }

    /// Read, chunk, and embed every document in `folder`, then swap in the new index.
    ///
    /// Never fails: problems are reported through the returned status. A folder
    /// without usable documents clears the index; a failed listing or build keeps
    /// the previous one.
    pub async fn load(&self, folder: &Path) -> LoadStatus {
        if !self.provider.supports_embeddings() {
            tracing::warn!(provider = self.provider.name(), "provider cannot embed");
            return LoadStatus::Failed(format!(
                "provider {} does not support embeddings",
                self.provider.name()
            ));
        }

        let (documents, skipped) = match self.ingestor.ingest_folder(folder).await {
            Ok(Ingestion::Loaded { documents, skipped }) => (documents, skipped.len()),
            Ok(Ingestion::NothingLoaded { skipped }) => {
                tracing::info!(skipped = skipped.len(), "no documents loaded, index cleared");
                self.slot.clear();
                return LoadStatus::NoDocuments;
            }
            Err(e) => {
                tracing::warn!(folder = %folder.display(), "cannot read document folder: {e}");
                return LoadStatus::Failed(format!("cannot read {}: {e}", folder.display()));
            }
        };

        let chunks = self.splitter.split_all(&documents);
        let chunk_count = chunks.len();
        match build_index(&self.provider, chunks, self.embed_batch_size).await {
            Ok(index) => {
                self.slot.replace(index);
                let status = LoadStatus::Loaded {
                    chunks: chunk_count,
                    files: documents.len(),
                    skipped,
                };
                tracing::info!(%status, "documents loaded");
                status
            }
            Err(e) => {
                tracing::warn!("index build failed, keeping previous index: {e}");
                LoadStatus::Failed(e.to_string())
            }
        }
    }

    /// The `min(k, n)` chunks nearest to `question`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexNotReady`] before the first successful load, and
    /// embedding or search errors otherwise.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        if k == 0 {
            return Err(RagError::InvalidTopK);
        }
        let index = self.slot.current().ok_or(RagError::IndexNotReady)?;
        let query = self.provider.embed(question).await?;
        Ok(index.search(&query, k)?)
    }

    /// Answer from the `k` nearest chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexNotReady`] if nothing has been loaded and
    /// [`RagError::InvalidTopK`] for `k == 0`. Embedding and generation failures
    /// are reported inside the [`Answer`] instead.
    pub async fn ask(&self, question: &str, k: usize) -> Result<Answer, RagError> {
        self.ask_with(question, k, PromptExtras::default()).await
    }

    /// Like [`KnowledgeBase::ask`], with agent history and tool output in the prompt.
    ///
    /// # Errors
    ///
    /// See [`KnowledgeBase::ask`].
    pub async fn ask_with(
        &self,
        question: &str,
        k: usize,
        extras: PromptExtras<'_>,
    ) -> Result<Answer, RagError> {
        let hits = match self.retrieve(question, k).await {
            Ok(hits) => hits,
            Err(e @ (RagError::IndexNotReady | RagError::InvalidTopK)) => return Err(e),
            Err(e) => {
                tracing::warn!("retrieval failed: {e}");
                return Ok(Answer::failure(
                    format!("Error retrieving context: {e}"),
                    String::new(),
                    Vec::new(),
                ));
            }
        };

        let sources = format_sources(&hits, self.retrieval.preview_chars);
        let context = build_context(&hits, self.retrieval.context_char_budget);
        let prompt = answer_prompt(question, &context, extras);

        match self.provider.generate(&prompt).await {
            Ok(text) => Ok(Answer {
                text,
                sources,
                hits,
                failed: false,
            }),
            Err(e) => {
                tracing::warn!("answer generation failed: {e}");
                Ok(Answer::failure(
                    format!("Error generating answer: {e}"),
                    sources,
                    hits,
                ))
            }
        }
    }
}
