use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub study: StudyConfig,
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_model() -> String {
    "phi3.5".into()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used for answers, tool classification, judging, and summaries.
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
        }
    }
}

fn default_documents_folder() -> PathBuf {
    PathBuf::from("documents")
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_max_file_size() -> u64 {
    quire_memory::document::DEFAULT_MAX_FILE_SIZE
}

fn default_embed_batch_size() -> usize {
    quire_memory::indexer::DEFAULT_EMBED_BATCH
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentsConfig {
    #[serde(default = "default_documents_folder")]
    pub folder: PathBuf,
    /// Window size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Files larger than this many bytes are skipped.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            folder: default_documents_folder(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_file_size: default_max_file_size(),
            embed_batch_size: default_embed_batch_size(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

fn default_context_char_budget() -> usize {
    6000
}

fn default_preview_chars() -> usize {
    300
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Upper bound on retrieved characters placed into the answer prompt.
    #[serde(default = "default_context_char_budget")]
    pub context_char_budget: usize,
    /// Characters of each chunk shown in the sources block.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            context_char_budget: default_context_char_budget(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_max_history_turns() -> usize {
    5
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
    /// Answer `<int> <op> <int>` questions directly without calling the model.
    #[serde(default = "default_true")]
    pub math_shortcut: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_history_turns: default_max_history_turns(),
            math_shortcut: true,
        }
    }
}

fn default_test_set() -> PathBuf {
    PathBuf::from("test_set.csv")
}

fn default_eval_output() -> PathBuf {
    PathBuf::from("evaluation_results.csv")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_test_set")]
    pub test_set: PathBuf,
    #[serde(default = "default_eval_output")]
    pub output: PathBuf,
    /// Judge model; falls back to `llm.model` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_model: Option<String>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            test_set: default_test_set(),
            output: default_eval_output(),
            judge_model: None,
        }
    }
}

fn default_summary_log() -> PathBuf {
    PathBuf::from("logs/summaries_log.csv")
}

fn default_summary_input_chars() -> usize {
    12_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_summary_log")]
    pub log_file: PathBuf,
    #[serde(default = "default_summary_input_chars")]
    pub max_input_chars: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            log_file: default_summary_log(),
            max_input_chars: default_summary_input_chars(),
        }
    }
}

fn default_study_output() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_study_input_chars() -> usize {
    8000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StudyConfig {
    #[serde(default = "default_study_output")]
    pub output_dir: PathBuf,
    #[serde(default = "default_study_input_chars")]
    pub max_input_chars: usize,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            output_dir: default_study_output(),
            max_input_chars: default_study_input_chars(),
        }
    }
}
