use std::path::PathBuf;

use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("QUIRE_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("QUIRE_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("QUIRE_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("QUIRE_DOCUMENTS_FOLDER") {
            self.documents.folder = PathBuf::from(v);
        }
        if let Some(n) = parse_usize("QUIRE_CHUNK_SIZE") {
            self.documents.chunk_size = n;
        }
        if let Some(n) = parse_usize("QUIRE_CHUNK_OVERLAP") {
            self.documents.chunk_overlap = n;
        }
        if let Some(n) = parse_usize("QUIRE_TOP_K") {
            self.retrieval.top_k = n;
        }
        if let Some(n) = parse_usize("QUIRE_MAX_HISTORY_TURNS") {
            self.agent.max_history_turns = n;
        }
    }
}

fn parse_usize(key: &str) -> Option<usize> {
    let v = std::env::var(key).ok()?;
    match v.trim().parse::<usize>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!("ignoring invalid {key} value: {v}");
            None
        }
    }
}
