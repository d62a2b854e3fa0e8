mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};
use quire_memory::document::SplitterConfig;

impl Config {
    /// Load configuration from a TOML file with env var overrides, then validate it.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if the
    /// resulting values fail [`Config::validate`].
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.splitter()
            .validate()
            .context("documents.chunk_overlap must be smaller than a non-zero documents.chunk_size")?;
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be at least 1");
        }
        if self.agent.max_history_turns == 0 {
            bail!("agent.max_history_turns must be at least 1");
        }
        if self.documents.embed_batch_size == 0 {
            bail!("documents.embed_batch_size must be at least 1");
        }
        Ok(())
    }

    #[must_use]
    pub fn splitter(&self) -> SplitterConfig {
        SplitterConfig {
            chunk_size: self.documents.chunk_size,
            chunk_overlap: self.documents.chunk_overlap,
        }
    }

    #[must_use]
    pub fn judge_model(&self) -> &str {
        self.evaluation
            .judge_model
            .as_deref()
            .unwrap_or(&self.llm.model)
    }
}
