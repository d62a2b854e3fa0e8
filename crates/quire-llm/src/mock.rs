//! Test-only mock LLM provider.

use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

/// How the mock produces embeddings.
#[derive(Debug, Clone, PartialEq)]
pub enum MockEmbedding {
    /// Embeddings unsupported; `embed` fails.
    Disabled,
    /// Every text maps to the same vector.
    Fixed(Vec<f32>),
    /// Byte histogram of the text folded into `dim` buckets: identical texts
    /// get identical vectors, different texts usually differ.
    Hashed { dim: usize },
    /// Every embedding call fails.
    Failing,
}

#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
    pub default_response: String,
    pub embedding: MockEmbedding,
    pub fail_chat: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            embedding: MockEmbedding::Hashed { dim: 64 },
            fail_chat: false,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: MockEmbedding) -> Self {
        self.embedding = embedding;
        self
    }

    #[must_use]
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    /// Every message list passed to `chat`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    /// Content of the last message of the most recent `chat` call.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn last_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .and_then(|msgs| msgs.last())
            .map(|m| m.content.clone())
    }
}

fn hashed_embedding(text: &str, dim: usize) -> Vec<f32> {
    let dim = dim.max(1);
    let mut vector = vec![0.0f32; dim];
    for (i, byte) in text.bytes().enumerate() {
        vector[usize::from(byte) % dim] += 1.0;
        // Position-weighted bucket so anagrams land apart.
        vector[(usize::from(byte) + i) % dim] += 0.5;
    }
    vector
}

impl LlmProvider for MockProvider {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        match &self.embedding {
            MockEmbedding::Disabled => Err(LlmError::EmbedUnsupported { provider: "mock" }),
            MockEmbedding::Fixed(v) => Ok(v.clone()),
            MockEmbedding::Hashed { dim } => Ok(hashed_embedding(text, *dim)),
            MockEmbedding::Failing => Err(LlmError::Other("mock embedding error".into())),
        }
    }

    fn supports_embeddings(&self) -> bool {
        !matches!(self.embedding, MockEmbedding::Disabled)
    }
}
