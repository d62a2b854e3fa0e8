use std::future::Future;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Capitalized label used when rendering a transcript into a prompt.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::System => "System",
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

pub trait LlmProvider: Send + Sync {
    /// Send messages to the LLM and return the assistant response.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is invalid.
    fn chat(&self, messages: &[Message]) -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Single-turn completion: the prompt is sent as one user message.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying chat call fails.
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, LlmError>> + Send {
        let messages = vec![Message::user(prompt)];
        async move {
            let response = self.chat(&messages).await?;
            Ok(response.trim().to_owned())
        }
    }

    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider does not support embeddings or the request fails.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    /// Embed several texts, returning vectors in input order.
    ///
    /// The default issues one request per text; backends with a batch endpoint override it.
    ///
    /// # Errors
    ///
    /// Returns the first embedding error encountered.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, LlmError>> + Send {
        async move {
            let mut vectors = Vec::with_capacity(texts.len());
            for text in texts {
                vectors.push(self.embed(text).await?);
            }
            Ok(vectors)
        }
    }

    fn supports_embeddings(&self) -> bool;

    fn name(&self) -> &str;

    /// Ask for a JSON reply matching `T`'s schema and deserialize it.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::StructuredParse`] when the reply is not valid JSON for `T`,
    /// or the chat error if the call itself fails.
    fn chat_typed<T>(&self, messages: &[Message]) -> impl Future<Output = Result<T, LlmError>> + Send
    where
        T: DeserializeOwned + JsonSchema + 'static,
    {
        let schema = schemars::schema_for!(T);
        let instruction = serde_json::to_string(&schema).map(|schema| {
            format!(
                "Respond with JSON only, no prose and no markdown. \
                 The JSON must validate against this schema:\n{schema}"
            )
        });
        async move {
            let mut request = Vec::with_capacity(messages.len() + 1);
            request.push(Message::system(instruction?));
            request.extend_from_slice(messages);
            let raw = self.chat(&request).await?;
            parse_structured(&raw)
        }
    }
}

/// Remove a surrounding markdown code fence (```` ``` ```` or ```` ```json ````) if present.
#[must_use]
pub fn strip_json_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a model reply as JSON for `T`, tolerating code fences.
///
/// # Errors
///
/// Returns [`LlmError::StructuredParse`] if the payload does not deserialize into `T`.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
    serde_json::from_str(strip_json_fences(raw))
        .map_err(|e| LlmError::StructuredParse(format!("{e}: {}", preview(raw))))
}

fn preview(raw: &str) -> String {
    const MAX: usize = 120;
    if raw.chars().count() <= MAX {
        raw.to_owned()
    } else {
        let head: String = raw.chars().take(MAX).collect();
        format!("{head}…")
    }
}
