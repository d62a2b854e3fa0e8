//! LLM provider abstraction and the Ollama backend.

pub mod any;
pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod provider;

pub use error::LlmError;
pub use provider::{LlmProvider, Message, Role};
