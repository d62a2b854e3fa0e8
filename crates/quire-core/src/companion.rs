//! Stateless persona chat about the book's topics. No retrieval.

use quire_llm::{LlmError, LlmProvider, Message};

pub const REDIRECT: &str = "I'm focused on helping with the AI Engineering book topics. \
     What part of prompting, RAG, evaluation, reliability or deployment would you like to talk about?";

#[must_use]
pub fn system_prompt() -> String {
    format!(
        "You are \"AI Engineering Companion\", a friendly helper for readers of a practical \
         AI engineering book.\n\n\
         Your only job is to help readers understand and apply the book's main topics:\n\
         - Prompt engineering\n\
         - Retrieval-Augmented Generation (RAG)\n\
         - Evaluation, testing, and reliability\n\
         - Guardrails and safe failure modes\n\
         - Deployment and monitoring of local AI systems\n\
         - Offline, zero-cost tools such as Ollama\n\n\
         Always answer in simple, beginner-friendly language. \
         Give short examples or small experiments when possible. Be encouraging.\n\
         If the question has nothing to do with the book or AI engineering, politely say:\n\
         \"{REDIRECT}\""
    )
}

/// Answer one message with the companion persona. Each call is independent.
///
/// # Errors
///
/// Returns the provider error if the chat call fails.
pub async fn reply<P: LlmProvider>(provider: &P, message: &str) -> Result<String, LlmError> {
    let messages = [Message::system(system_prompt()), Message::user(message)];
    let response = provider.chat(&messages).await?;
    Ok(response.trim().to_owned())
}
