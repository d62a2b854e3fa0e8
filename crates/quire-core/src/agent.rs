//! Conversational question answering with bounded history and tool dispatch.

use std::sync::LazyLock;

use quire_llm::LlmProvider;
use regex::Regex;

use crate::config::AgentConfig;
use crate::history::History;
use crate::prompt::PromptExtras;
use crate::rag::{Answer, KnowledgeBase, RagError};
use crate::tools;
use crate::tools::calculator::{self, CALCULATION_ERROR};

static SIMPLE_ARITHMETIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\s*[\+\-\*/xX]\s*\d+").expect("arithmetic regex is valid")
});

pub struct Agent<'a, P> {
    kb: &'a KnowledgeBase<P>,
    history: History,
    top_k: usize,
    math_shortcut: bool,
}

impl<'a, P: LlmProvider> Agent<'a, P> {
    #[must_use]
    pub fn new(kb: &'a KnowledgeBase<P>, config: &AgentConfig, top_k: usize) -> Self {
        Self {
            kb,
            history: History::new(config.max_history_turns),
            top_k,
            math_shortcut: config.math_shortcut,
        }
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Answer one turn of the conversation.
    ///
    /// Simple `<int> <op> <int>` questions are computed directly. Otherwise the model
    /// picks a tool, the tool runs, and the answer is generated from the retrieved
    /// context, the history, and the tool output.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexNotReady`] when a retrieval is needed before any
    /// documents were loaded.
    pub async fn ask(&mut self, question: &str) -> Result<Answer, RagError> {
        if self.math_shortcut
            && let Some(answer) = self.try_shortcut(question)
        {
            return Ok(answer);
        }
        if !self.kb.is_ready() {
            return Err(RagError::IndexNotReady);
        }

        self.history.push_user(question);
        let rendered = self.history.render();

        let decision = tools::classify(self.kb.provider(), question, &rendered).await;
        let tool_output = decision.run();
        if let Some(output) = &tool_output {
            tracing::info!(tool = output.tool_name, "tool executed");
        }

        let extras = PromptExtras {
            history: Some(&rendered),
            tool: tool_output.as_ref(),
        };
        let answer = self.kb.ask_with(question, self.top_k, extras).await?;
        // One assistant entry per turn, carrying the tool result when a tool ran.
        if !answer.failed {
            let entry = match &tool_output {
                Some(output) => format!("{output}\n{}", answer.text),
                None => answer.text.clone(),
            };
            self.history.push_assistant(entry);
        }
        Ok(answer)
    }

    fn try_shortcut(&mut self, question: &str) -> Option<Answer> {
        let expr = SIMPLE_ARITHMETIC.find(question)?.as_str();
        let result = calculator::calculate(expr);
        if result == CALCULATION_ERROR {
            return None;
        }
        let text = format!("Calculation: {result}");
        tracing::debug!(expr, %result, "answered by arithmetic shortcut");
        self.history.push_user(question);
        self.history.push_assistant(text.clone());
        Some(Answer::direct(text))
    }
}

#[cfg(test)]
mod tests {
    use quire_llm::mock::MockProvider;

    use super::*;
    use crate::config::Config;

    async fn loaded_kb(provider: MockProvider) -> (tempfile::TempDir, KnowledgeBase<MockProvider>) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("book.md"),
            "Retrieval-augmented generation grounds answers in documents.",
        )
        .unwrap();
        let kb = KnowledgeBase::new(provider, &Config::default()).unwrap();
        assert!(kb.load(dir.path()).await.is_loaded());
        (dir, kb)
    }

    #[tokio::test]
    async fn arithmetic_shortcut_skips_the_model() {
        let mock = MockProvider::default();
        let kb = KnowledgeBase::new(mock.clone(), &Config::default()).unwrap();
        let mut agent = Agent::new(&kb, &AgentConfig::default(), 3);

        let answer = agent.ask("What is 15 * 23?").await.unwrap();
        assert_eq!(answer.text, "Calculation: 345");
        assert!(answer.sources.is_empty());
        assert!(mock.requests().is_empty());
        assert_eq!(
            agent.history().render(),
            "User: What is 15 * 23?\nAssistant: Calculation: 345"
        );
    }

    #[tokio::test]
    async fn shortcut_disabled_goes_through_retrieval() {
        let mock = MockProvider::with_responses(vec![
            r#"{"tool":"none"}"#.into(),
            "It is 345.".into(),
        ]);
        let (_dir, kb) = loaded_kb(mock.clone()).await;
        let config = AgentConfig {
            math_shortcut: false,
            ..AgentConfig::default()
        };
        let mut agent = Agent::new(&kb, &config, 3);

        let answer = agent.ask("What is 15 * 23?").await.unwrap();
        assert_eq!(answer.text, "It is 345.");
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn failed_shortcut_falls_through_to_retrieval() {
        let mock = MockProvider::default();
        let kb = KnowledgeBase::new(mock, &Config::default()).unwrap();
        let mut agent = Agent::new(&kb, &AgentConfig::default(), 3);
        assert!(matches!(
            agent.ask("what is 4 / 0").await,
            Err(RagError::IndexNotReady)
        ));
        assert!(agent.history().is_empty());
    }

    #[tokio::test]
    async fn tool_result_reaches_answer_prompt() {
        let mock = MockProvider::with_responses(vec![
            r#"{"tool":"calculate","input":"(2 + 3) * 4"}"#.into(),
            "The total is 20.".into(),
        ]);
        let (_dir, kb) = loaded_kb(mock.clone()).await;
        let mut agent = Agent::new(&kb, &AgentConfig::default(), 3);

        let answer = agent.ask("Add two and three, then quadruple it").await.unwrap();
        assert_eq!(answer.text, "The total is 20.");

        let prompt = mock.last_prompt().unwrap();
        assert!(prompt.contains("Tool calculate result: 20"));
        assert!(prompt.contains("User: Add two and three, then quadruple it"));
        assert!(answer.sources.contains("**From book.md**"));

        let rendered = agent.history().render();
        assert!(rendered.ends_with("Assistant: Tool calculate result: 20\nThe total is 20."));
        assert_eq!(agent.history().len(), 2);
    }

    #[tokio::test]
    async fn unparseable_classifier_reply_answers_without_tool() {
        let mock = MockProvider::with_responses(vec![
            "Sure! I will use the calculator.".into(),
            "RAG grounds answers.".into(),
        ]);
        let (_dir, kb) = loaded_kb(mock.clone()).await;
        let mut agent = Agent::new(&kb, &AgentConfig::default(), 3);

        let answer = agent.ask("What does RAG do?").await.unwrap();
        assert_eq!(answer.text, "RAG grounds answers.");
        assert!(!mock.last_prompt().unwrap().contains("Tool "));
    }

    #[tokio::test]
    async fn history_is_bounded() {
        let mock = MockProvider::default().with_default_response(r#"{"tool":"none"}"#);
        let (_dir, kb) = loaded_kb(mock).await;
        let config = AgentConfig {
            max_history_turns: 2,
            ..AgentConfig::default()
        };
        let mut agent = Agent::new(&kb, &config, 3);
        for i in 0..6 {
            agent.ask(&format!("question {i}")).await.unwrap();
        }
        assert_eq!(agent.history().len(), 4);
        assert!(agent.history().render().starts_with("User: question 4"));
    }

    #[tokio::test]
    async fn tool_turns_use_one_assistant_entry() {
        let mut replies = Vec::new();
        for i in 0..3 {
            replies.push(r#"{"tool":"calculate","input":"2 + 2"}"#.to_owned());
            replies.push(format!("answer {i}"));
        }
        let (_dir, kb) = loaded_kb(MockProvider::with_responses(replies)).await;
        let config = AgentConfig {
            max_history_turns: 2,
            ..AgentConfig::default()
        };
        let mut agent = Agent::new(&kb, &config, 3);
        for i in 0..3 {
            agent.ask(&format!("tool question {i}")).await.unwrap();
        }
        assert_eq!(agent.history().len(), 4);
        let rendered = agent.history().render();
        assert!(rendered.starts_with("User: tool question 1\n"));
        assert!(rendered.contains("Assistant: Tool calculate result: 4\nanswer 1"));
        assert!(rendered.ends_with("answer 2"));
    }

    #[tokio::test]
    async fn failed_generation_not_recorded_as_answer() {
        let mock = MockProvider::failing();
        let (_dir, kb) = loaded_kb(mock).await;
        let mut agent = Agent::new(&kb, &AgentConfig::default(), 3);

        let answer = agent.ask("What is RAG?").await.unwrap();
        assert!(answer.failed);
        assert_eq!(agent.history().render(), "User: What is RAG?");
        agent.reset();
        assert!(agent.history().is_empty());
    }
}
