//! Tools the agent can invoke before answering, and the classifier that picks one.

pub mod calculator;
pub mod clock;

use std::fmt;

use quire_llm::provider::parse_structured;
use quire_llm::{LlmProvider, Message};
use schemars::JsonSchema;
use serde::Deserialize;

/// Which tool, if any, to run for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolDecision {
    NoTool,
    Calculate(String),
    CurrentTime,
}

/// Classifier reply, tagged by the `tool` field.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(tag = "tool", rename_all = "snake_case")]
enum ToolReply {
    Calculate {
        /// The arithmetic expression to evaluate, e.g. `15 * 23`.
        input: String,
    },
    CurrentTime,
    None,
}

impl From<ToolReply> for ToolDecision {
    fn from(reply: ToolReply) -> Self {
        match reply {
            ToolReply::Calculate { input } if !input.trim().is_empty() => Self::Calculate(input),
            ToolReply::Calculate { .. } | ToolReply::None => Self::NoTool,
            ToolReply::CurrentTime => Self::CurrentTime,
        }
    }
}

/// Result of running a tool, rendered into the answer prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub tool_name: &'static str,
    pub output: String,
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tool {} result: {}", self.tool_name, self.output)
    }
}

impl ToolDecision {
    /// Parse a raw classifier reply. Anything that is not a recognised tag maps to
    /// [`ToolDecision::NoTool`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        parse_structured::<ToolReply>(raw).map_or(Self::NoTool, Self::from)
    }

    #[must_use]
    pub fn run(&self) -> Option<ToolOutput> {
        match self {
            Self::NoTool => None,
            Self::Calculate(expr) => Some(ToolOutput {
                tool_name: "calculate",
                output: calculator::calculate(expr),
            }),
            Self::CurrentTime => Some(ToolOutput {
                tool_name: "current_time",
                output: clock::current_time(),
            }),
        }
    }
}

fn classifier_prompt(question: &str, history: &str) -> String {
    format!(
        "Decide whether a tool is needed to answer the question.\n\
         Reply with exactly one JSON object and nothing else:\n\
         {{\"tool\": \"calculate\", \"input\": \"<math expression, e.g. 15 * 23>\"}}\n\
         {{\"tool\": \"current_time\"}}\n\
         {{\"tool\": \"none\"}}\n\n\
         Rules:\n\
         - Use calculate for any arithmetic. Do not calculate yourself.\n\
         - Use current_time for questions about the current time or date.\n\
         - Otherwise use none.\n\n\
         History:\n{history}\n\n\
         Question: {question}"
    )
}

/// Ask the model which tool to run. A failed call or an unusable reply is
/// [`ToolDecision::NoTool`].
pub async fn classify<P: LlmProvider>(provider: &P, question: &str, history: &str) -> ToolDecision {
    let prompt = classifier_prompt(question, history);
    match provider
        .chat_typed::<ToolReply>(&[Message::user(prompt)])
        .await
    {
        Ok(reply) => {
            let decision = ToolDecision::from(reply);
            tracing::debug!(?decision, "tool classified");
            decision
        }
        Err(e) => {
            tracing::warn!("tool classification failed, answering without tools: {e}");
            ToolDecision::NoTool
        }
    }
}
