//! Prompt assembly and the sources block shown with each answer.

use std::fmt::Write as _;

use quire_memory::ScoredChunk;

use crate::tools::ToolOutput;

/// Sentence the model is told to use when the context lacks the answer.
pub const INSUFFICIENT_INFO: &str = "I don't have enough information from the documents.";

const CHUNK_SEPARATOR: &str = "\n\n";
const SOURCE_SEPARATOR: &str = "\n\n---\n\n";

/// Optional agent-mode material rendered into the answer prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptExtras<'a> {
    pub history: Option<&'a str>,
    pub tool: Option<&'a ToolOutput>,
}

/// Retrieved chunk texts in rank order, clipped to `budget` characters in total.
#[must_use]
pub fn build_context(hits: &[ScoredChunk], budget: usize) -> String {
    let mut context = String::new();
    let mut remaining = budget;

    for hit in hits {
        if remaining == 0 {
            break;
        }
        if !context.is_empty() {
            let sep = CHUNK_SEPARATOR.len().min(remaining);
            context.push_str(&CHUNK_SEPARATOR[..sep]);
            remaining -= sep;
        }
        let taken: String = hit.chunk.content.chars().take(remaining).collect();
        remaining -= taken.chars().count();
        context.push_str(&taken);
    }

    context
}

#[must_use]
pub fn answer_prompt(question: &str, context: &str, extras: PromptExtras<'_>) -> String {
    let mut prompt = String::from(
        "You are a helpful assistant answering questions strictly based on the provided documents.\n\
         Use ONLY the context below to answer. Be concise, clear, and accurate.\n",
    );
    let _ = writeln!(
        prompt,
        "If the information is not in the context, say exactly: \"{INSUFFICIENT_INFO}\""
    );
    prompt.push_str("Cite the source file and chunk when relevant.\n\n");

    if let Some(history) = extras.history.filter(|h| !h.is_empty()) {
        let _ = write!(prompt, "History:\n{history}\n\n");
    }
    if let Some(tool) = extras.tool {
        let _ = write!(prompt, "{tool}\n\n");
    }

    let _ = write!(
        prompt,
        "Context:\n{context}\n\nQuestion: {question}\n\nAnswer:"
    );
    prompt
}

/// Citation block for the retrieved chunks, one entry per chunk in rank order.
#[must_use]
pub fn format_sources(hits: &[ScoredChunk], preview_chars: usize) -> String {
    hits.iter()
        .map(|hit| {
            let preview: String = hit.chunk.content.chars().take(preview_chars).collect();
            format!(
                "**From {}** (chunk starting at {}):\n{preview}...",
                hit.chunk.source(),
                hit.chunk.offset
            )
        })
        .collect::<Vec<_>>()
        .join(SOURCE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use quire_memory::document::{Chunk, DocumentMetadata};

    use super::*;

    fn hit(source: &str, offset: usize, content: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                content: content.to_owned(),
                metadata: DocumentMetadata::new(source, "text/plain"),
                chunk_index: 0,
                offset,
            },
            distance: 0.0,
        }
    }

    #[test]
    fn sources_block_format() {
        let hits = [hit("a.txt", 0, "alpha"), hit("b.md", 400, "beta")];
        assert_eq!(
            format_sources(&hits, 300),
            "**From a.txt** (chunk starting at 0):\nalpha...\n\n---\n\n\
             **From b.md** (chunk starting at 400):\nbeta..."
        );
    }

    #[test]
    fn sources_preview_truncated_by_chars() {
        let long = "é".repeat(500);
        let block = format_sources(&[hit("a.txt", 0, &long)], 300);
        let preview = block.split_once(":\n").unwrap().1;
        assert_eq!(preview.trim_end_matches("...").chars().count(), 300);
    }

    #[test]
    fn no_hits_no_sources() {
        assert_eq!(format_sources(&[], 300), "");
    }

    #[test]
    fn context_joins_in_rank_order() {
        let hits = [hit("a", 0, "first"), hit("b", 0, "second")];
        assert_eq!(build_context(&hits, 1000), "first\n\nsecond");
    }

    #[test]
    fn context_respects_budget() {
        let hits = [hit("a", 0, "0123456789"), hit("b", 0, "abcdefghij")];
        let context = build_context(&hits, 15);
        assert_eq!(context, "0123456789\n\nabc");
        assert_eq!(context.chars().count(), 15);
        assert_eq!(build_context(&hits, 4), "0123");
        assert_eq!(build_context(&hits, 0), "");
    }

    #[test]
    fn prompt_contains_rules_context_and_question() {
        let prompt = answer_prompt("What is RAG?", "RAG retrieves.", PromptExtras::default());
        assert!(prompt.contains(INSUFFICIENT_INFO));
        assert!(prompt.contains("Context:\nRAG retrieves."));
        assert!(prompt.contains("Question: What is RAG?"));
        assert!(!prompt.contains("History:"));
        assert!(!prompt.contains("Tool "));
    }

    #[test]
    fn prompt_includes_history_and_tool() {
        let tool = ToolOutput {
            tool_name: "calculate",
            output: "345".into(),
        };
        let prompt = answer_prompt(
            "and times two?",
            "",
            PromptExtras {
                history: Some("User: 15*23\nAssistant: 345"),
                tool: Some(&tool),
            },
        );
        assert!(prompt.contains("History:\nUser: 15*23\nAssistant: 345"));
        assert!(prompt.contains("Tool calculate result: 345"));
    }
}
