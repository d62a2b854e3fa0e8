//! Study pack for a single chapter: outline, concept cards, and a self-test quiz.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use quire_llm::{LlmProvider, Message};
use quire_memory::document::{DocumentError, read_document};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::StudyConfig;

pub const NO_OUTLINE: &str = "No clear outline detected.";
const MAX_OUTLINE_LINES: usize = 15;

static NUMBERED_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(Chapter\s+\d+|Section\s+\d+|\d+\.\d+|\d+\.)\s")
        .expect("heading regex is valid")
});

static TITLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Za-z\s]{10,}$").expect("title regex is valid"));

#[derive(Debug, thiserror::Error)]
pub enum StudyError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConceptCard {
    pub concept: String,
    pub explanation: String,
    pub why_matters: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QuizQuestion {
    /// `mc`, `short`, or `tf`.
    #[serde(rename = "type")]
    pub kind: String,
    pub question: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    pub correct: String,
    #[serde(default)]
    pub explanation: String,
}

impl QuizQuestion {
    fn is_multiple_choice(&self) -> bool {
        self.kind.eq_ignore_ascii_case("mc")
    }
}

#[derive(Debug, Clone)]
pub struct StudyPack {
    pub outline: String,
    pub cards: Vec<ConceptCard>,
    pub quiz: Vec<QuizQuestion>,
    pub report_path: PathBuf,
}

/// Heading-like lines of `text`, at most fifteen, or [`NO_OUTLINE`].
#[must_use]
pub fn extract_outline(text: &str) -> String {
    let outline: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| {
            NUMBERED_HEADING.is_match(line) || (TITLE_LINE.is_match(line) && line.len() < 80)
        })
        .take(MAX_OUTLINE_LINES)
        .collect();

    if outline.is_empty() {
        NO_OUTLINE.to_owned()
    } else {
        outline.join("\n")
    }
}

fn cards_prompt(text: &str) -> String {
    format!(
        "Extract 6-8 key concepts from this chapter text.\n\
         For each concept give a short name, a one-sentence explanation, \
         and one sentence on why it matters.\n\n\
         Text:\n{text}"
    )
}

fn quiz_prompt(text: &str) -> String {
    format!(
        "Create 10 self-test quiz questions from this chapter text.\n\
         Mix 4 multiple choice (type \"mc\"), 3 short answer (type \"short\") \
         and 3 true/false (type \"tf\").\n\
         Give options only for multiple choice, the correct answer, \
         and a 1-2 sentence explanation.\n\n\
         Text:\n{text}"
    )
}

fn placeholder_card() -> ConceptCard {
    ConceptCard {
        concept: "Error".into(),
        explanation: "Could not generate cards".into(),
        why_matters: String::new(),
    }
}

fn placeholder_question() -> QuizQuestion {
    QuizQuestion {
        kind: "error".into(),
        question: "Quiz generation failed".into(),
        options: None,
        correct: String::new(),
        explanation: String::new(),
    }
}

/// Concept cards for `text`; a single placeholder card when generation fails.
pub async fn concept_cards<P: LlmProvider>(provider: &P, text: &str) -> Vec<ConceptCard> {
    match provider
        .chat_typed::<Vec<ConceptCard>>(&[Message::user(cards_prompt(text))])
        .await
    {
        Ok(cards) if !cards.is_empty() => cards,
        Ok(_) => vec![placeholder_card()],
        Err(e) => {
            tracing::warn!("concept card generation failed: {e}");
            vec![placeholder_card()]
        }
    }
}

/// Quiz for `text`; a single placeholder question when generation fails.
pub async fn generate_quiz<P: LlmProvider>(provider: &P, text: &str) -> Vec<QuizQuestion> {
    match provider
        .chat_typed::<Vec<QuizQuestion>>(&[Message::user(quiz_prompt(text))])
        .await
    {
        Ok(questions) if !questions.is_empty() => questions,
        Ok(_) => vec![placeholder_question()],
        Err(e) => {
            tracing::warn!("quiz generation failed: {e}");
            vec![placeholder_question()]
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[must_use]
pub fn render_html(
    outline: &str,
    cards: &[ConceptCard],
    quiz: &[QuizQuestion],
    generated: &str,
) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Study Pack</title></head>\n<body>\n\
         <h1>Study Pack</h1>\n",
    );
    let _ = writeln!(html, "<p>Generated: {}</p>", escape_html(generated));
    let _ = writeln!(html, "<h2>Outline</h2>\n<pre>{}</pre>", escape_html(outline));

    html.push_str("<h2>Key Concept Cards</h2>\n<ul>\n");
    for card in cards {
        let _ = writeln!(
            html,
            "<li><strong>{}</strong><br>{}<br><em>Why it matters:</em> {}</li>",
            escape_html(&card.concept),
            escape_html(&card.explanation),
            escape_html(&card.why_matters)
        );
    }
    html.push_str("</ul>\n");

    let _ = writeln!(html, "<h2>Self-Test Quiz ({} questions)</h2>", quiz.len());
    for (i, q) in quiz.iter().enumerate() {
        let _ = writeln!(
            html,
            "<p><strong>Q{}:</strong> {}</p>",
            i + 1,
            escape_html(&q.question)
        );
        if q.is_multiple_choice() {
            html.push_str("<ul>\n");
            for option in q.options.iter().flatten() {
                let _ = writeln!(html, "<li>{}</li>", escape_html(option));
            }
            html.push_str("</ul>\n");
        }
    }

    html.push_str("<h2>Answers</h2>\n<details>\n<summary>Show answers</summary>\n<ol>\n");
    for q in quiz {
        let _ = writeln!(
            html,
            "<li><strong>{}</strong> {}</li>",
            escape_html(&q.correct),
            escape_html(&q.explanation)
        );
    }
    html.push_str("</ol>\n</details>\n</body>\n</html>\n");
    html
}

pub struct StudyPackBuilder<'a, P> {
    provider: &'a P,
    config: &'a StudyConfig,
    max_file_size: u64,
}

impl<'a, P: LlmProvider> StudyPackBuilder<'a, P> {
    #[must_use]
    pub fn new(provider: &'a P, config: &'a StudyConfig, max_file_size: u64) -> Self {
        Self {
            provider,
            config,
            max_file_size,
        }
    }

    /// Build the study pack for `path` and save the HTML report.
    ///
    /// # Errors
    ///
    /// Returns an error if the chapter cannot be read or the report cannot be written.
    /// Generation failures produce placeholder cards or questions instead.
    pub async fn build(&self, path: &Path) -> Result<StudyPack, StudyError> {
        let document = read_document(path, self.max_file_size).await?;
        let text = document.content.trim();
        let clipped: String = text.chars().take(self.config.max_input_chars).collect();

        let outline = extract_outline(text);
        let cards = concept_cards(self.provider, &clipped).await;
        let quiz = generate_quiz(self.provider, &clipped).await;

        let generated = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
        let html = render_html(&outline, &cards, &quiz, &generated);

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let report_path = self
            .config
            .output_dir
            .join(format!("study-pack-{}.html", document.metadata.source));
        tokio::fs::write(&report_path, html).await?;
        tracing::info!(
            path = %report_path.display(),
            cards = cards.len(),
            questions = quiz.len(),
            "study pack saved"
        );

        Ok(StudyPack {
            outline,
            cards,
            quiz,
            report_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use quire_llm::mock::MockProvider;

    use super::*;

    const CHAPTER: &str = "Chapter 3 Retrieval\n\
        Some intro sentence about retrieval, with commas.\n\
        3.1 Chunking documents\n\
        Why Embeddings Matter\n\
        short Line\n\
        1. First step\n";

    #[test]
    fn outline_picks_heading_lines() {
        assert_eq!(
            extract_outline(CHAPTER),
            "Chapter 3 Retrieval\n3.1 Chunking documents\nWhy Embeddings Matter\n1. First step"
        );
    }

    #[test]
    fn outline_is_case_insensitive_for_numbered_headings() {
        assert_eq!(extract_outline("section 2 Methods"), "section 2 Methods");
    }

    #[test]
    fn outline_caps_at_fifteen() {
        let text = (1..=20).map(|i| format!("{i}. item")).collect::<Vec<_>>().join("\n");
        assert_eq!(extract_outline(&text).lines().count(), 15);
    }

    #[test]
    fn outline_ignores_long_title_lines() {
        let long = format!("A{}", "b".repeat(85));
        assert_eq!(extract_outline(&long), NO_OUTLINE);
        assert_eq!(extract_outline("lowercase text only"), NO_OUTLINE);
    }

    #[test]
    fn quiz_type_field_is_renamed() {
        let q: QuizQuestion = serde_json::from_str(
            r#"{"type":"tf","question":"Q","options":null,"correct":"True","explanation":"E"}"#,
        )
        .unwrap();
        assert_eq!(q.kind, "tf");
        assert!(q.options.is_none());
    }

    #[test]
    fn html_is_escaped() {
        let cards = [ConceptCard {
            concept: "<script>".into(),
            explanation: "a & b".into(),
            why_matters: "\"quoted\"".into(),
        }];
        let html = render_html("1. Intro", &cards, &[], "now");
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &amp; b"));
        assert!(html.contains("&quot;quoted&quot;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn html_lists_options_for_multiple_choice_only() {
        let quiz = [
            QuizQuestion {
                kind: "mc".into(),
                question: "Pick one".into(),
                options: Some(vec!["Alpha".into(), "Beta".into()]),
                correct: "Alpha".into(),
                explanation: String::new(),
            },
            QuizQuestion {
                kind: "short".into(),
                question: "Explain".into(),
                options: Some(vec!["Ignored".into()]),
                correct: "Because".into(),
                explanation: String::new(),
            },
        ];
        let html = render_html(NO_OUTLINE, &[], &quiz, "now");
        assert!(html.contains("<li>Alpha</li>"));
        assert!(!html.contains("<li>Ignored</li>"));
        assert!(html.contains("Self-Test Quiz (2 questions)"));
    }

    #[tokio::test]
    async fn failed_generation_yields_placeholders() {
        let mock = MockProvider::failing();
        assert_eq!(concept_cards(&mock, "text").await, vec![placeholder_card()]);
        assert_eq!(generate_quiz(&mock, "text").await, vec![placeholder_question()]);
    }

    #[tokio::test]
    async fn malformed_json_yields_placeholders() {
        let mock = MockProvider::default().with_default_response("here are your cards!");
        assert_eq!(concept_cards(&mock, "text").await[0].concept, "Error");
    }

    #[tokio::test]
    async fn build_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let chapter = dir.path().join("ch3.md");
        std::fs::write(&chapter, CHAPTER).unwrap();

        let mock = MockProvider::with_responses(vec![
            r#"```json
[{"concept":"Chunking","explanation":"Splitting text.","why_matters":"Fits context."}]
```"#
                .into(),
            r#"[{"type":"mc","question":"Best overlap?","options":["0","100"],"correct":"100","explanation":"Keeps context."}]"#
                .into(),
        ]);
        let config = StudyConfig {
            output_dir: dir.path().join("outputs"),
            ..StudyConfig::default()
        };

        let pack = StudyPackBuilder::new(&mock, &config, u64::MAX)
            .build(&chapter)
            .await
            .unwrap();
        assert_eq!(pack.cards[0].concept, "Chunking");
        assert_eq!(pack.quiz[0].correct, "100");
        assert_eq!(pack.report_path, dir.path().join("outputs/study-pack-ch3.md.html"));

        let html = std::fs::read_to_string(&pack.report_path).unwrap();
        assert!(html.contains("<pre>Chapter 3 Retrieval"));
        assert!(html.contains("<li>100</li>"));
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn missing_chapter_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = StudyConfig {
            output_dir: dir.path().join("outputs"),
            ..StudyConfig::default()
        };
        let mock = MockProvider::default();
        let result = StudyPackBuilder::new(&mock, &config, u64::MAX)
            .build(&dir.path().join("nope.txt"))
            .await;
        assert!(matches!(result, Err(StudyError::Document(_))));
        assert!(!config.output_dir.exists());
    }
}
