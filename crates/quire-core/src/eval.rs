//! Offline evaluation: answer every question of a test set and have a judge model score it.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use quire_llm::LlmProvider;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::rag::{KnowledgeBase, RagError};

static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)score:\s*(\d+(?:\.\d+)?)\s*/\s*5").expect("score regex is valid")
});

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("test set not found: {}", .0.display())]
    MissingTestSet(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Rag(#[from] RagError),
}

/// One row of the test set CSV (`question,category,expected_behavior`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestCase {
    pub question: String,
    pub category: String,
    pub expected_behavior: String,
}

/// One row appended to the results CSV.
#[derive(Debug, Clone, Serialize)]
pub struct EvalRecord {
    pub question: String,
    pub category: String,
    pub answer: String,
    pub sources: String,
    /// Raw judge verdict.
    pub score: String,
    /// The `X` of `Score: X/5`, when the verdict contains one.
    pub score_value: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvalSummary {
    pub evaluated: usize,
    pub scored: usize,
    pub mean_score: Option<f32>,
    pub output: PathBuf,
}

impl std::fmt::Display for EvalSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Evaluated {} questions ({} scored)",
            self.evaluated, self.scored
        )?;
        if let Some(mean) = self.mean_score {
            write!(f, ", mean score {mean:.2}/5")?;
        }
        write!(f, ". Results appended to {}", self.output.display())
    }
}

/// # Errors
///
/// Returns [`EvalError::MissingTestSet`] when `path` does not exist, or a CSV
/// error for malformed rows.
pub fn read_test_set(path: &Path) -> Result<Vec<TestCase>, EvalError> {
    if !path.exists() {
        return Err(EvalError::MissingTestSet(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    reader
        .deserialize()
        .collect::<Result<Vec<TestCase>, _>>()
        .map_err(EvalError::from)
}

#[must_use]
pub fn judge_prompt(question: &str, answer: &str, expected_behavior: &str) -> String {
    format!(
        "You are an impartial judge evaluating an AI answer against expected behavior.\n\
         Question: {question}\n\
         AI Answer: {answer}\n\
         Expected Behavior: {expected_behavior}\n\n\
         Score the answer on these criteria (1-5):\n\
         1. Faithfulness: Does it stick to facts without hallucination?\n\
         2. Relevance: Does it answer the question directly?\n\
         3. Abstention: If no info, does it say \"I don't have enough information\"?\n\
         4. Overall Quality\n\n\
         Output only:\n\
         Score: X/5\n\
         Reason: [short explanation, 1-2 sentences]"
    )
}

/// Ask the judge for a verdict. A failed call yields `Judge error: <reason>`.
pub async fn judge<J: LlmProvider>(
    judge: &J,
    question: &str,
    answer: &str,
    expected_behavior: &str,
) -> String {
    match judge
        .generate(&judge_prompt(question, answer, expected_behavior))
        .await
    {
        Ok(verdict) => verdict,
        Err(e) => {
            tracing::warn!("judge call failed: {e}");
            format!("Judge error: {e}")
        }
    }
}

#[must_use]
pub fn parse_score(verdict: &str) -> Option<f32> {
    SCORE_RE
        .captures(verdict)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub struct Evaluator<'a, P, J> {
    kb: &'a KnowledgeBase<P>,
    judge: &'a J,
    top_k: usize,
}

impl<'a, P: LlmProvider, J: LlmProvider> Evaluator<'a, P, J> {
    #[must_use]
    pub fn new(kb: &'a KnowledgeBase<P>, judge: &'a J, top_k: usize) -> Self {
        Self { kb, judge, top_k }
    }

    /// Answer and judge every test case, appending one CSV row per case to `output`.
    ///
    /// # Errors
    ///
    /// Fails if the test set is missing or malformed, the output cannot be written,
    /// or the index has not been loaded.
    pub async fn run(&self, test_set: &Path, output: &Path) -> Result<EvalSummary, EvalError> {
        let cases = read_test_set(test_set)?;
        let mut writer = open_results(output)?;
        let mut scores = Vec::with_capacity(cases.len());

        for (i, case) in cases.iter().enumerate() {
            tracing::info!(
                n = i + 1,
                total = cases.len(),
                question = %case.question,
                "evaluating"
            );
            let answer = self.kb.ask(&case.question, self.top_k).await?;
            let verdict = judge(
                self.judge,
                &case.question,
                &answer.text,
                &case.expected_behavior,
            )
            .await;
            let score_value = parse_score(&verdict);
            scores.extend(score_value);

            writer.serialize(EvalRecord {
                question: case.question.clone(),
                category: case.category.clone(),
                answer: answer.text,
                sources: answer.sources,
                score: verdict,
                score_value,
            })?;
            writer.flush()?;
        }

        #[allow(clippy::cast_precision_loss)]
        let mean_score =
            (!scores.is_empty()).then(|| scores.iter().sum::<f32>() / scores.len() as f32);

        Ok(EvalSummary {
            evaluated: cases.len(),
            scored: scores.len(),
            mean_score,
            output: output.to_path_buf(),
        })
    }
}

/// Append-mode CSV writer that emits the header only for a new or empty file.
fn open_results(path: &Path) -> Result<csv::Writer<std::fs::File>, EvalError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let is_new = std::fs::metadata(path).map_or(true, |m| m.len() == 0);
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(csv::WriterBuilder::new()
        .has_headers(is_new)
        .from_writer(file))
}
