//! Single-document summaries with heuristic quality scores and a CSV history.

use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use quire_llm::LlmProvider;
use quire_memory::cosine_similarity;
use quire_memory::document::{DocumentError, read_document};
use serde::{Deserialize, Serialize};

use crate::config::SummarizerConfig;

/// Share of the original length a summary should ideally have.
const IDEAL_RATIO: f64 = 0.15;

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Detailed,
}

impl SummaryLength {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Detailed => "detailed",
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            Self::Short => "2-4 sentences",
            Self::Medium => "5-8 sentences",
            Self::Detailed => "10-15 sentences or bullet points",
        }
    }
}

impl fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SummaryLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "detailed" => Ok(Self::Detailed),
            other => Err(format!(
                "unknown summary length {other:?} (expected short, medium, or detailed)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStyle {
    #[default]
    Paragraph,
    Bullets,
    Executive,
    Technical,
}

impl SummaryStyle {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Bullets => "bullets",
            Self::Executive => "executive",
            Self::Technical => "technical",
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            Self::Paragraph => "in clear paragraphs",
            Self::Bullets => "in bullet points",
            Self::Executive => "in executive style, key takeaways first",
            Self::Technical => "in technical style, focusing on concepts and terms",
        }
    }
}

impl fmt::Display for SummaryStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SummaryStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "paragraph" => Ok(Self::Paragraph),
            "bullets" => Ok(Self::Bullets),
            "executive" => Ok(Self::Executive),
            "technical" => Ok(Self::Technical),
            other => Err(format!(
                "unknown summary style {other:?} (expected paragraph, bullets, executive, or technical)"
            )),
        }
    }
}

/// Quality scores on a 0-5 scale, rounded to one decimal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryScores {
    pub faithfulness: f64,
    pub completeness: f64,
    pub conciseness: f64,
    pub overall: f64,
}

impl fmt::Display for SummaryScores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Faithfulness: {}/5\nCompleteness: {}/5\nConciseness: {}/5\nOverall: {}/5",
            self.faithfulness, self.completeness, self.conciseness, self.overall
        )
    }
}

/// A row of the summary log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryLogEntry {
    pub timestamp: String,
    pub filename: String,
    pub summary_length: SummaryLength,
    pub summary_style: SummaryStyle,
    pub summary: String,
    pub faithfulness: f64,
    pub completeness: f64,
    pub conciseness: f64,
    pub overall: f64,
}

#[derive(Debug, Clone)]
pub struct SummaryReport {
    pub filename: String,
    pub summary: String,
    pub scores: SummaryScores,
    /// First 400 characters of the source text.
    pub preview: String,
    /// Set when `summary` is an error message.
    pub failed: bool,
}

#[must_use]
pub fn summary_prompt(text: &str, length: SummaryLength, style: SummaryStyle) -> String {
    format!(
        "Summarize the following text.\n\
         Keep the summary {} long.\n\
         Present it {}.\n\
         Be accurate, objective, and faithful to the original. \
         Do not add information that is not in the text.\n\n\
         Text:\n{text}\n\nSummary:",
        length.instruction(),
        style.instruction()
    )
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Length-based scores. Faithfulness needs embeddings and is passed in as a
/// cosine similarity.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score_summary(original: &str, summary: &str, similarity: f64) -> SummaryScores {
    if summary.trim().is_empty() {
        return SummaryScores::default();
    }

    let faithfulness = similarity * 5.0;

    let summary_words = summary.split_whitespace().count() as f64;
    let original_words = original.split_whitespace().count() as f64;
    let completeness = (summary_words / (original_words / 15.0).max(1.0) * 5.0).min(5.0);

    let ratio = summary.chars().count() as f64 / (original.chars().count().max(1) as f64);
    let conciseness = (5.0 - (ratio - IDEAL_RATIO).abs() * 30.0).clamp(1.0, 5.0);

    let overall = (faithfulness + completeness + conciseness) / 3.0;

    SummaryScores {
        faithfulness: round1(faithfulness),
        completeness: round1(completeness),
        conciseness: round1(conciseness),
        overall: round1(overall),
    }
}

pub struct Summarizer<'a, P> {
    provider: &'a P,
    config: &'a SummarizerConfig,
    max_file_size: u64,
}

impl<'a, P: LlmProvider> Summarizer<'a, P> {
    #[must_use]
    pub fn new(provider: &'a P, config: &'a SummarizerConfig, max_file_size: u64) -> Self {
        Self {
            provider,
            config,
            max_file_size,
        }
    }

    /// Generate a summary of `text`. A failed call yields `Summary generation error: <reason>`.
    pub async fn generate(
        &self,
        text: &str,
        length: SummaryLength,
        style: SummaryStyle,
    ) -> (String, bool) {
        let clipped: String = text.chars().take(self.config.max_input_chars).collect();
        match self
            .provider
            .generate(&summary_prompt(&clipped, length, style))
            .await
        {
            Ok(summary) => (summary, false),
            Err(e) => {
                tracing::warn!("summary generation failed: {e}");
                (format!("Summary generation error: {e}"), true)
            }
        }
    }

    /// Cosine similarity of original and summary embeddings; 0 when either cannot be embedded.
    async fn similarity(&self, original: &str, summary: &str) -> f64 {
        let texts = [original.to_owned(), summary.to_owned()];
        match self.provider.embed_batch(&texts).await {
            Ok(vectors) if vectors.len() == 2 => {
                f64::from(cosine_similarity(&vectors[0], &vectors[1]))
            }
            Ok(_) => 0.0,
            Err(e) => {
                tracing::warn!("cannot embed for faithfulness score: {e}");
                0.0
            }
        }
    }

    /// Read `path`, summarize it, score the result, and append it to the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the log cannot be written.
    /// Generation failures are reported inside the [`SummaryReport`].
    pub async fn summarize_file(
        &self,
        path: &Path,
        length: SummaryLength,
        style: SummaryStyle,
    ) -> Result<SummaryReport, SummaryError> {
        let document = read_document(path, self.max_file_size).await?;
        let text = document.content.trim();

        let (summary, failed) = self.generate(text, length, style).await;
        let scores = if failed {
            SummaryScores::default()
        } else {
            let similarity = self.similarity(text, &summary).await;
            score_summary(text, &summary, similarity)
        };

        let entry = SummaryLogEntry {
            timestamp: chrono::Local::now().to_rfc3339(),
            filename: document.metadata.source.clone(),
            summary_length: length,
            summary_style: style,
            summary: summary.clone(),
            faithfulness: scores.faithfulness,
            completeness: scores.completeness,
            conciseness: scores.conciseness,
            overall: scores.overall,
        };
        append_log(&self.config.log_file, &entry)?;
        tracing::info!(
            file = %entry.filename,
            overall = scores.overall,
            "summary logged"
        );

        Ok(SummaryReport {
            filename: document.metadata.source,
            summary,
            scores,
            preview: preview(text, 400),
            failed,
        })
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_owned()
    }
}

/// # Errors
///
/// Returns an error if the log file or its directory cannot be written.
pub fn append_log(path: &Path, entry: &SummaryLogEntry) -> Result<(), SummaryError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let is_new = std::fs::metadata(path).map_or(true, |m| m.len() == 0);
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(is_new)
        .from_writer(file);
    writer.serialize(entry)?;
    writer.flush()?;
    Ok(())
}

/// Aggregate view over the summary log.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub total: usize,
    pub mean_overall: f64,
    pub best_faithfulness: f64,
    pub worst_completeness: f64,
    /// Up to the ten most recent entries, oldest first.
    pub recent: Vec<SummaryLogEntry>,
    pub log_file: PathBuf,
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total summaries: {}", self.total)?;
        writeln!(f, "Average overall score: {:.2}", self.mean_overall)?;
        writeln!(f, "Best faithfulness: {:.2}", self.best_faithfulness)?;
        writeln!(f, "Worst completeness: {:.2}", self.worst_completeness)?;
        writeln!(f, "\nRecent summaries:")?;
        for entry in &self.recent {
            writeln!(
                f,
                "  {}  {:<30} {:>8} {:>10}  overall {}",
                entry.timestamp,
                entry.filename,
                entry.summary_length,
                entry.summary_style,
                entry.overall
            )?;
        }
        Ok(())
    }
}

/// Load the dashboard, or `None` when nothing has been logged yet.
///
/// # Errors
///
/// Returns an error if the log exists but cannot be parsed.
#[allow(clippy::cast_precision_loss)]
pub fn load_dashboard(log_file: &Path) -> Result<Option<Dashboard>, SummaryError> {
    if !log_file.exists() {
        return Ok(None);
    }
    let mut reader = csv::Reader::from_path(log_file)?;
    let entries = reader
        .deserialize()
        .collect::<Result<Vec<SummaryLogEntry>, _>>()?;
    if entries.is_empty() {
        return Ok(None);
    }

    let total = entries.len();
    let mean_overall = entries.iter().map(|e| e.overall).sum::<f64>() / total as f64;
    let best_faithfulness = entries
        .iter()
        .map(|e| e.faithfulness)
        .fold(f64::NEG_INFINITY, f64::max);
    let worst_completeness = entries
        .iter()
        .map(|e| e.completeness)
        .fold(f64::INFINITY, f64::min);
    let recent = entries[total.saturating_sub(10)..].to_vec();

    Ok(Some(Dashboard {
        total,
        mean_overall,
        best_faithfulness,
        worst_completeness,
        recent,
        log_file: log_file.to_path_buf(),
    }))
}

#[cfg(test)]
mod tests {
    use quire_llm::mock::{MockEmbedding, MockProvider};

    use super::*;

    fn config(dir: &Path) -> SummarizerConfig {
        SummarizerConfig {
            log_file: dir.join("logs/summaries_log.csv"),
            ..SummarizerConfig::default()
        }
    }

    #[test]
    fn parse_length_and_style() {
        assert_eq!("SHORT".parse::<SummaryLength>(), Ok(SummaryLength::Short));
        assert_eq!("bullets".parse::<SummaryStyle>(), Ok(SummaryStyle::Bullets));
        assert!("epic".parse::<SummaryLength>().is_err());
        assert!("haiku".parse::<SummaryStyle>().is_err());
    }

    #[test]
    fn prompt_carries_length_and_style() {
        let prompt = summary_prompt("body", SummaryLength::Short, SummaryStyle::Bullets);
        assert!(prompt.contains("2-4 sentences"));
        assert!(prompt.contains("in bullet points"));
        assert!(prompt.ends_with("Text:\nbody\n\nSummary:"));
    }

    #[test]
    fn empty_summary_scores_zero() {
        assert_eq!(
            score_summary("some original text", "   ", 0.9),
            SummaryScores::default()
        );
    }

    #[test]
    fn ideal_ratio_is_most_concise() {
        let original = "word ".repeat(200);
        let summary: String = original.chars().take(150).collect();
        let scores = score_summary(&original, &summary, 1.0);
        assert!((scores.conciseness - 5.0).abs() < f64::EPSILON);
        assert!((scores.faithfulness - 5.0).abs() < f64::EPSILON);
        assert!((scores.completeness - 5.0).abs() < f64::EPSILON);
        assert!((scores.overall - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn full_copy_is_not_concise() {
        let original = "alpha beta gamma delta ".repeat(20);
        let scores = score_summary(&original, &original, 1.0);
        assert!((scores.conciseness - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn completeness_uses_one_fifteenth_of_original_words() {
        // 150 words original -> 10 word target; 4 words gives 2.0.
        let original = "w ".repeat(150);
        let scores = score_summary(&original, "one two three four", 0.5);
        assert!((scores.completeness - 2.0).abs() < f64::EPSILON);
        assert!((scores.faithfulness - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn scores_round_to_one_decimal() {
        let scores = score_summary(&"x ".repeat(100), "a b", 0.123_456);
        assert!((scores.faithfulness - 0.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn summarize_file_logs_entry() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("chapter.txt");
        std::fs::write(&source, "Evaluation keeps models honest. ".repeat(40)).unwrap();

        let mock = MockProvider::with_responses(vec!["Evaluation keeps models honest.".into()]);
        let cfg = config(dir.path());
        let summarizer = Summarizer::new(&mock, &cfg, u64::MAX);

        let report = summarizer
            .summarize_file(&source, SummaryLength::Short, SummaryStyle::Paragraph)
            .await
            .unwrap();
        assert!(!report.failed);
        assert_eq!(report.filename, "chapter.txt");
        assert!(report.scores.faithfulness > 0.0);
        assert!(report.preview.ends_with("..."));
        assert!(mock.last_prompt().unwrap().contains("2-4 sentences"));

        let dashboard = load_dashboard(&cfg.log_file).unwrap().unwrap();
        assert_eq!(dashboard.total, 1);
        assert_eq!(dashboard.recent[0].summary_length, SummaryLength::Short);
        assert_eq!(dashboard.recent[0].summary, "Evaluation keeps models honest.");
    }

    #[tokio::test]
    async fn generation_failure_scores_zero_and_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.md");
        std::fs::write(&source, "# Notes\nSomething worth summarizing.").unwrap();

        let mock = MockProvider::failing();
        let cfg = config(dir.path());
        let report = Summarizer::new(&mock, &cfg, u64::MAX)
            .summarize_file(&source, SummaryLength::Medium, SummaryStyle::Technical)
            .await
            .unwrap();
        assert!(report.failed);
        assert!(report.summary.starts_with("Summary generation error: "));
        assert_eq!(report.scores, SummaryScores::default());
        assert_eq!(load_dashboard(&cfg.log_file).unwrap().unwrap().total, 1);
    }

    #[tokio::test]
    async fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockProvider::default();
        let cfg = config(dir.path());
        let result = Summarizer::new(&mock, &cfg, u64::MAX)
            .summarize_file(
                &dir.path().join("missing.txt"),
                SummaryLength::Medium,
                SummaryStyle::Paragraph,
            )
            .await;
        assert!(matches!(result, Err(SummaryError::Document(_))));
        assert!(!cfg.log_file.exists());
    }

    #[tokio::test]
    async fn embedding_failure_zeroes_faithfulness_only() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.txt");
        std::fs::write(&source, "word ".repeat(100)).unwrap();
        let mock = MockProvider::with_responses(vec!["word word word word".into()])
            .with_embedding(MockEmbedding::Failing);
        let cfg = config(dir.path());
        let report = Summarizer::new(&mock, &cfg, u64::MAX)
            .summarize_file(&source, SummaryLength::Short, SummaryStyle::Bullets)
            .await
            .unwrap();
        assert!(report.scores.faithfulness.abs() < f64::EPSILON);
        assert!(report.scores.completeness > 0.0);
    }

    #[test]
    fn dashboard_missing_log_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_dashboard(&dir.path().join("none.csv")).unwrap().is_none());
    }

    #[test]
    fn dashboard_aggregates_and_keeps_last_ten() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("log.csv");
        for i in 0..12u32 {
            let v = f64::from(i) / 4.0;
            append_log(
                &log,
                &SummaryLogEntry {
                    timestamp: format!("t{i}"),
                    filename: format!("f{i}.txt"),
                    summary_length: SummaryLength::Medium,
                    summary_style: SummaryStyle::Paragraph,
                    summary: "s, with a comma".into(),
                    faithfulness: v,
                    completeness: 5.0 - v,
                    conciseness: 3.0,
                    overall: 2.0,
                },
            )
            .unwrap();
        }

        let content = std::fs::read_to_string(&log).unwrap();
        assert!(content.starts_with(
            "timestamp,filename,summary_length,summary_style,summary,faithfulness,completeness,conciseness,overall\n"
        ));

        let dashboard = load_dashboard(&log).unwrap().unwrap();
        assert_eq!(dashboard.total, 12);
        assert!((dashboard.mean_overall - 2.0).abs() < f64::EPSILON);
        assert!((dashboard.best_faithfulness - 2.75).abs() < f64::EPSILON);
        assert!((dashboard.worst_completeness - 2.25).abs() < f64::EPSILON);
        assert_eq!(dashboard.recent.len(), 10);
        assert_eq!(dashboard.recent[0].filename, "f2.txt");
        assert!(dashboard.to_string().contains("Total summaries: 12"));
    }
}
