use std::path::PathBuf;

use clap::{Parser, Subcommand};
use quire_core::summarize::{SummaryLength, SummaryStyle};

#[derive(Parser, Debug)]
#[command(
    name = "quire",
    version,
    about = "Local book companion: ask questions about your documents with Ollama"
)]
pub struct Cli {
    /// Config file (defaults to $QUIRE_CONFIG, then config/default.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the index from the documents folder and report what was loaded
    Load,

    /// Answer a single question from the loaded documents
    Ask {
        question: String,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Use conversation history and tools
        #[arg(long)]
        agent: bool,
    },

    /// Interactive question loop (/load rebuilds the index, /quit exits)
    Chat {
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        #[arg(long)]
        agent: bool,
    },

    /// Answer every question of a test set and score the answers with a judge model
    Eval {
        #[arg(long, value_name = "CSV")]
        test_set: Option<PathBuf>,

        #[arg(long, value_name = "CSV")]
        output: Option<PathBuf>,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Summarize one document and log its quality scores
    Summarize {
        file: PathBuf,

        /// short, medium, or detailed
        #[arg(long, default_value = "medium")]
        length: SummaryLength,

        /// paragraph, bullets, executive, or technical
        #[arg(long, default_value = "paragraph")]
        style: SummaryStyle,
    },

    /// Show aggregate scores of past summaries
    Dashboard,

    /// Build an outline, concept cards, and a quiz for one chapter
    Study { file: PathBuf },

    /// Chat with the book companion persona (no retrieval)
    Companion,
}
