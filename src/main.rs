mod cli;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use quire_core::config::LlmConfig;
use quire_core::eval::Evaluator;
use quire_core::study::StudyPackBuilder;
use quire_core::summarize::{Summarizer, SummaryLength, SummaryStyle, load_dashboard};
use quire_core::{Agent, Answer, Config, KnowledgeBase, RagError, companion};
use quire_llm::any::AnyProvider;
use quire_llm::ollama::OllamaProvider;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::cli::{Cli, Command};

const NOT_READY: &str = "No documents loaded. Add files to the documents folder and run /load.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber();

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = Config::load(&config_path)?;
    tracing::debug!(path = %config_path.display(), "configuration loaded");

    let provider = create_provider(&config.llm, &config.llm.model);
    health_check(&provider).await;

    match cli.command {
        Command::Load => {
            load_knowledge_base(provider, &config).await?;
        }
        Command::Ask {
            question,
            top_k,
            agent,
        } => {
            let kb = load_knowledge_base(provider, &config).await?;
            let top_k = top_k.unwrap_or(config.retrieval.top_k);
            let result = if agent {
                Agent::new(&kb, &config.agent, top_k).ask(&question).await
            } else {
                kb.ask(&question, top_k).await
            };
            print_result(result)?;
        }
        Command::Chat { top_k, agent } => {
            let kb = load_knowledge_base(provider, &config).await?;
            let top_k = top_k.unwrap_or(config.retrieval.top_k);
            chat_loop(&kb, &config, top_k, agent).await?;
        }
        Command::Eval {
            test_set,
            output,
            top_k,
        } => {
            let kb = load_knowledge_base(provider, &config).await?;
            let judge = create_provider(&config.llm, config.judge_model());
            let test_set = test_set.unwrap_or_else(|| config.evaluation.test_set.clone());
            let output = output.unwrap_or_else(|| config.evaluation.output.clone());
            let summary = Evaluator::new(&kb, &judge, top_k.unwrap_or(config.retrieval.top_k))
                .run(&test_set, &output)
                .await
                .context("evaluation failed")?;
            println!("{summary}");
        }
        Command::Summarize {
            file,
            length,
            style,
        } => summarize(&provider, &config, &file, length, style).await?,
        Command::Dashboard => match load_dashboard(&config.summarizer.log_file)? {
            Some(dashboard) => println!("{dashboard}"),
            None => println!("No summaries logged yet."),
        },
        Command::Study { file } => {
            let builder =
                StudyPackBuilder::new(&provider, &config.study, config.documents.max_file_size);
            let pack = builder
                .build(&file)
                .await
                .with_context(|| format!("cannot build study pack for {}", file.display()))?;
            println!("Outline:\n{}\n", pack.outline);
            println!("Concept cards:");
            for card in &pack.cards {
                println!("- {}: {}", card.concept, card.explanation);
            }
            println!("\n{} quiz questions generated.", pack.quiz.len());
            println!("Study pack saved to: {}", pack.report_path.display());
        }
        Command::Companion => companion_loop(&provider).await?,
    }

    Ok(())
}

fn resolve_config_path(flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("QUIRE_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn create_provider(llm: &LlmConfig, model: &str) -> AnyProvider {
    AnyProvider::Ollama(OllamaProvider::new(
        &llm.base_url,
        model.to_owned(),
        llm.embedding_model.clone(),
    ))
}

#[allow(irrefutable_let_patterns)]
async fn health_check(provider: &AnyProvider) {
    if let AnyProvider::Ollama(ollama) = provider {
        match ollama.health_check().await {
            Ok(()) => tracing::info!("ollama health check passed"),
            Err(e) => tracing::warn!("ollama health check failed: {e:#}"),
        }
    }
}

async fn load_knowledge_base(
    provider: AnyProvider,
    config: &Config,
) -> anyhow::Result<KnowledgeBase<AnyProvider>> {
    let kb = KnowledgeBase::new(provider, config)?;
    let status = kb.load(&config.documents.folder).await;
    println!("{status}");
    Ok(kb)
}

fn render_answer(answer: &Answer) -> String {
    if answer.sources.is_empty() {
        answer.text.clone()
    } else {
        format!("{}\n\nSources:\n{}", answer.text, answer.sources)
    }
}

fn print_result(result: Result<Answer, RagError>) -> anyhow::Result<()> {
    match result {
        Ok(answer) => println!("{}", render_answer(&answer)),
        Err(RagError::IndexNotReady) => println!("{NOT_READY}"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn prompt_line<R>(
    lines: &mut tokio::io::Lines<R>,
    prompt: &str,
) -> anyhow::Result<Option<String>>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;
    Ok(lines.next_line().await?)
}

async fn chat_loop(
    kb: &KnowledgeBase<AnyProvider>,
    config: &Config,
    top_k: usize,
    agent_mode: bool,
) -> anyhow::Result<()> {
    let mut agent = Agent::new(kb, &config.agent, top_k);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Type a question, /load to rebuild the index, /quit to exit.");

    while let Some(line) = prompt_line(&mut lines, "You: ").await? {
        let input = line.trim();
        match input {
            "" => {}
            "/quit" | "/exit" => break,
            "/load" => {
                let status = kb.load(&config.documents.folder).await;
                agent.reset();
                println!("{status}");
            }
            question => {
                let result = if agent_mode {
                    agent.ask(question).await
                } else {
                    kb.ask(question, top_k).await
                };
                match result {
                    Ok(answer) => println!("{}\n", render_answer(&answer)),
                    Err(RagError::IndexNotReady) => println!("{NOT_READY}"),
                    Err(e) => println!("Error: {e}"),
                }
            }
        }
    }
    Ok(())
}

async fn companion_loop(provider: &AnyProvider) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Ask about prompting, RAG, evaluation, reliability, or deployment. /quit exits.");

    while let Some(line) = prompt_line(&mut lines, "You: ").await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/quit" || input == "/exit" {
            break;
        }
        match companion::reply(provider, input).await {
            Ok(text) => println!("{text}\n"),
            Err(e) => println!("Error: {e}"),
        }
    }
    Ok(())
}

async fn summarize(
    provider: &AnyProvider,
    config: &Config,
    file: &Path,
    length: SummaryLength,
    style: SummaryStyle,
) -> anyhow::Result<()> {
    let report = Summarizer::new(provider, &config.summarizer, config.documents.max_file_size)
        .summarize_file(file, length, style)
        .await
        .with_context(|| format!("cannot summarize {}", file.display()))?;

    println!("Preview of {}:\n{}\n", report.filename, report.preview);
    println!("Summary ({length}, {style}):\n{}\n", report.summary);
    println!("{}", report.scores);
    println!("\nLogged to {}", config.summarizer.log_file.display());
    Ok(())
}
