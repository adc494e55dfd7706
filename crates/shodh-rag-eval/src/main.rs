//! Shodh-RAG retrieval evaluation CLI.
//!
//! # Usage
//!
//! ```bash
//! # Judge a dump of retrieved references against the local index
//! shodh-rag-eval results.txt -q "How does Tesla evaluate its energy segment growth?"
//!
//! # Offline, against an exported chunk file, with a known corpus estimate
//! shodh-rag-eval results.txt --chunks chunks.json --estimate 12 --json
//! ```
//!
//! The dump holds one reference per line, as printed by the retrieval step:
//! `Relevant Document 0, NASDAQ_TSLA_2023.txt, chunk index 131`.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use shodh_rag_eval::rag::{format_json, format_session_report, ConsoleJudge, JudgeTokens};
use shodh_rag_eval::{
    run_session, ContentLookup, CorpusRelevantEstimate, EvalConfig, EvalError, InMemoryChunkStore,
    LanceChunkStore, SessionOptions,
};

/// Interactively judge retrieved chunks and score the ranking.
///
/// Shows each retrieved chunk, asks whether it is relevant to the query, then
/// reports precision, recall and F1 at every cutoff plus Average Precision.
#[derive(Parser)]
#[command(name = "shodh-rag-eval", version, about)]
struct Cli {
    /// File with the retrieved references, one per line
    dump: PathBuf,

    /// The query the references were retrieved for
    #[arg(short, long, default_value = "")]
    query: String,

    /// Estimated relevant chunks in the whole corpus (asked interactively if omitted)
    #[arg(short, long)]
    estimate: Option<u64>,

    /// JSON config file (default: built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// LanceDB directory to look chunks up in
    #[arg(long)]
    store: Option<PathBuf>,

    /// LanceDB table name
    #[arg(long)]
    table: Option<String>,

    /// Column matched against the document id in the dump
    #[arg(long)]
    document_column: Option<String>,

    /// Look chunks up in an exported JSON chunk file instead of LanceDB
    #[arg(long, conflicts_with_all = ["store", "table", "document_column"])]
    chunks: Option<PathBuf>,

    /// Output the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs and the judging dialogue go to stderr; stdout carries only the report
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    let corpus_estimate = cli
        .estimate
        .map(|n| CorpusRelevantEstimate::new(n).ok_or_else(|| anyhow!("--estimate must be positive")))
        .transpose()?;

    let dump = std::fs::read_to_string(&cli.dump)
        .with_context(|| format!("Failed to read reference dump {}", cli.dump.display()))?;

    let lookup: Box<dyn ContentLookup> = match &cli.chunks {
        Some(path) => Box::new(InMemoryChunkStore::from_json_file(path)?),
        None => Box::new(LanceChunkStore::open(&config.store).await?),
    };

    let options = SessionOptions {
        query: cli.query.clone(),
        corpus_estimate,
    };
    let tokens = JudgeTokens::from(&config.judge);
    let mut judge = ConsoleJudge::stdio();

    let session = match run_session(&dump, &options, lookup.as_ref(), &mut judge, &tokens).await {
        Ok(session) => session,
        Err(EvalError::Interrupted) => {
            eprintln!("\nEvaluation interrupted, no report produced.");
            std::process::exit(130);
        }
        Err(e) => return Err(e.into()),
    };

    let output = if cli.json {
        format_json(&session)?
    } else {
        format_session_report(&session, config.report.decimals)
    };
    println!("{}", output);

    Ok(())
}

fn load_config(cli: &Cli) -> Result<EvalConfig> {
    let mut config = match &cli.config {
        Some(path) => EvalConfig::from_file(path)?,
        None => EvalConfig::default(),
    };

    if let Some(store) = &cli.store {
        config.store.path = store.clone();
    }
    if let Some(table) = &cli.table {
        config.store.table_name = table.clone();
    }
    if let Some(column) = &cli.document_column {
        config.store.document_column = column.clone();
    }

    config.validate().map_err(EvalError::Config)?;
    Ok(config)
}
