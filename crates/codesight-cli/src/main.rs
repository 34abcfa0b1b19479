use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use codesight_cli::{CliError, Engine};
use codesight_core::ServerConfig;

#[derive(Parser)]
#[command(name = "codesight", about = "Local code/document indexing and hybrid search engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index a folder
    Index {
        path: PathBuf,
        #[arg(long)]
        force: bool,
    },
    /// Search indexed documents
    Search {
        query: String,
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(short = 'k', long = "top-k", default_value_t = codesight_core::DEFAULT_TOP_K)]
        top_k: usize,
        /// Restrict results to file paths matching this glob (e.g. "src/*.py")
        #[arg(short = 'g', long = "glob")]
        glob: Option<String>,
    },
    /// Ask a question; the configured LLM backend synthesizes an answer
    Ask {
        question: String,
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(short = 'k', long = "top-k", default_value_t = 5)]
        top_k: usize,
        /// Restrict retrieved context to file paths matching this glob
        #[arg(short = 'g', long = "glob")]
        glob: Option<String>,
    },
    /// Check index status
    Status {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "codesight failed");
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Index { path, force } => {
            let mut engine = Engine::open(&path, ServerConfig::default())?;
            let stats = engine.index(force)?;
            println!("{}", serde_json::to_string_pretty(&stats).unwrap_or_default());
        }
        Command::Search { query, path, top_k, glob } => {
            let mut engine = Engine::open(&path, ServerConfig::default())?;
            let results = engine.search(&query, top_k, glob.as_deref())?;
            for r in &results {
                println!("\n--- {} (lines {}-{}, score: {}) ---", r.file_path, r.start_line, r.end_line, r.score);
                println!("[{}]", r.scope);
                let preview: String = r.snippet.chars().take(500).collect();
                println!("{preview}");
            }
        }
        Command::Ask { question, path, top_k, glob } => {
            let mut engine = Engine::open(&path, ServerConfig::default())?;
            let answer = engine.ask(&question, top_k, glob.as_deref())?;
            println!("\n{}", answer.text);
            println!("\n--- Sources ({}) ---", answer.sources.len());
            for s in &answer.sources {
                println!("  - {} (lines {}-{}): {}", s.file_path, s.start_line, s.end_line, s.scope);
            }
        }
        Command::Status { path } => {
            let engine = Engine::open(&path, ServerConfig::default())?;
            let status = engine.status()?;
            println!("{}", serde_json::to_string_pretty(&status).unwrap_or_default());
        }
    }
    Ok(())
}
