use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use newsynth::config::{
    DEFAULT_CHROMA_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_NEWS_API_URL, DEFAULT_OLLAMA_URL,
    DEFAULT_STORAGE_API_URL,
};
use newsynth::inspect::{collection_stats, count_items};
use newsynth::{
    DateWindow, EndpointConfig, Feature, Indexer, Orchestrator, PipelineClients, RunConfig,
};

#[derive(Parser)]
#[command(name = "newsynth")]
#[command(author, version, about = "Synthetic news description generation (RAG and NO-RAG)", long_about = None)]
struct Cli {
    #[command(flatten)]
    endpoints: EndpointArgs,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EndpointArgs {
    /// Article store API base URL
    #[arg(long, env = "NEWS_API_URL", default_value = DEFAULT_NEWS_API_URL, global = true)]
    news_api_url: String,

    /// Vector index (Chroma) base URL
    #[arg(long, env = "CHROMA_URL", default_value = DEFAULT_CHROMA_URL, global = true)]
    chroma_url: String,

    /// Ollama base URL for generation and embeddings
    #[arg(long, env = "OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL, global = true)]
    ollama_url: String,

    /// Synthetic document storage API base URL
    #[arg(long, env = "STORAGE_API_URL", default_value = DEFAULT_STORAGE_API_URL, global = true)]
    storage_api_url: String,

    /// Embedding model for headlines and indexed descriptions.
    ///
    /// Queries only match collections indexed with the same model; collections
    /// built with a different embedder must be re-indexed with `index`.
    #[arg(long, env = "EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL, global = true)]
    embedding_model: String,

    /// Timeout for any single HTTP call, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "300", global = true)]
    request_timeout_secs: u64,
}

impl EndpointArgs {
    fn into_config(self) -> EndpointConfig {
        EndpointConfig {
            news_api_url: self.news_api_url,
            chroma_url: self.chroma_url,
            ollama_url: self.ollama_url,
            storage_api_url: self.storage_api_url,
            embedding_model: self.embedding_model,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[derive(Args)]
struct WindowArgs {
    /// First day to process (dd-mm-yyyy)
    #[arg(long)]
    start_date: String,

    /// Last day to process, inclusive (dd-mm-yyyy)
    #[arg(long)]
    end_date: String,

    /// Daily start hour
    #[arg(long, default_value = "0")]
    start_hour: u32,

    /// Daily end hour
    #[arg(long, default_value = "23")]
    end_hour: u32,
}

impl WindowArgs {
    fn window(&self) -> Result<DateWindow> {
        let window = DateWindow::parse(&self.start_date, &self.end_date)
            .context("Invalid date window")?;
        DateWindow::with_hours(window.start, window.end, self.start_hour, self.end_hour)
            .context("Invalid hour span")
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate RAG and NO-RAG synthetic descriptions for every source
    Generate {
        #[command(flatten)]
        window: WindowArgs,

        /// Prefix of the backend model names
        #[arg(long, default_value = "QWEN_7B_")]
        model_prefix: String,

        /// Numeric LLM identifier stored with each document
        #[arg(long, default_value = "2")]
        llm_id: u32,

        /// Feature identifiers to run in parallel
        #[arg(long, value_delimiter = ',', default_value = "1,2,3")]
        features: Vec<u32>,

        /// Restrict the run to these sources instead of the full catalogue
        #[arg(long, value_delimiter = ',')]
        source: Vec<String>,

        /// Context documents retrieved per headline
        #[arg(long, default_value = "10")]
        top_k: usize,
    },

    /// Populate the per-source vector collections from the article store
    Index {
        #[command(flatten)]
        window: WindowArgs,

        /// Restrict indexing to these sources
        #[arg(long, value_delimiter = ',')]
        source: Vec<String>,
    },

    /// List vector collections and their document counts
    Collections,

    /// Count stored articles per source over a window
    Count {
        #[command(flatten)]
        window: WindowArgs,

        /// Restrict counting to these sources
        #[arg(long, value_delimiter = ',')]
        source: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = cli.endpoints.into_config();
    let clients = PipelineClients::from_config(&config).context("Failed to build HTTP client")?;

    match cli.command {
        Commands::Generate {
            window,
            model_prefix,
            llm_id,
            features,
            source,
            top_k,
        } => {
            let run = RunConfig {
                model_prefix,
                llm_id,
                top_k,
            };
            let features = features.into_iter().map(Feature).collect();
            generate(clients, run, features, window.window()?, source).await
        }
        Commands::Index { window, source } => index(clients, window.window()?, source).await,
        Commands::Collections => show_collections(clients).await,
        Commands::Count { window, source } => count(clients, window.window()?, source).await,
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Explicit sources, or the full catalogue when none were given
async fn resolve_sources(clients: &PipelineClients, explicit: Vec<String>) -> Result<Vec<String>> {
    if !explicit.is_empty() {
        return Ok(explicit);
    }
    clients
        .articles
        .list_sources()
        .await
        .context("Failed to list sources from the article store")
}

/// Cancel `token` on Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing current articles");
            token.cancel();
        }
    });
}

async fn generate(
    clients: PipelineClients,
    run: RunConfig,
    features: Vec<Feature>,
    window: DateWindow,
    sources: Vec<String>,
) -> Result<()> {
    let sources = resolve_sources(&clients, sources).await?;
    info!(
        "Generating for {} sources, {} days, features {:?}",
        sources.len(),
        window.day_count(),
        features.iter().map(|f| f.0).collect::<Vec<_>>()
    );

    let orchestrator = Orchestrator::new(clients, run, features, window);
    cancel_on_ctrl_c(orchestrator.cancellation_token());

    let summary = orchestrator.run_sources(&sources).await;
    let stats = summary.stats;

    println!("Generation Summary");
    println!("==================");
    println!("Sources processed: {}", summary.sources_processed);
    for task in &summary.tasks {
        println!(
            "{} / feature {}: {} processed, {} skipped, {} failed days",
            task.source,
            task.feature,
            task.articles_processed,
            task.articles_skipped,
            task.days_failed
        );
    }
    println!();
    println!("Errors: {}", stats.errors);
    println!(
        "RAG documents: {} attempted, {} stored",
        stats.rag_generated, stats.rag_persisted
    );
    println!(
        "NO-RAG documents: {} attempted, {} stored",
        stats.no_rag_generated, stats.no_rag_persisted
    );
    if summary.cancelled {
        println!("Run was cancelled before completion");
    }

    Ok(())
}

async fn index(clients: PipelineClients, window: DateWindow, sources: Vec<String>) -> Result<()> {
    let sources = resolve_sources(&clients, sources).await?;
    let indexer = Indexer::new(clients);

    for source in &sources {
        match indexer.index_source(source, &window).await {
            Ok(report) => println!(
                "{}: {} articles seen, {} added, {} duplicates, {} failed days",
                report.source,
                report.articles_seen,
                report.added,
                report.duplicates,
                report.failed_days
            ),
            Err(e) => warn!(source = %source, "indexing skipped: {:#}", e),
        }
    }
    Ok(())
}

async fn show_collections(clients: PipelineClients) -> Result<()> {
    let beat = clients
        .chroma
        .heartbeat()
        .await
        .context("Vector index is not reachable")?;
    info!("Heartbeat: {}", beat);

    let stats = collection_stats(&clients.chroma).await?;
    if stats.is_empty() {
        println!("No collections found");
        return Ok(());
    }

    println!("Collections ({})", stats.len());
    println!("-----------");
    for stat in &stats {
        let docs = stat
            .documents
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("{} [{}]: {} documents", stat.collection.name, stat.collection.id, docs);
    }
    Ok(())
}

async fn count(clients: PipelineClients, window: DateWindow, sources: Vec<String>) -> Result<()> {
    let sources = resolve_sources(&clients, sources).await?;
    let counts = count_items(&clients.articles, &sources, &window).await;

    println!("Item Counts");
    println!("===========");
    for entry in &counts {
        if entry.failed_days > 0 {
            println!(
                "{}: {} items ({} days unreadable)",
                entry.source, entry.total_items, entry.failed_days
            );
        } else {
            println!("{}: {} items", entry.source, entry.total_items);
        }
    }
    Ok(())
}
