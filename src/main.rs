//! AgentMesh Catalog CLI
//!
//! Command-line interface for ingesting catalog records and querying them.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use agentmesh_catalog::{
    records_from_payload, CatalogConfig, ChunkStrategy, IngestService, QueryService, Result,
    TextPreprocessor, VectorStoreGateway, DEFAULT_TOP_K,
};

#[derive(Parser)]
#[command(name = "agentmesh-catalog")]
#[command(author, version, about = "AgentMesh catalog indexer", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new catalog configuration
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config.toml")]
        output: String,
    },

    /// Ingest records from a JSON file into the index
    Ingest {
        /// JSON array of records, or an upload envelope
        file: String,
    },

    /// Run a similarity query against the index
    Query {
        /// Query text
        text: String,

        /// Maximum number of results
        #[arg(short, default_value_t = DEFAULT_TOP_K)]
        k: usize,
    },

    /// Split a text file into chunks
    Chunk {
        /// Text file to split
        file: String,

        /// Chunking strategy
        #[arg(long, value_enum, default_value_t = Strategy::Recursive)]
        strategy: Strategy,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Normalize, then split recursively with overlap
    Recursive,
    /// Split recursively without normalization
    Raw,
    /// Pack normalized sentences with word overlap
    Sentence,
    /// Cut where embedding distance between sentences spikes
    Semantic,
}

impl From<Strategy> for ChunkStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Recursive => ChunkStrategy::Recursive,
            Strategy::Raw => ChunkStrategy::Raw,
            Strategy::Sentence => ChunkStrategy::Sentence,
            Strategy::Semantic => ChunkStrategy::Semantic,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: &str) -> Result<CatalogConfig> {
    let mut config = if Path::new(path).exists() {
        info!("Loading configuration from: {}", path);
        CatalogConfig::load(path)?
    } else {
        info!("Using default configuration");
        CatalogConfig::default()
    };
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Init { output } => {
            info!("Initializing new catalog configuration at: {}", output);
            let config = CatalogConfig::default();
            config.save(&output)?;
            info!("Configuration saved successfully");
        }

        Commands::Ingest { file } => {
            let config = load_config(&cli.config)?;
            let raw = std::fs::read_to_string(&file)?;
            let payload: serde_json::Value = serde_json::from_str(&raw)?;
            let items = records_from_payload(&payload)?;
            info!("Read {} items from {}", items.len(), file);

            let gateway = Arc::new(VectorStoreGateway::from_config(&config)?);
            let report = IngestService::new(gateway).ingest_json(items).await?;
            print_json(&report)?;
        }

        Commands::Query { text, k } => {
            let config = load_config(&cli.config)?;
            let gateway = Arc::new(VectorStoreGateway::from_config(&config)?);
            let results = QueryService::new(gateway).similarity_search(&text, k).await?;
            print_json(&results)?;
        }

        Commands::Chunk { file, strategy } => {
            let config = load_config(&cli.config)?;
            let text = std::fs::read_to_string(&file)?;
            let preprocessor = TextPreprocessor::new(&config.text)?;

            let strategy = ChunkStrategy::from(strategy);
            let embedder = if strategy.needs_embedder() {
                Some(VectorStoreGateway::from_config(&config)?.embedder())
            } else {
                None
            };
            let chunks = preprocessor
                .split(&text, strategy, embedder.as_deref())
                .await?;
            info!("Split {} into {} chunks", file, chunks.len());
            print_json(&chunks)?;
        }
    }

    Ok(())
}
