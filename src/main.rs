//! component-graph - builds a graph of UI components from a source tree
//!
//! A command-line tool that scans JavaScript/TypeScript sources, detects
//! components and loads them with their relationships into Neo4j or SQLite.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use component_graph::core::config::LoggingConfig;
use component_graph::{
    index_project, Backend, Config, GraphStore, LanguageRegistry, Neo4jStore, SqliteStore,
};

/// component-graph - UI component graph builder
#[derive(Parser)]
#[command(name = "component-graph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a source tree and rebuild the component graph
    Index {
        /// Directory to scan
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Graph store to write to
        #[arg(short, long, value_enum)]
        backend: Option<Backend>,

        /// SQLite database file (sqlite backend)
        #[arg(short, long, value_name = "FILE")]
        database: Option<PathBuf>,

        /// Parallel analysis workers
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Show node and relationship counts
    Stats {
        /// Graph store to read from
        #[arg(short, long, value_enum)]
        backend: Option<Backend>,

        /// SQLite database file (sqlite backend)
        #[arg(short, long, value_name = "FILE")]
        database: Option<PathBuf>,
    },

    /// List supported languages
    Languages,
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let default_filter = if verbose {
        "component_graph=debug".to_string()
    } else {
        format!("component_graph={}", logging.level)
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match logging.format.as_str() {
        "json" => builder.json().init(),
        "compact" => builder.compact().init(),
        _ => builder.init(),
    }
}

fn apply_store_flags(config: &mut Config, backend: Option<Backend>, database: Option<PathBuf>) {
    if let Some(backend) = backend {
        config.graph.backend = backend;
    }
    if let Some(database) = database {
        config.graph.sqlite_path = database;
    }
}

async fn run_index<S: GraphStore>(store: &S, config: &Config) -> anyhow::Result<()> {
    let registry = Arc::new(LanguageRegistry::new());
    let summary = index_project(store, &config.scan, registry).await?;
    println!("{}", summary);
    Ok(())
}

async fn run_stats<S: GraphStore>(store: &S) -> anyhow::Result<()> {
    store.verify_connectivity().await?;
    let stats = store.stats().await?;
    println!("Graph at {}", store.endpoint());
    println!("{}", stats);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    init_logging(&config.logging, cli.verbose);

    match cli.command {
        Commands::Index {
            root,
            backend,
            database,
            workers,
        } => {
            apply_store_flags(&mut config, backend, database);
            if let Some(root) = root {
                config.scan.root = root;
            }
            if let Some(workers) = workers {
                config.scan.workers = workers;
            }

            info!(
                "Indexing {} into {:?} store",
                config.scan.root.display(),
                config.graph.backend
            );
            match config.graph.backend {
                Backend::Neo4j => run_index(&Neo4jStore::new(&config.graph)?, &config).await?,
                Backend::Sqlite => {
                    run_index(&SqliteStore::open(&config.graph.sqlite_path)?, &config).await?
                }
            }
        }

        Commands::Stats { backend, database } => {
            apply_store_flags(&mut config, backend, database);
            match config.graph.backend {
                Backend::Neo4j => run_stats(&Neo4jStore::new(&config.graph)?).await?,
                Backend::Sqlite => run_stats(&SqliteStore::open(&config.graph.sqlite_path)?).await?,
            }
        }

        Commands::Languages => {
            let registry = LanguageRegistry::new();
            println!("Supported languages:");
            for lang in registry.list_languages() {
                println!(
                    "  - {} (extensions: {})",
                    lang.language_id(),
                    lang.file_extensions().join(", ")
                );
            }
        }
    }

    Ok(())
}
