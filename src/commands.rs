use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::BookrecError;
use crate::catalog::Catalog;
use crate::config::{Config, default_data_dir, run_interactive_config, show_config};
use crate::database::VectorStore;
use crate::embeddings::OllamaClient;
use crate::engine::Engine;
use crate::indexer::Indexer;
use crate::output::{self, OutputFormat};
use crate::server;

/// Fully initialized application state: config, catalog, and the engine
/// wired to live Ollama and LanceDB backends. Everything that can fail
/// fatally fails here, before any query is served.
pub struct AppContext {
    pub config: Config,
    pub engine: Engine,
}

/// Resolve the data directory, honoring the `--data-dir` override.
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> Result<PathBuf> {
    match data_dir {
        Some(dir) => Ok(dir),
        None => default_data_dir().context("Failed to determine data directory"),
    }
}

/// Load config, catalog, embedding client, and vector store, and verify
/// they agree with each other.
#[inline]
pub async fn init_context(data_dir: Option<PathBuf>) -> Result<AppContext> {
    let base_dir = resolve_data_dir(data_dir)?;
    let config = Config::load(&base_dir).context("Failed to load configuration")?;

    let catalog = Catalog::load(config.books_csv_path()).context("Failed to load book catalog")?;

    let client = OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?;
    client
        .health_check()
        .context("Embedding model is unavailable")?;

    let store = VectorStore::open(&config)
        .await
        .context("Failed to open vector store")?;

    // The store was built with some model; serving queries against vectors
    // of a different dimension would silently return garbage.
    let configured_dim = config.ollama.embedding_dimension as usize;
    if store.dimension() != configured_dim {
        return Err(BookrecError::Config(format!(
            "Vector store was built with {}-dimensional embeddings but the configured \
             model produces {}; re-run `bookrec index --rebuild` or fix the config",
            store.dimension(),
            configured_dim
        ))
        .into());
    }

    info!(
        "Initialized: {} books, {} embeddings",
        catalog.len(),
        store.count().await.unwrap_or(0)
    );

    let engine = Engine::new(
        catalog,
        Box::new(client),
        Box::new(store),
        config.search.clone(),
    );

    Ok(AppContext { config, engine })
}

/// Run a semantic search and print the results.
#[inline]
pub async fn run_search(
    data_dir: Option<PathBuf>,
    query: String,
    top_k: Option<usize>,
    min_rating: Option<f32>,
    format: OutputFormat,
) -> Result<()> {
    let context = init_context(data_dir).await?;

    let recommendations = context.engine.recommend(&query, top_k, min_rating).await?;
    let rendered = output::render(&recommendations, format)?;
    print!("{}", rendered);

    Ok(())
}

/// Build (or rebuild) the vector store from the book catalog.
#[inline]
pub async fn run_index(
    data_dir: Option<PathBuf>,
    csv: Option<PathBuf>,
    rebuild: bool,
) -> Result<()> {
    let base_dir = resolve_data_dir(data_dir)?;
    let mut config = Config::load(&base_dir).context("Failed to load configuration")?;
    if let Some(csv) = csv {
        config.data.books_csv = csv;
    }

    let catalog = Catalog::load(config.books_csv_path()).context("Failed to load book catalog")?;
    let client = OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?;

    let indexer = Indexer::new(client, config);
    let stats = indexer.build(&catalog, rebuild).await?;

    println!("Indexing complete!");
    println!("  Books in catalog: {}", stats.total_books);
    println!("  Embeddings written: {}", stats.indexed);
    if stats.skipped_no_description > 0 {
        println!(
            "  Skipped (no description): {}",
            stats.skipped_no_description
        );
    }

    Ok(())
}

/// Start the web widget and JSON API.
#[inline]
pub async fn run_serve(
    data_dir: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let context = init_context(data_dir).await?;

    let host = host.unwrap_or_else(|| context.config.server.host.clone());
    let port = port.unwrap_or(context.config.server.port);

    server::run(context.engine, &host, port).await
}

/// Print the state of the catalog, vector store, and embedding backend.
#[inline]
pub async fn run_status(data_dir: Option<PathBuf>) -> Result<()> {
    let base_dir = resolve_data_dir(data_dir)?;
    let config = Config::load(&base_dir).context("Failed to load configuration")?;

    println!("Data directory: {}", base_dir.display());
    println!("Books CSV: {}", config.books_csv_path().display());

    match Catalog::load(config.books_csv_path()) {
        Ok(catalog) => println!("Catalog: {} books", catalog.len()),
        Err(e) => println!("Catalog: unavailable ({})", e),
    }

    match VectorStore::open(&config).await {
        Ok(store) => {
            let count = store.count().await.unwrap_or(0);
            println!(
                "Vector store: {} embeddings, {} dimensions",
                count,
                store.dimension()
            );
        }
        Err(e) => println!("Vector store: unavailable ({})", e),
    }

    match OllamaClient::new(&config.ollama) {
        Ok(client) => match client.health_check() {
            Ok(()) => println!(
                "Ollama: reachable at {} (model {})",
                config.ollama_url().map_or_else(
                    |_| "<invalid url>".to_string(),
                    |url| url.to_string()
                ),
                config.ollama.model
            ),
            Err(e) => println!("Ollama: unreachable ({:#})", e),
        },
        Err(e) => println!("Ollama: misconfigured ({:#})", e),
    }

    Ok(())
}

/// Show or interactively edit the configuration.
#[inline]
pub fn run_config(data_dir: Option<PathBuf>, show: bool) -> Result<()> {
    let base_dir = resolve_data_dir(data_dir)?;
    if show {
        show_config(&base_dir)
    } else {
        run_interactive_config(&base_dir)
    }
}
