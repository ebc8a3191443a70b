use std::path::PathBuf;

use bookrec::Result;
use bookrec::commands::{run_config, run_index, run_search, run_serve, run_status};
use bookrec::output::OutputFormat;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bookrec")]
#[command(about = "Semantic book search over a static catalog")]
#[command(version)]
struct Cli {
    /// Directory holding the config file, books CSV, and vector store
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog with a natural-language query
    Search {
        /// The query text, e.g. "a story about forgiveness"
        query: String,
        /// Number of results to return
        #[arg(short = 'k', long = "top")]
        top_k: Option<usize>,
        /// Minimum average rating (0 disables the filter)
        #[arg(short = 'r', long)]
        min_rating: Option<f32>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Embed the catalog and build the vector store
    Index {
        /// Books CSV to index, overriding the configured path
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Replace an existing vector store
        #[arg(long)]
        rebuild: bool,
    },
    /// Start the web widget and JSON API
    Serve {
        /// Bind address, overriding the configured host
        #[arg(long)]
        host: Option<String>,
        /// Port, overriding the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Show the state of the catalog, vector store, and embedding backend
    Status,
    /// Configure the Ollama connection and search defaults
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            query,
            top_k,
            min_rating,
            format,
        } => {
            run_search(cli.data_dir, query, top_k, min_rating, format).await?;
        }
        Commands::Index { csv, rebuild } => {
            run_index(cli.data_dir, csv, rebuild).await?;
        }
        Commands::Serve { host, port } => {
            run_serve(cli.data_dir, host, port).await?;
        }
        Commands::Status => {
            run_status(cli.data_dir).await?;
        }
        Commands::Config { show } => {
            run_config(cli.data_dir, show)?;
        }
    }

    Ok(())
}
