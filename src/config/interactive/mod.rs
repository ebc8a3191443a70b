
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::Path;

use super::{Config, ConfigError, OllamaConfig};
use crate::embeddings::OllamaClient;

#[inline]
pub fn run_interactive_config(base_dir: &Path) -> Result<()> {
    eprintln!("{}", style("Bookrec Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = Config::load(base_dir).context("Failed to load existing configuration")?;

    eprintln!("{}", style("Ollama Configuration").bold().yellow());
    eprintln!("Configure the local Ollama instance used for embedding generation.");
    eprintln!();

    configure_ollama(&mut config.ollama)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_ollama_connection(&config.ollama) {
        eprintln!("{}", style("✓ Ollama connection successful!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to Ollama").yellow()
        );
        eprintln!("You can continue, but make sure Ollama is running before indexing.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(base_dir: &Path) -> Result<()> {
    let config = Config::load(base_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Ollama Settings:").bold().yellow());
    eprintln!("  Host: {}", style(&config.ollama.host).cyan());
    eprintln!("  Port: {}", style(config.ollama.port).cyan());
    eprintln!("  Model: {}", style(&config.ollama.model).cyan());
    eprintln!("  Batch Size: {}", style(config.ollama.batch_size).cyan());
    eprintln!(
        "  Embedding Dimension: {}",
        style(config.ollama.embedding_dimension).cyan()
    );
    match config.ollama_url() {
        Ok(url) => eprintln!("  Ollama URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Ollama URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!("{}", style("Search Defaults:").bold().yellow());
    eprintln!("  Top K: {}", style(config.search.default_top_k).cyan());
    eprintln!(
        "  Minimum Rating: {}",
        style(config.search.default_min_rating).cyan()
    );
    eprintln!(
        "  Over-fetch Factor: {}",
        style(config.search.overfetch_factor).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Web Widget:").bold().yellow());
    eprintln!(
        "  Listen: {}",
        style(format!("{}:{}", config.server.host, config.server.port)).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Data:").bold().yellow());
    eprintln!(
        "  Books CSV: {}",
        style(config.books_csv_path().display()).cyan()
    );
    eprintln!(
        "  Vector Store: {}",
        style(config.vector_db_path().display()).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    let protocols = ["http", "https"];
    let current_protocol = protocols
        .iter()
        .position(|p| *p == ollama.protocol)
        .unwrap_or(0);
    let protocol_idx = Select::new()
        .with_prompt("Protocol")
        .items(&protocols)
        .default(current_protocol)
        .interact()?;
    ollama
        .set_protocol(protocols[protocol_idx].to_string())
        .map_err(config_err)?;

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(ollama.host.clone())
        .interact_text()?;
    ollama.set_host(host).map_err(config_err)?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(ollama.port)
        .interact_text()?;
    ollama.set_port(port).map_err(config_err)?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(ollama.model.clone())
        .interact_text()?;
    ollama.set_model(model).map_err(config_err)?;

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size")
        .default(ollama.batch_size)
        .interact_text()?;
    ollama.set_batch_size(batch_size).map_err(config_err)?;

    let dimension: u32 = Input::new()
        .with_prompt("Embedding dimension")
        .default(ollama.embedding_dimension)
        .interact_text()?;
    ollama.set_embedding_dimension(dimension).map_err(config_err)?;

    Ok(())
}

fn test_ollama_connection(ollama: &OllamaConfig) -> bool {
    match OllamaClient::new(ollama) {
        Ok(client) => client.ping().is_ok(),
        Err(_) => false,
    }
}

fn config_err(e: ConfigError) -> anyhow::Error {
    anyhow::anyhow!(e)
}
