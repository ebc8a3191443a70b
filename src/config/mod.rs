// Configuration management module
// Handles the TOML configuration file and interactive setup

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    Config, ConfigError, DataConfig, OllamaConfig, SearchConfig, ServerConfig, default_data_dir,
};
