use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Password, Select};

use super::{Config, DatabaseConfig, OllamaConfig, get_config_dir};
use crate::ollama::OllamaClient;

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 sqlpilot Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("MySQL Connection").bold().yellow());
    eprintln!("Configure the database that generated queries will run against.");
    eprintln!();

    configure_database(&mut config.database)?;

    eprintln!();
    eprintln!("{}", style("Ollama Configuration").bold().yellow());
    eprintln!("Configure your local Ollama instance for embeddings and SQL generation.");
    eprintln!();

    configure_ollama(&mut config.ollama)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_ollama_connection(&config)? {
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
pub fn show_config() -> Result<()> {
    let config_dir = get_config_dir().context("Failed to resolve config directory")?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("MySQL Settings:").bold().yellow());
    eprintln!("  Connection: {}", style(config.database.display_url()).cyan());
    eprintln!(
        "  Connect Timeout: {}s",
        style(config.database.connect_timeout_secs).cyan()
    );
    eprintln!(
        "  Pool Recycle: {}s",
        style(config.database.pool_recycle_secs).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Ollama Settings:").bold().yellow());
    eprintln!("  Host: {}", style(&config.ollama.host).cyan());
    eprintln!("  Port: {}", style(config.ollama.port).cyan());
    eprintln!(
        "  Embedding Model: {}",
        style(&config.ollama.embedding_model).cyan()
    );
    eprintln!(
        "  Completion Model: {}",
        style(&config.ollama.completion_model).cyan()
    );
    eprintln!("  Batch Size: {}", style(config.ollama.batch_size).cyan());
    eprintln!(
        "  Temperature: {}",
        style(config.ollama.temperature).cyan()
    );
    eprintln!("  Max Tokens: {}", style(config.ollama.max_tokens).cyan());

    eprintln!();
    match config.ollama.endpoint() {
        Ok(url) => eprintln!("  Ollama URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Ollama URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!(
        "Metadata bundle: {}",
        style(config.metadata_file_path().display()).dim()
    );
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    let config_dir = get_config_dir().context("Failed to resolve config directory")?;

    Config::load(&config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: config_dir.clone(),
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_database(database: &mut DatabaseConfig) -> Result<()> {
    database.host = Input::new()
        .with_prompt("MySQL host")
        .default(database.host.clone())
        .interact_text()?;

    database.port = Input::new()
        .with_prompt("MySQL port")
        .default(database.port)
        .validate_with(|port: &u16| {
            if *port == 0 {
                Err("port must be between 1 and 65535")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    database.user = Input::new()
        .with_prompt("MySQL user")
        .default(database.user.clone())
        .validate_with(|user: &String| {
            if user.trim().is_empty() {
                Err("user cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    database.password = Password::new()
        .with_prompt("MySQL password (leave empty to keep/skip)")
        .allow_empty_password(true)
        .interact()
        .map(|entered| {
            if entered.is_empty() {
                database.password.clone()
            } else {
                entered
            }
        })?;

    database.name = Input::new()
        .with_prompt("Database name")
        .default(database.name.clone())
        .validate_with(|name: &String| {
            if name.trim().is_empty() {
                Err("database name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    Ok(())
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let current_protocol = protocols
        .iter()
        .position(|p| *p == ollama.protocol)
        .unwrap_or(0);

    let protocol_idx = Select::new()
        .with_prompt("Protocol")
        .items(protocols)
        .default(current_protocol)
        .interact()?;
    ollama.protocol = protocols[protocol_idx].to_string();

    ollama.host = Input::new()
        .with_prompt("Ollama host")
        .default(ollama.host.clone())
        .interact_text()?;

    ollama.port = Input::new()
        .with_prompt("Ollama port")
        .default(ollama.port)
        .validate_with(|port: &u16| {
            if *port == 0 {
                Err("port must be between 1 and 65535")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    ollama.embedding_model = Input::new()
        .with_prompt("Embedding model")
        .default(ollama.embedding_model.clone())
        .validate_with(|model: &String| {
            if model.trim().is_empty() {
                Err("model cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    ollama.completion_model = Input::new()
        .with_prompt("Completion model (generates the SQL)")
        .default(ollama.completion_model.clone())
        .validate_with(|model: &String| {
            if model.trim().is_empty() {
                Err("model cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    Ok(())
}

fn test_ollama_connection(config: &Config) -> Result<bool> {
    match OllamaClient::new(config) {
        Ok(client) => Ok(client.ping().is_ok()),
        Err(_) => Ok(false),
    }
}
