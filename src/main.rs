use clap::{Parser, Subcommand};
use sqlpilot::Result;
use sqlpilot::commands::{run_ask, run_index, show_status};
use sqlpilot::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "sqlpilot")]
#[command(about = "Ask questions of your MySQL database in natural language")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure database and Ollama connection settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Rebuild the schema index from the metadata bundle
    Index,
    /// Generate (and run) a SQL query for a natural-language question
    Ask {
        /// The question to answer
        question: String,
        /// Generate the SQL but do not run it
        #[arg(long)]
        no_execute: bool,
        /// Print the retrieved schema context before the SQL
        #[arg(long)]
        show_context: bool,
    },
    /// Show connectivity and index status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Index => {
            run_index().await?;
        }
        Commands::Ask {
            question,
            no_execute,
            show_context,
        } => {
            run_ask(&question, no_execute, show_context).await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["sqlpilot", "status"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Status);
        }
    }

    #[test]
    fn ask_command_with_question() {
        let cli = Cli::try_parse_from(["sqlpilot", "ask", "total amount of all orders"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask {
                question,
                no_execute,
                ..
            } = parsed.command
            {
                assert_eq!(question, "total amount of all orders");
                assert!(!no_execute);
            }
        }
    }

    #[test]
    fn ask_command_without_execution() {
        let cli = Cli::try_parse_from(["sqlpilot", "ask", "how many customers", "--no-execute"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask { no_execute, .. } = parsed.command {
                assert!(no_execute);
            }
        }
    }

    #[test]
    fn ask_command_requires_question() {
        let cli = Cli::try_parse_from(["sqlpilot", "ask"]);
        assert!(cli.is_err());
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["sqlpilot", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["sqlpilot", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["sqlpilot", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
