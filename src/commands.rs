use anyhow::{Context, Result};
use console::style;
use indicatif::ProgressBar;
use std::time::Duration;

use crate::config::{Config, get_config_dir};
use crate::database::{Database, ExecutionOutcome, QueryResult};
use crate::index::{CollectionKind, SchemaIndex};
use crate::metadata::SchemaMetadata;
use crate::ollama::OllamaClient;
use crate::pipeline::QueryPipeline;

fn load_config() -> Result<Config> {
    let config_dir = get_config_dir().context("Failed to resolve config directory")?;
    Config::load(&config_dir)
}

/// Rebuild the schema index from the metadata bundle
#[inline]
pub async fn run_index() -> Result<()> {
    let config = load_config()?;
    let metadata_path = config.metadata_file_path();

    // A missing or malformed bundle is fatal; there is no partial index
    let metadata = SchemaMetadata::load(&metadata_path)?;

    let pipeline = QueryPipeline::connect(&config).await?;
    pipeline.ollama().health_check().context(
        "Ollama is not ready; use 'sqlpilot config' to update connection settings",
    )?;

    println!(
        "Indexing schema metadata from {}",
        metadata_path.display()
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Embedding and indexing schema metadata...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let stats = pipeline.rebuild_index(&metadata).await;
    spinner.finish_and_clear();
    let stats = stats?;

    println!("✅ Schema index rebuilt:");
    println!("   📋 Table descriptions: {}", stats.tables);
    println!("   📋 Column descriptions: {}", stats.columns);
    println!("   📋 Sample queries: {}", stats.sample_queries);

    Ok(())
}

/// Answer one natural-language question
#[inline]
pub async fn run_ask(question: &str, no_execute: bool, show_context: bool) -> Result<()> {
    let config = load_config()?;
    let pipeline = QueryPipeline::connect(&config).await?;

    if pipeline.index().count(CollectionKind::Tables).await? == 0 {
        println!(
            "{}",
            style("⚠ The schema index is empty. Run 'sqlpilot index' first for useful results.")
                .yellow()
        );
    }

    let answer = pipeline.answer(question, !no_execute).await?;

    if show_context {
        println!("{}", style("Retrieved schema context:").bold());
        println!("{}", answer.context);
        println!();
    }

    let Some(sql) = answer.sql() else {
        println!(
            "{}",
            style("❌ No SQL query could be extracted from the model response.").red()
        );
        println!();
        println!("{}", style("Raw model response:").dim());
        println!("{}", answer.generated.raw_response);
        return Ok(());
    };

    println!("{}", style("Generated SQL:").bold());
    println!("{sql}");

    match answer.outcome {
        Some(ExecutionOutcome::Success { result, .. }) => {
            println!();
            print_result(&result);
        }
        Some(ExecutionOutcome::Failed { error, .. }) => {
            println!();
            println!("{} {}", style("❌ Query execution failed:").red(), error);
        }
        None => {
            if no_execute {
                println!();
                println!("{}", style("Execution skipped (--no-execute).").dim());
            }
        }
    }

    Ok(())
}

fn print_result(result: &QueryResult) {
    if result.columns.is_empty() {
        println!("{}", style("Query returned no rows.").dim());
        return;
    }

    let header = result.columns.join(" | ");
    println!("{}", style(&header).bold());
    println!("{}", "-".repeat(header.len()));

    for row in &result.rows {
        println!("{}", row.join(" | "));
    }

    println!();
    println!("{} row(s)", result.row_count());
}

/// Show connectivity and index status
#[inline]
pub async fn show_status() -> Result<()> {
    let config = load_config()?;

    println!("📊 sqlpilot Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🗄️  MySQL Status:");
    let database = Database::connect(&config);
    match database.ping().await {
        Ok(()) => {
            println!("   ✅ MySQL: Connected ({})", config.database.display_url());
        }
        Err(e) => {
            println!("   ❌ MySQL: Failed to connect - {}", e);
        }
    }

    println!("🤖 Ollama Status:");
    match OllamaClient::new(&config) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "   ✅ Ollama: Connected ({}:{})",
                    config.ollama.host, config.ollama.port
                );
                println!(
                    "   📋 Embedding Model: {}",
                    config.ollama.embedding_model
                );
                println!(
                    "   📋 Completion Model: {}",
                    config.ollama.completion_model
                );
            }
            Err(e) => {
                println!("   ⚠️  Ollama: Connected but unhealthy - {}", e);
            }
        },
        Err(e) => {
            println!("   ❌ Ollama: Failed to connect - {}", e);
        }
    }

    println!("🔍 Schema Index Status:");
    match SchemaIndex::open(&config).await {
        Ok(index) => {
            for kind in CollectionKind::ALL {
                match index.count(kind).await {
                    Ok(count) => {
                        println!("   📊 {}: {} documents", kind.describe(), count);
                    }
                    Err(e) => {
                        println!("   ❌ {}: {}", kind.describe(), e);
                    }
                }
            }
        }
        Err(e) => {
            println!("   ❌ LanceDB: Failed to open - {}", e);
        }
    }

    let metadata_path = config.metadata_file_path();
    println!();
    println!("📚 Metadata bundle: {}", metadata_path.display());
    if !metadata_path.exists() {
        println!("   ⚠️  Bundle not found. Create it and run 'sqlpilot index'.");
    }

    println!();
    println!("💡 Next Steps:");
    println!("   • Use 'sqlpilot config' to update connection settings");
    println!("   • Use 'sqlpilot index' to rebuild the schema index");
    println!("   • Use 'sqlpilot ask \"<question>\"' to generate and run a query");

    Ok(())
}
