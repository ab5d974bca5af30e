use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{CatalogCommand, ConfigCommand, RecipeCommand};
use cookbook::{Config, Services};

#[derive(Parser)]
#[command(name = "cookbook")]
#[command(version)]
#[command(about = "Manage recipes, ingredients, steps and techniques", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage recipes
    Recipe(RecipeCommand),

    /// Manage ingredients
    Ingredient(CatalogCommand),

    /// Manage recipe steps
    Step(CatalogCommand),

    /// Manage cooking techniques
    Technique(CatalogCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Recipe(cmd)) => {
            let services = Services::from_config(&config).await?;
            cmd.run(&*services.recipes).await?;
        }
        Some(Commands::Ingredient(cmd)) => {
            let services = Services::from_config(&config).await?;
            cmd.run(&*services.ingredients).await?;
        }
        Some(Commands::Step(cmd)) => {
            let services = Services::from_config(&config).await?;
            cmd.run(&*services.steps).await?;
        }
        Some(Commands::Technique(cmd)) => {
            let services = Services::from_config(&config).await?;
            cmd.run(&*services.techniques).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
