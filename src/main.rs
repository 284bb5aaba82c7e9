//! SmartMeal - nutrition tracking CLI
//!
#![doc = "SmartMeal - nutrition tracking CLI"]
#![doc = "Main entry point for the SmartMeal client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use smartmeal::cli::{Cli, Commands};
use smartmeal::commands;
use smartmeal::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Shell => {
            commands::shell::run_shell(config).await?;
            Ok(())
        }
        Commands::Login { username, password } => {
            tracing::info!("Signing in as {}", username);
            commands::account::login(config, username, password).await?;
            Ok(())
        }
        Commands::Signup {
            username,
            password,
            goal,
        } => {
            tracing::info!("Creating account {}", username);
            if let Some(g) = goal {
                tracing::debug!("Using calorie goal: {}", g);
            }
            commands::account::signup(config, username, password, goal).await?;
            Ok(())
        }
        Commands::Scan { image } => {
            tracing::debug!("Scanning image: {}", image.display());
            commands::scan::run_scan(config, image).await?;
            Ok(())
        }
        Commands::Plan { calories } => {
            commands::plan::run_plan(config, calories).await?;
            Ok(())
        }
        Commands::Logout => {
            commands::account::logout(config)?;
            Ok(())
        }
        Commands::Whoami => {
            commands::account::whoami(config)?;
            Ok(())
        }
        Commands::Status => {
            commands::status::run_status(config).await?;
            Ok(())
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "smartmeal=debug" } else { "smartmeal=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
