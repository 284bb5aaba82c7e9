//! Command-line interface definition for SmartMeal
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the interactive shell plus one-shot commands for signing in,
//! scanning a meal, and generating a weekly plan.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SmartMeal - AI-powered nutrition tracking and meal planning
///
/// Scan meals and generate weekly plans against a SmartMeal service.
#[derive(Parser, Debug, Clone)]
#[command(name = "smartmeal")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Override the service base URL
    #[arg(long, env = "SMARTMEAL_BASE_URL")]
    pub base_url: Option<String>,

    /// Keep the session in memory only for this run
    #[arg(long)]
    pub ephemeral: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for SmartMeal
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the interactive shell
    Shell,

    /// Sign in and remember the session
    Login {
        /// Account name
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(short, long, env = "SMARTMEAL_PASSWORD")]
        password: String,
    },

    /// Create an account (does not sign in)
    Signup {
        /// Account name
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(short, long, env = "SMARTMEAL_PASSWORD")]
        password: String,

        /// Daily calorie goal stored with the account
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        goal: Option<u32>,
    },

    /// Scan a photo of a meal and show its nutrition
    Scan {
        /// Image file standing in for the camera frame
        image: PathBuf,
    },

    /// Generate a weekly meal plan
    Plan {
        /// Daily calorie target
        #[arg(short = 'k', long, value_parser = clap::value_parser!(u32).range(1..))]
        calories: Option<u32>,
    },

    /// Forget the saved session
    Logout,

    /// Show who is signed in
    Whoami,

    /// Check that the service is reachable
    Status,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            base_url: None,
            ephemeral: false,
            verbose: false,
            command: Commands::Shell,
        }
    }
}
