//! SmartMeal - nutrition tracking and meal planning client library
//!
//! This library provides the client side of SmartMeal: sign-in against the
//! remote service, a persisted session, food scanning from a frame source,
//! and weekly meal plan generation.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Persisted identity and token (file, keyring or memory)
//! - `service`: Remote service contract, HTTP client and a scripted fake
//! - `auth`: Sign-in / sign-up form controller
//! - `capture`: Frame sources and the scan state machine
//! - `planner`: Weekly plan controller
//! - `shell`: Wires the session and service into the controllers
//! - `render`: Terminal views for scan results and plans
//! - `commands`: CLI and interactive shell handlers
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use smartmeal::{Config, Shell};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let shell = Shell::from_config(&config)?;
//!     println!("{}", shell.greeting()?);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod capture;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod planner;
pub mod render;
pub mod service;
pub mod session;
pub mod shell;

// Re-export commonly used types
pub use auth::{AuthController, AuthEvent};
pub use capture::{CaptureController, CaptureOutcome, CaptureState};
pub use config::Config;
pub use error::{Result, SmartMealError};
pub use planner::{PlanController, PlanOutcome};
pub use service::{MealService, ServiceClient};
pub use session::{Session, SessionStore};
pub use shell::Shell;

#[cfg(test)]
pub mod test_utils;
