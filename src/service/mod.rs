//! Remote SmartMeal service access
//!
//! This module defines the [`MealService`] trait the controllers talk to,
//! along with the request intents and outcomes it exchanges. The HTTP
//! implementation lives in [`client`]; [`fake`] provides an in-process
//! stand-in for tests.
//!
//! Every operation is one request and one response. Nothing retries, and
//! every failure reaches the caller as a single
//! [`SmartMealError::Service`](crate::error::SmartMealError::Service)
//! message.

pub mod client;
pub mod fake;
pub mod types;

pub use client::ServiceClient;
pub use types::{CaptureResult, DailyPlanEntry, FoodItem, ServiceStatus, WeeklyPlan};

use async_trait::async_trait;

use crate::capture::CapturedFrame;
use crate::error::Result;
use crate::session::Session;

/// Goal used for sign-up when the caller gives none.
pub const DEFAULT_CALORIE_GOAL: u32 = 2000;

/// Which credential exchange to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthIntent {
    /// Exchange credentials for a token
    #[default]
    SignIn,
    /// Create an account; yields no token
    SignUp,
}

impl AuthIntent {
    /// The other intent.
    pub fn toggled(self) -> Self {
        match self {
            Self::SignIn => Self::SignUp,
            Self::SignUp => Self::SignIn,
        }
    }
}

impl std::fmt::Display for AuthIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SignIn => write!(f, "sign in"),
            Self::SignUp => write!(f, "sign up"),
        }
    }
}

/// Successful result of [`MealService::authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Signed in; the caller should persist this
    Session(Session),
    /// Account created; the user still has to sign in
    Confirmation { identity: String },
}

/// Operations offered by the remote service.
#[async_trait]
pub trait MealService: Send + Sync {
    /// Sign in or sign up.
    ///
    /// `goal_metric` is only sent for [`AuthIntent::SignUp`] and falls back
    /// to [`DEFAULT_CALORIE_GOAL`].
    async fn authenticate(
        &self,
        identity: &str,
        secret: &str,
        intent: AuthIntent,
        goal_metric: Option<u32>,
    ) -> Result<AuthOutcome>;

    /// Classify one still frame.
    async fn classify_image(&self, frame: &CapturedFrame) -> Result<CaptureResult>;

    /// Generate a weekly plan around a daily calorie target.
    async fn generate_plan(&self, target_calories: u32) -> Result<WeeklyPlan>;

    /// Check the service root.
    async fn status(&self) -> Result<ServiceStatus>;
}
