//! Weekly plan generation
//!
//! The [`PlanController`] owns the calorie target input and the last plan
//! the service returned. A failed request never clears a plan that is
//! already on screen.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::ErrorPolicy;
use crate::error::user_message;
use crate::service::types::WeeklyPlan;
use crate::service::MealService;

/// Whether a plan request is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanPhase {
    /// Ready for a new request
    #[default]
    Ready,
    /// Waiting for the service; submissions are ignored
    Pending,
}

/// What a call to [`PlanController::generate`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// A plan with this many days is now displayed
    Generated(usize),
    /// A request was already pending; nothing was sent
    Ignored,
    /// The request failed; the previous plan (if any) is still displayed
    Failed(String),
}

#[derive(Debug)]
struct PlanView {
    phase: PlanPhase,
    target: u32,
    plan: Option<WeeklyPlan>,
    last_error: Option<String>,
}

/// Controller for the meal planner.
pub struct PlanController {
    service: Arc<dyn MealService>,
    policy: ErrorPolicy,
    view: Mutex<PlanView>,
}

impl PlanController {
    /// Controller with the target input preset to `default_target`.
    pub fn new(service: Arc<dyn MealService>, policy: ErrorPolicy, default_target: u32) -> Self {
        Self {
            service,
            policy,
            view: Mutex::new(PlanView {
                phase: PlanPhase::Ready,
                target: default_target,
                plan: None,
                last_error: None,
            }),
        }
    }

    fn view(&self) -> MutexGuard<'_, PlanView> {
        self.view.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current value of the target input.
    pub fn target(&self) -> u32 {
        self.view().target
    }

    /// Edit the target input. Takes effect immediately for the balanced
    /// indicator of a plan already on screen.
    pub fn set_target(&self, target: u32) {
        self.view().target = target;
    }

    /// Request a plan for `target_calories` per day.
    pub async fn generate(&self, target_calories: u32) -> PlanOutcome {
        {
            let mut view = self.view();
            if view.phase == PlanPhase::Pending {
                tracing::debug!("Plan request ignored while pending");
                return PlanOutcome::Ignored;
            }
            view.phase = PlanPhase::Pending;
            view.target = target_calories;
            view.last_error = None;
        }

        tracing::info!("Requesting weekly plan for {} kcal/day", target_calories);
        let result = self.service.generate_plan(target_calories).await;

        let mut view = self.view();
        view.phase = PlanPhase::Ready;
        match result {
            Ok(plan) => {
                let days = plan.len();
                view.plan = Some(plan);
                PlanOutcome::Generated(days)
            }
            Err(e) => {
                tracing::error!("Failed to generate plan: {:#}", e);
                let message = user_message(&e);
                if self.policy == ErrorPolicy::Surface {
                    view.last_error = Some(message.clone());
                }
                PlanOutcome::Failed(message)
            }
        }
    }

    /// Current phase.
    pub fn phase(&self) -> PlanPhase {
        self.view().phase
    }

    /// True while a request is outstanding.
    pub fn is_pending(&self) -> bool {
        self.phase() == PlanPhase::Pending
    }

    /// Plan on screen, if any.
    pub fn plan(&self) -> Option<WeeklyPlan> {
        self.view().plan.clone()
    }

    /// Message of the last failure, kept only under [`ErrorPolicy::Surface`].
    pub fn last_error(&self) -> Option<String> {
        self.view().last_error.clone()
    }
}
