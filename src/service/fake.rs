//! In-process fake service for controller and shell tests
//!
//! [`FakeMealService`] replays scripted replies in FIFO order per operation
//! and records every call it receives. A scripted `Err(message)` is returned
//! as [`SmartMealError::Service`], the same shape the HTTP client produces.
//!
//! Build it with [`FakeMealService::gated`] to hold every request until the
//! test calls [`FakeGate::release`]; that is how tests observe controllers
//! while a request is in flight.
//!
//! # Example
//!
//! ```
//! use smartmeal::service::fake::{FakeCall, FakeMealService};
//! use smartmeal::service::MealService;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let fake = FakeMealService::new();
//! fake.push_plan(Err("Not enough data".to_string()));
//!
//! let err = fake.generate_plan(2000).await.unwrap_err();
//! assert!(err.to_string().contains("Not enough data"));
//! assert_eq!(fake.calls(), vec![FakeCall::GeneratePlan { target_calories: 2000 }]);
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::capture::CapturedFrame;
use crate::error::{Result, SmartMealError};
use crate::service::types::{CaptureResult, ServiceStatus, WeeklyPlan};
use crate::service::{AuthIntent, AuthOutcome, MealService};

/// Scripted reply: a value, or the message of a service error.
pub type FakeReply<T> = std::result::Result<T, String>;

/// A call received by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Authenticate {
        identity: String,
        intent: AuthIntent,
        goal_metric: Option<u32>,
    },
    ClassifyImage {
        mime: String,
        size: usize,
    },
    GeneratePlan {
        target_calories: u32,
    },
    Status,
}

#[derive(Default)]
struct Script {
    auth: VecDeque<FakeReply<AuthOutcome>>,
    classify: VecDeque<FakeReply<CaptureResult>>,
    plan: VecDeque<FakeReply<WeeklyPlan>>,
    status: VecDeque<FakeReply<ServiceStatus>>,
    calls: Vec<FakeCall>,
}

/// Releases requests held by a gated [`FakeMealService`].
#[derive(Debug, Clone)]
pub struct FakeGate {
    semaphore: Arc<Semaphore>,
}

impl FakeGate {
    /// Let one held request complete.
    pub fn release(&self) {
        self.semaphore.add_permits(1);
    }
}

/// Scripted [`MealService`].
#[derive(Default)]
pub struct FakeMealService {
    script: Mutex<Script>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeMealService {
    /// Fake that answers immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fake whose requests wait for [`FakeGate::release`].
    pub fn gated() -> (Self, FakeGate) {
        let semaphore = Arc::new(Semaphore::new(0));
        let fake = Self {
            script: Mutex::new(Script::default()),
            gate: Some(semaphore.clone()),
        };
        (fake, FakeGate { semaphore })
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a reply for `authenticate`.
    pub fn push_auth(&self, reply: FakeReply<AuthOutcome>) {
        self.script().auth.push_back(reply);
    }

    /// Queue a reply for `classify_image`.
    pub fn push_classification(&self, reply: FakeReply<CaptureResult>) {
        self.script().classify.push_back(reply);
    }

    /// Queue a reply for `generate_plan`.
    pub fn push_plan(&self, reply: FakeReply<WeeklyPlan>) {
        self.script().plan.push_back(reply);
    }

    /// Queue a reply for `status`.
    pub fn push_status(&self, reply: FakeReply<ServiceStatus>) {
        self.script().status.push_back(reply);
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<FakeCall> {
        self.script().calls.clone()
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => tracing::warn!("Fake gate closed"),
            }
        }
    }

    fn reply<T>(name: &str, reply: Option<FakeReply<T>>) -> Result<T> {
        match reply {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(SmartMealError::Service(message).into()),
            None => Err(SmartMealError::Service(format!("no scripted reply for {}", name)).into()),
        }
    }
}

#[async_trait]
impl MealService for FakeMealService {
    async fn authenticate(
        &self,
        identity: &str,
        _secret: &str,
        intent: AuthIntent,
        goal_metric: Option<u32>,
    ) -> Result<AuthOutcome> {
        let reply = {
            let mut script = self.script();
            script.calls.push(FakeCall::Authenticate {
                identity: identity.to_string(),
                intent,
                goal_metric,
            });
            script.auth.pop_front()
        };
        self.wait_for_gate().await;
        Self::reply("authenticate", reply)
    }

    async fn classify_image(&self, frame: &CapturedFrame) -> Result<CaptureResult> {
        let reply = {
            let mut script = self.script();
            script.calls.push(FakeCall::ClassifyImage {
                mime: frame.mime.clone(),
                size: frame.bytes.len(),
            });
            script.classify.pop_front()
        };
        self.wait_for_gate().await;
        Self::reply("classify_image", reply)
    }

    async fn generate_plan(&self, target_calories: u32) -> Result<WeeklyPlan> {
        let reply = {
            let mut script = self.script();
            script.calls.push(FakeCall::GeneratePlan { target_calories });
            script.plan.pop_front()
        };
        self.wait_for_gate().await;
        Self::reply("generate_plan", reply)
    }

    async fn status(&self) -> Result<ServiceStatus> {
        let reply = {
            let mut script = self.script();
            script.calls.push(FakeCall::Status);
            script.status.pop_front()
        };
        self.wait_for_gate().await;
        Self::reply("status", reply)
    }
}
