//! Top-level client shell
//!
//! [`Shell`] wires the session store and the meal service into the three
//! controllers and answers the questions the surface asks at startup: who is
//! signed in, and what greeting to show.

use std::sync::Arc;

use crate::auth::AuthController;
use crate::capture::CaptureController;
use crate::config::{Config, UiConfig};
use crate::error::Result;
use crate::planner::PlanController;
use crate::service::types::ServiceStatus;
use crate::service::{MealService, ServiceClient};
use crate::session::SessionStore;

/// Hint shown instead of a greeting when nobody is signed in.
pub const SIGNED_OUT_HINT: &str = "Not signed in. Use /login <username> to sign in.";

/// Session, service and controllers for one client process.
pub struct Shell {
    session: Arc<SessionStore>,
    service: Arc<dyn MealService>,
    auth: AuthController,
    capture: CaptureController,
    planner: PlanController,
}

impl Shell {
    /// Assemble a shell around an existing service and session store.
    pub fn new(service: Arc<dyn MealService>, session: Arc<SessionStore>, ui: &UiConfig) -> Self {
        let auth = AuthController::new(service.clone(), session.clone(), ui.default_calorie_goal);
        let capture = CaptureController::new(service.clone(), ui.capture_errors);
        let planner = PlanController::new(service.clone(), ui.plan_errors, ui.default_calorie_target);
        Self {
            session,
            service,
            auth,
            capture,
            planner,
        }
    }

    /// Build the HTTP client and session store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the service URL is invalid or the session backend
    /// cannot be opened.
    pub fn from_config(config: &Config) -> Result<Self> {
        let session = Arc::new(SessionStore::from_config(&config.session)?);
        let mut client = ServiceClient::new(&config.service)?;
        if config.service.attach_token {
            tracing::debug!("Bearer token will be attached to scan and plan requests");
            client = client.with_token_source(session.clone());
        }
        Ok(Self::new(Arc::new(client), session, &config.ui))
    }

    /// Identity of the saved session, if any.
    pub fn identity(&self) -> Result<Option<String>> {
        self.session.load()
    }

    /// `Hello, <identity>` when signed in, the sign-in hint otherwise.
    pub fn greeting(&self) -> Result<String> {
        Ok(match self.identity()? {
            Some(identity) => format!("Hello, {}", identity),
            None => SIGNED_OUT_HINT.to_string(),
        })
    }

    /// Forget the saved session.
    pub fn sign_out(&self) -> Result<()> {
        self.session.clear()
    }

    /// Ask the service whether it is up.
    pub async fn service_status(&self) -> Result<ServiceStatus> {
        self.service.status().await
    }

    /// Sign-in and sign-up form controller.
    pub fn auth(&self) -> &AuthController {
        &self.auth
    }

    /// Food scan controller.
    pub fn capture(&self) -> &CaptureController {
        &self.capture
    }

    /// Weekly plan controller.
    pub fn planner(&self) -> &PlanController {
        &self.planner
    }

    /// Session store shared with the service client.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }
}
