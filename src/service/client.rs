//! HTTP implementation of [`MealService`]
//!
//! Endpoints (all relative to the configured base URL):
//!
//! | Operation        | Request                                              |
//! |------------------|------------------------------------------------------|
//! | sign in          | `POST login`, form `username`, `password`            |
//! | sign up          | `POST register`, JSON `username, password, calorie_goal` |
//! | classify image   | `POST analyze-food`, multipart part `file`           |
//! | generate plan    | `POST generate-plan`, JSON `target_calories`         |
//! | status           | `GET /`                                              |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::capture::CapturedFrame;
use crate::config::ServiceConfig;
use crate::error::{Result, SmartMealError, GENERIC_FAILURE_MESSAGE};
use crate::service::types::{CaptureResult, ServiceStatus, WeeklyPlan};
use crate::service::{AuthIntent, AuthOutcome, MealService, DEFAULT_CALORIE_GOAL};
use crate::session::{Session, SessionStore};

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    password: &'a str,
    calorie_goal: u32,
}

#[derive(Debug, Serialize)]
struct PlanRequest {
    target_calories: u32,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

/// `plan` is either the weekly plan or `{"error": "..."}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlanBody {
    Failed { error: String },
    Plan(WeeklyPlan),
}

#[derive(Debug, Deserialize)]
struct PlanResponse {
    plan: PlanBody,
}

/// Pick the message to show for a failed response body.
///
/// Uses the body's `detail` field when it is a non-empty string, the
/// generic fallback otherwise (including validation errors, where FastAPI
/// sends `detail` as a list).
pub(crate) fn detail_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("detail")
                .and_then(|detail| detail.as_str())
                .filter(|detail| !detail.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string())
}

/// reqwest-backed client for the SmartMeal service.
///
/// # Examples
///
/// ```
/// use smartmeal::config::ServiceConfig;
/// use smartmeal::service::ServiceClient;
///
/// let client = ServiceClient::new(&ServiceConfig::default()).unwrap();
/// assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8000/");
/// ```
pub struct ServiceClient {
    client: Client,
    base_url: Url,
    token_source: Option<Arc<SessionStore>>,
}

impl ServiceClient {
    /// Create a client from configuration.
    ///
    /// When `attach_token` is set, call [`ServiceClient::with_token_source`]
    /// to give the client access to the saved token.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL does not parse or the HTTP client
    /// cannot be built.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            SmartMealError::Config(format!("Invalid service URL {}: {}", config.base_url, e))
        })?;

        let mut builder = Client::builder().user_agent(concat!("smartmeal/", env!("CARGO_PKG_VERSION")));
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder
            .build()
            .map_err(|e| SmartMealError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized service client: base_url={}", base_url);

        Ok(Self {
            client,
            base_url,
            token_source: None,
        })
    }

    /// Send the saved token as `Authorization: Bearer` on scan and plan
    /// requests.
    pub fn with_token_source(mut self, store: Arc<SessionStore>) -> Self {
        self.token_source = Some(store);
        self
    }

    /// Base URL endpoints are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .token_source
            .as_ref()
            .and_then(|store| match store.load_session() {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!("Could not read session for bearer header: {}", e);
                    None
                }
            });
        match token {
            Some(session) => request.bearer_auth(session.credential_token),
            None => request,
        }
    }

    async fn send(&self, name: &str, request: RequestBuilder) -> Result<Response> {
        tracing::debug!("Sending {} request", name);

        let response = request.send().await.map_err(|e| {
            tracing::error!("{} request failed: {}", name, e);
            SmartMealError::Service(GENERIC_FAILURE_MESSAGE.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("{} returned error {}: {}", name, status, body);
            return Err(SmartMealError::Service(detail_message(&body)).into());
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(name: &str, response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to parse {} response: {}", name, e);
            SmartMealError::Service(GENERIC_FAILURE_MESSAGE.to_string()).into()
        })
    }

    async fn sign_in(&self, identity: &str, secret: &str) -> Result<AuthOutcome> {
        let request = self
            .client
            .post(self.endpoint("login")?)
            .form(&[("username", identity), ("password", secret)]);
        let response = self.send("login", request).await?;
        let token: TokenResponse = Self::decode("login", response).await?;

        if token.access_token.is_empty() {
            tracing::error!("login response carried an empty access_token");
            return Err(SmartMealError::Service(GENERIC_FAILURE_MESSAGE.to_string()).into());
        }
        tracing::info!(
            "Signed in as {} (token type {})",
            identity,
            token.token_type.as_deref().unwrap_or("unspecified")
        );

        Ok(AuthOutcome::Session(Session::new(identity, token.access_token)))
    }

    async fn sign_up(&self, identity: &str, secret: &str, goal: u32) -> Result<AuthOutcome> {
        let body = RegisterRequest {
            username: identity,
            password: secret,
            calorie_goal: goal,
        };
        let request = self.client.post(self.endpoint("register")?).json(&body);
        self.send("register", request).await?;
        tracing::info!("Registered {} with calorie goal {}", identity, goal);

        Ok(AuthOutcome::Confirmation {
            identity: identity.to_string(),
        })
    }
}

#[async_trait]
impl MealService for ServiceClient {
    async fn authenticate(
        &self,
        identity: &str,
        secret: &str,
        intent: AuthIntent,
        goal_metric: Option<u32>,
    ) -> Result<AuthOutcome> {
        match intent {
            AuthIntent::SignIn => self.sign_in(identity, secret).await,
            AuthIntent::SignUp => {
                let goal = goal_metric.unwrap_or(DEFAULT_CALORIE_GOAL);
                self.sign_up(identity, secret, goal).await
            }
        }
    }

    async fn classify_image(&self, frame: &CapturedFrame) -> Result<CaptureResult> {
        let part = reqwest::multipart::Part::bytes(frame.bytes.to_vec())
            .file_name(frame.file_name.clone())
            .mime_str(&frame.mime)
            .map_err(|e| SmartMealError::Capture(format!("Invalid frame MIME type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let request = self
            .authorize(self.client.post(self.endpoint("analyze-food")?))
            .multipart(form);
        let response = self.send("analyze-food", request).await?;
        Self::decode("analyze-food", response).await
    }

    async fn generate_plan(&self, target_calories: u32) -> Result<WeeklyPlan> {
        let request = self
            .authorize(self.client.post(self.endpoint("generate-plan")?))
            .json(&PlanRequest { target_calories });
        let response = self.send("generate-plan", request).await?;
        let body: PlanResponse = Self::decode("generate-plan", response).await?;

        match body.plan {
            PlanBody::Failed { error } => {
                tracing::error!("generate-plan returned error body: {}", error);
                Err(SmartMealError::Service(error).into())
            }
            PlanBody::Plan(plan) => {
                tracing::info!("Received plan with {} days", plan.len());
                Ok(plan)
            }
        }
    }

    async fn status(&self) -> Result<ServiceStatus> {
        let request = self.client.get(self.base_url.clone());
        let response = self.send("status", request).await?;
        Self::decode("status", response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_message_uses_string_detail() {
        assert_eq!(
            detail_message(r#"{"detail": "Incorrect username or password"}"#),
            "Incorrect username or password"
        );
    }

    #[test]
    fn test_detail_message_falls_back() {
        assert_eq!(detail_message(""), GENERIC_FAILURE_MESSAGE);
        assert_eq!(detail_message("<html>502</html>"), GENERIC_FAILURE_MESSAGE);
        assert_eq!(detail_message(r#"{"detail": ""}"#), GENERIC_FAILURE_MESSAGE);
        assert_eq!(
            detail_message(r#"{"detail": [{"loc": ["body", "username"], "msg": "field required"}]}"#),
            GENERIC_FAILURE_MESSAGE
        );
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let config = ServiceConfig {
            base_url: "http://localhost:8000/api".to_string(),
            ..ServiceConfig::default()
        };
        let client = ServiceClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("login").unwrap().as_str(),
            "http://localhost:8000/api/login"
        );
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let config = ServiceConfig {
            base_url: "::nope::".to_string(),
            ..ServiceConfig::default()
        };
        assert!(ServiceClient::new(&config).is_err());
    }
}
