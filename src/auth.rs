//! Sign-in and sign-up form
//!
//! The [`AuthController`] holds the form fields, the current intent and a
//! single message line. The message shows the most recent failure (or the
//! account-created notice) and is cleared whenever the intent is toggled or
//! a new submission starts.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{user_message, GENERIC_FAILURE_MESSAGE};
use crate::service::{AuthIntent, AuthOutcome, MealService};
use crate::session::SessionStore;

/// Notice shown after a successful sign-up.
pub const ACCOUNT_CREATED_MESSAGE: &str = "Account created! Please log in.";

/// Whether a submission is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    /// Form accepts edits and submissions
    #[default]
    Editing,
    /// Waiting for the service; submissions are ignored
    Pending,
}

/// What a call to [`AuthController::submit`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// Session saved for this identity
    SignedIn(String),
    /// Account created; intent is now sign-in
    AccountCreated,
    /// Submission failed; the message line holds the reason
    Failed(String),
    /// A submission was already pending
    Ignored,
}

#[derive(Debug)]
struct AuthForm {
    intent: AuthIntent,
    identity: String,
    secret: String,
    goal: u32,
    phase: AuthPhase,
    message: Option<String>,
}

/// Controller for the authentication form.
pub struct AuthController {
    service: Arc<dyn MealService>,
    session: Arc<SessionStore>,
    form: Mutex<AuthForm>,
}

impl AuthController {
    /// Empty form in sign-in mode with the goal preset to `default_goal`.
    pub fn new(service: Arc<dyn MealService>, session: Arc<SessionStore>, default_goal: u32) -> Self {
        Self {
            service,
            session,
            form: Mutex::new(AuthForm {
                intent: AuthIntent::SignIn,
                identity: String::new(),
                secret: String::new(),
                goal: default_goal,
                phase: AuthPhase::Editing,
                message: None,
            }),
        }
    }

    fn form(&self) -> MutexGuard<'_, AuthForm> {
        self.form.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current intent.
    pub fn intent(&self) -> AuthIntent {
        self.form().intent
    }

    /// Switch between sign-in and sign-up; clears the message line.
    pub fn toggle_intent(&self) -> AuthIntent {
        let mut form = self.form();
        form.intent = form.intent.toggled();
        form.message = None;
        form.intent
    }

    /// Set the account name field.
    pub fn set_identity(&self, identity: impl Into<String>) {
        self.form().identity = identity.into();
    }

    /// Set the password field.
    pub fn set_secret(&self, secret: impl Into<String>) {
        self.form().secret = secret.into();
    }

    /// Set the sign-up goal field.
    pub fn set_goal(&self, goal: u32) {
        self.form().goal = goal;
    }

    /// Current sign-up goal field.
    pub fn goal(&self) -> u32 {
        self.form().goal
    }

    /// Current phase.
    pub fn phase(&self) -> AuthPhase {
        self.form().phase
    }

    /// The message line, if anything is shown.
    pub fn message(&self) -> Option<String> {
        self.form().message.clone()
    }

    /// Submit the form with the current intent.
    ///
    /// A sign-in persists the returned session. A sign-up never does: it
    /// flips the intent back to sign-in and asks the user to log in.
    pub async fn submit(&self) -> AuthEvent {
        let (intent, identity, secret, goal) = {
            let mut form = self.form();
            if form.phase == AuthPhase::Pending {
                tracing::debug!("Auth submission ignored while pending");
                return AuthEvent::Ignored;
            }
            form.phase = AuthPhase::Pending;
            form.message = None;
            (
                form.intent,
                form.identity.clone(),
                form.secret.clone(),
                form.goal,
            )
        };

        let goal_metric = match intent {
            AuthIntent::SignIn => None,
            AuthIntent::SignUp => Some(goal),
        };
        tracing::info!("Submitting {} for {}", intent, identity);
        let result = self
            .service
            .authenticate(&identity, &secret, intent, goal_metric)
            .await;

        let event = match (intent, result) {
            (AuthIntent::SignIn, Ok(AuthOutcome::Session(session))) => {
                match self.session.save(&identity, &session.credential_token) {
                    Ok(()) => AuthEvent::SignedIn(identity),
                    Err(e) => {
                        tracing::error!("Failed to persist session: {:#}", e);
                        AuthEvent::Failed(user_message(&e))
                    }
                }
            }
            (AuthIntent::SignIn, Ok(AuthOutcome::Confirmation { .. })) => {
                tracing::error!("Sign-in returned a confirmation instead of a token");
                AuthEvent::Failed(GENERIC_FAILURE_MESSAGE.to_string())
            }
            (AuthIntent::SignUp, Ok(_)) => AuthEvent::AccountCreated,
            (_, Err(e)) => {
                tracing::warn!("{} failed: {:#}", intent, e);
                AuthEvent::Failed(user_message(&e))
            }
        };

        let mut form = self.form();
        form.phase = AuthPhase::Editing;
        match &event {
            AuthEvent::SignedIn(_) => form.secret.clear(),
            AuthEvent::AccountCreated => {
                form.intent = AuthIntent::SignIn;
                form.message = Some(ACCOUNT_CREATED_MESSAGE.to_string());
            }
            AuthEvent::Failed(message) => form.message = Some(message.clone()),
            AuthEvent::Ignored => {}
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fake::{FakeCall, FakeMealService};
    use crate::session::Session;

    fn setup() -> (Arc<FakeMealService>, Arc<SessionStore>, AuthController) {
        let fake = Arc::new(FakeMealService::new());
        let store = Arc::new(SessionStore::in_memory());
        let auth = AuthController::new(fake.clone(), store.clone(), 2000);
        (fake, store, auth)
    }

    #[tokio::test]
    async fn test_sign_in_persists_session() {
        let (fake, store, auth) = setup();
        fake.push_auth(Ok(AuthOutcome::Session(Session::new("alice", "tok-abc"))));
        auth.set_identity("alice");
        auth.set_secret("pw123");

        let event = auth.submit().await;

        assert_eq!(event, AuthEvent::SignedIn("alice".to_string()));
        assert_eq!(store.load().unwrap().as_deref(), Some("alice"));
        assert_eq!(
            store.load_session().unwrap(),
            Some(Session::new("alice", "tok-abc"))
        );
        assert_eq!(auth.phase(), AuthPhase::Editing);
        assert_eq!(
            fake.calls(),
            vec![FakeCall::Authenticate {
                identity: "alice".to_string(),
                intent: AuthIntent::SignIn,
                goal_metric: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_sign_in_failure_shows_detail() {
        let (fake, store, auth) = setup();
        fake.push_auth(Err("Incorrect username or password".to_string()));
        auth.set_identity("alice");
        auth.set_secret("wrong");

        let event = auth.submit().await;

        assert_eq!(
            event,
            AuthEvent::Failed("Incorrect username or password".to_string())
        );
        assert_eq!(
            auth.message().as_deref(),
            Some("Incorrect username or password")
        );
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(auth.phase(), AuthPhase::Editing);
    }

    #[tokio::test]
    async fn test_sign_up_success_switches_to_sign_in_without_session() {
        let (fake, store, auth) = setup();
        fake.push_auth(Ok(AuthOutcome::Confirmation {
            identity: "bob".to_string(),
        }));
        auth.toggle_intent();
        auth.set_identity("bob");
        auth.set_secret("secret");
        auth.set_goal(1800);

        let event = auth.submit().await;

        assert_eq!(event, AuthEvent::AccountCreated);
        assert_eq!(auth.intent(), AuthIntent::SignIn);
        assert_eq!(auth.message().as_deref(), Some(ACCOUNT_CREATED_MESSAGE));
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(
            fake.calls(),
            vec![FakeCall::Authenticate {
                identity: "bob".to_string(),
                intent: AuthIntent::SignUp,
                goal_metric: Some(1800),
            }]
        );
    }

    #[tokio::test]
    async fn test_sign_up_never_persists_even_if_service_returns_token() {
        let (fake, store, auth) = setup();
        fake.push_auth(Ok(AuthOutcome::Session(Session::new("bob", "tok"))));
        auth.toggle_intent();
        auth.set_identity("bob");

        assert_eq!(auth.submit().await, AuthEvent::AccountCreated);
        assert_eq!(store.load_session().unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_up_failure_keeps_intent_and_returns_to_editing() {
        let (fake, store, auth) = setup();
        fake.push_auth(Err("Username already taken".to_string()));
        auth.toggle_intent();
        auth.set_identity("bob");

        let event = auth.submit().await;

        assert_eq!(event, AuthEvent::Failed("Username already taken".to_string()));
        assert_eq!(auth.intent(), AuthIntent::SignUp);
        assert_eq!(auth.phase(), AuthPhase::Editing);
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_toggle_clears_message() {
        let (fake, _store, auth) = setup();
        fake.push_auth(Err("nope".to_string()));
        auth.submit().await;
        assert!(auth.message().is_some());

        assert_eq!(auth.toggle_intent(), AuthIntent::SignUp);
        assert_eq!(auth.message(), None);
    }

    #[tokio::test]
    async fn test_unscripted_failure_uses_service_message() {
        let (_fake, _store, auth) = setup();
        auth.set_identity("alice");
        let event = auth.submit().await;
        assert!(matches!(event, AuthEvent::Failed(_)));
    }

    #[tokio::test]
    async fn test_empty_token_from_service_is_not_saved() {
        let (fake, store, auth) = setup();
        fake.push_auth(Ok(AuthOutcome::Session(Session::new("alice", ""))));
        auth.set_identity("alice");

        let event = auth.submit().await;

        assert_eq!(event, AuthEvent::Failed(GENERIC_FAILURE_MESSAGE.to_string()));
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_submission_ignored_while_pending() {
        let (fake, gate) = FakeMealService::gated();
        let fake = Arc::new(fake);
        fake.push_auth(Ok(AuthOutcome::Session(Session::new("alice", "tok"))));
        let store = Arc::new(SessionStore::in_memory());
        let auth = AuthController::new(fake.clone(), store, 2000);
        auth.set_identity("alice");

        let (first, second, _) = tokio::join!(
            auth.submit(),
            async {
                assert_eq!(auth.phase(), AuthPhase::Pending);
                auth.submit().await
            },
            async {
                tokio::task::yield_now().await;
                gate.release();
            }
        );

        assert_eq!(first, AuthEvent::SignedIn("alice".to_string()));
        assert_eq!(second, AuthEvent::Ignored);
        assert_eq!(fake.calls().len(), 1);
    }
}
