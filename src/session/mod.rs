//! Client-side session persistence
//!
//! The [`SessionStore`] is the only component allowed to touch the
//! persisted `token` and `username` entries. It is built once at startup
//! from configuration, read by the shell to decide what to show, written by
//! the sign-in path, and cleared on sign-out.

pub mod backend;

pub use backend::{FileBackend, KeyringBackend, MemoryBackend, SessionBackend};

use serde::{Deserialize, Serialize};

use crate::config::{SessionBackendKind, SessionConfig};
use crate::error::{Result, SmartMealError};

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Storage key for the display identity.
pub const IDENTITY_KEY: &str = "username";

/// Record that a user has successfully signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Name the user signed in with
    pub identity: String,
    /// Token returned by the credential exchange
    pub credential_token: String,
}

impl Session {
    /// Create a session record.
    pub fn new(identity: impl Into<String>, credential_token: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            credential_token: credential_token.into(),
        }
    }
}

/// Read/write/clear access to the persisted session.
///
/// # Examples
///
/// ```
/// use smartmeal::session::SessionStore;
///
/// let store = SessionStore::in_memory();
/// store.save("alice", "tok-abc").unwrap();
/// assert_eq!(store.load().unwrap().as_deref(), Some("alice"));
///
/// store.clear().unwrap();
/// assert!(store.load().unwrap().is_none());
/// ```
pub struct SessionStore {
    backend: Box<dyn SessionBackend>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Wrap an arbitrary backend.
    pub fn new(backend: Box<dyn SessionBackend>) -> Self {
        Self { backend }
    }

    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    /// Build the store selected by configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the file backend has no explicit path and the
    /// platform data directory cannot be determined.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let backend: Box<dyn SessionBackend> = match config.backend {
            SessionBackendKind::File => match &config.path {
                Some(path) => Box::new(FileBackend::with_path(path)),
                None => Box::new(FileBackend::new()?),
            },
            SessionBackendKind::Keyring => Box::new(KeyringBackend),
            SessionBackendKind::Memory => Box::new(MemoryBackend::new()),
        };
        tracing::debug!("Session store backend: {:?}", config.backend);
        Ok(Self::new(backend))
    }

    /// Persist a signed-in identity and its token.
    ///
    /// Token contents are not inspected; any non-empty string is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`SmartMealError::Session`] if either value is empty, or the
    /// backend's error if the write fails. On a failed write the previous
    /// entries are put back, so a stored session never pairs one user's
    /// token with another user's name.
    pub fn save(&self, identity: &str, token: &str) -> Result<()> {
        if identity.is_empty() {
            return Err(SmartMealError::Session("identity must not be empty".to_string()).into());
        }
        if token.is_empty() {
            return Err(SmartMealError::Session("token must not be empty".to_string()).into());
        }

        let previous = [
            (TOKEN_KEY, self.backend.get(TOKEN_KEY)?),
            (IDENTITY_KEY, self.backend.get(IDENTITY_KEY)?),
        ];
        if let Err(e) = self
            .backend
            .set_many(&[(TOKEN_KEY, token), (IDENTITY_KEY, identity)])
        {
            self.restore(&previous);
            return Err(e);
        }
        tracing::info!("Saved session for {}", identity);
        Ok(())
    }

    fn restore(&self, previous: &[(&str, Option<String>)]) {
        for (key, value) in previous {
            let restored = match value {
                Some(value) => self.backend.set(key, value),
                None => self.backend.remove(key),
            };
            if let Err(e) = restored {
                tracing::warn!("Failed to restore session entry {}: {:#}", key, e);
            }
        }
    }

    /// The saved identity, if any.
    pub fn load(&self) -> Result<Option<String>> {
        self.backend.get(IDENTITY_KEY)
    }

    /// The saved identity and token, when both are present.
    pub fn load_session(&self) -> Result<Option<Session>> {
        let identity = self.backend.get(IDENTITY_KEY)?;
        let token = self.backend.get(TOKEN_KEY)?;
        Ok(match (identity, token) {
            (Some(identity), Some(token)) => Some(Session::new(identity, token)),
            _ => None,
        })
    }

    /// Remove both entries. Clearing an empty store is a no-op.
    ///
    /// The identity goes first: should the token removal then fail, what is
    /// left is a token with no name, which no longer reads as a session.
    pub fn clear(&self) -> Result<()> {
        self.backend.remove_many(&[IDENTITY_KEY, TOKEN_KEY])?;
        tracing::info!("Cleared session");
        Ok(())
    }
}
