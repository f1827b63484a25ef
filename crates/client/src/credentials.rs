//! Credential providers.
//!
//! The client never owns the session: it asks an injected
//! [`CredentialProvider`] for the current bearer token on every request.

use std::fmt;
use std::sync::RwLock;

use procura_core::Session;

/// Supplies the bearer token attached to authenticated requests.
pub trait CredentialProvider: Send + Sync {
    /// The current access token, or `None` if the caller is signed out.
    fn access_token(&self) -> Option<String>;
}

/// A fixed token, e.g. from configuration or the environment.
#[derive(Clone)]
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    /// Create a provider that always returns `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl CredentialProvider for StaticCredentials {
    fn access_token(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

/// Holds the session returned by login or registration.
#[derive(Debug, Default)]
pub struct SessionStore {
    session: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Create a signed-out store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current session.
    pub fn set(&self, session: Session) {
        let mut guard = self
            .session
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Some(session);
    }

    /// Sign out.
    pub fn clear(&self) {
        let mut guard = self
            .session
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = None;
    }

    /// A copy of the current session, if signed in.
    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Returns `true` if a session is present.
    pub fn is_authenticated(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_some()
    }
}

impl CredentialProvider for SessionStore {
    fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .as_ref()
            .map(|s| s.access_token.clone())
    }
}
