use std::fmt;
use std::sync::Arc;

use procura_client::{CredentialProvider, SessionStore};

/// Prefers a signed-in session; falls back to the configured token.
pub(crate) struct OpsCredentials {
    configured: Option<String>,
    session: Arc<SessionStore>,
}

impl OpsCredentials {
    pub(crate) fn new(configured: Option<String>, session: Arc<SessionStore>) -> Self {
        Self {
            configured,
            session,
        }
    }
}

impl fmt::Debug for OpsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpsCredentials")
            .field("configured", &self.configured.as_ref().map(|_| "[REDACTED]"))
            .field("signed_in", &self.session.is_authenticated())
            .finish()
    }
}

impl CredentialProvider for OpsCredentials {
    fn access_token(&self) -> Option<String> {
        self.session
            .access_token()
            .or_else(|| self.configured.clone())
    }
}
