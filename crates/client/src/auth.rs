use procura_core::{Registration, Session};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{Error, FailureKind, ProcuraClient, ensure_success, read_json, send};

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

impl ProcuraClient {
    /// Exchange email and password for a session.
    ///
    /// The returned session is not stored anywhere; hand it to a
    /// [`SessionStore`](crate::SessionStore) to use it for later calls.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, Error> {
        let url = self.url("/auth/login");
        let response = send(
            self.client
                .post(&url)
                .json(&LoginRequest { email, password }),
        )
        .await?;
        let response = ensure_success(response, "Login failed", FailureKind::Request).await?;
        let session: Session = read_json(response).await?;
        info!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    /// Register a company together with its owner and sign in as the owner.
    #[instrument(skip(self, registration), fields(company = %registration.company.name))]
    pub async fn register(&self, registration: &Registration) -> Result<Session, Error> {
        let url = self.url("/auth/register");
        let response = send(self.client.post(&url).json(registration)).await?;
        let response = ensure_success(response, "Registration failed", FailureKind::Upsert).await?;
        let session: Session = read_json(response).await?;
        info!(user_id = %session.user.id, "company registered");
        Ok(session)
    }
}
