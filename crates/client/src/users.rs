use procura_core::{CompanyUser, CompanyUserPatch, NewCompanyUser};
use tracing::{info, instrument};

use crate::state::CollectionState;
use crate::{
    Error, FailureKind, ProcuraClient, encode_segment, ensure_success, list_field, read_json, send,
};

impl ProcuraClient {
    /// List the staff of the caller's company.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<CompanyUser>, Error> {
        let url = self.url("/user");
        let response = send(self.authorize(self.client.get(&url))?).await?;
        let response = ensure_success(response, "Failed to fetch users", FailureKind::Request).await?;
        let body: serde_json::Value = read_json(response).await?;
        list_field(body, "users")
    }

    /// Add a staff member.
    #[instrument(skip(self, user), fields(email = %user.email, role = %user.role))]
    pub async fn add_user(&self, user: &NewCompanyUser) -> Result<(), Error> {
        let url = self.url("/user/");
        let response = send(self.authorize(self.client.post(&url).json(user))?).await?;
        ensure_success(response, "Failed to add user", FailureKind::Upsert).await?;
        Ok(())
    }

    /// Apply a partial update to a staff member.
    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, user_id: &str, patch: &CompanyUserPatch) -> Result<(), Error> {
        let url = self.url(&format!("/user/{}", encode_segment(user_id)));
        let response = send(self.authorize(self.client.patch(&url).json(patch))?).await?;
        ensure_success(response, "Failed to update user", FailureKind::Upsert).await?;
        Ok(())
    }
}

/// Staff collection with refetch-after-mutation.
#[derive(Debug)]
pub struct UserSync {
    client: ProcuraClient,
    state: CollectionState<CompanyUser>,
}

impl UserSync {
    pub fn new(client: ProcuraClient) -> Self {
        Self {
            client,
            state: CollectionState::new(),
        }
    }

    pub fn state(&self) -> &CollectionState<CompanyUser> {
        &self.state
    }

    pub fn users(&self) -> &[CompanyUser] {
        self.state.items()
    }

    /// Refetch the staff list.
    pub async fn fetch(&mut self) -> Result<(), Error> {
        self.state.begin();
        let result = self.refresh().await;
        self.state.settle(result)
    }

    /// Add a staff member. The dashboard always registers staff with locale `en`.
    pub async fn add(&mut self, mut user: NewCompanyUser) -> Result<(), Error> {
        "en".clone_into(&mut user.locale);
        self.state.begin();
        let result = async {
            self.client.add_user(&user).await?;
            info!(email = %user.email, "user added");
            self.refresh().await
        }
        .await;
        self.state.settle(result)
    }

    /// Update a staff member.
    pub async fn update(&mut self, user_id: &str, patch: &CompanyUserPatch) -> Result<(), Error> {
        self.state.begin();
        let result = async {
            self.client.update_user(user_id, patch).await?;
            info!(user_id, "user updated");
            self.refresh().await
        }
        .await;
        self.state.settle(result)
    }

    async fn refresh(&mut self) -> Result<(), Error> {
        let users = self.client.list_users().await?;
        self.state.replace(users);
        Ok(())
    }
}
