use procura_core::{Linking, LinkingResponse};
use tracing::{info, instrument};

use crate::state::CollectionState;
use crate::{Error, FailureKind, ProcuraClient, ensure_success, list_field, read_json, send};

impl ProcuraClient {
    /// List linkings involving the caller's company.
    #[instrument(skip(self))]
    pub async fn list_linkings(&self) -> Result<Vec<Linking>, Error> {
        let url = self.url("/linkings/");
        let response = send(self.authorize(self.client.get(&url))?).await?;
        let response =
            ensure_success(response, "Failed to fetch linkings", FailureKind::Request).await?;
        let body: serde_json::Value = read_json(response).await?;
        list_field(body, "linkings")
    }

    /// Record the supplier's answer to a linking request.
    #[instrument(skip(self))]
    pub async fn respond_to_linking(
        &self,
        linking_id: i64,
        response: LinkingResponse,
    ) -> Result<(), Error> {
        let url = self.url(&format!("/linkings/supplier_response/{linking_id}"));
        let req = self
            .client
            .patch(&url)
            .query(&[("status", response.as_str())]);
        let resp = send(self.authorize(req)?).await?;
        ensure_success(resp, "Failed to update linking", FailureKind::Upsert).await?;
        Ok(())
    }
}

/// Linking collection with refetch-after-mutation.
#[derive(Debug)]
pub struct LinkingSync {
    client: ProcuraClient,
    state: CollectionState<Linking>,
}

impl LinkingSync {
    pub fn new(client: ProcuraClient) -> Self {
        Self {
            client,
            state: CollectionState::new(),
        }
    }

    pub fn state(&self) -> &CollectionState<Linking> {
        &self.state
    }

    pub fn linkings(&self) -> &[Linking] {
        self.state.items()
    }

    /// Refetch all linkings.
    pub async fn fetch(&mut self) -> Result<(), Error> {
        self.state.begin();
        let result = self.refresh().await;
        self.state.settle(result)
    }

    /// Answer a linking request, then refetch.
    pub async fn respond(&mut self, linking_id: i64, response: LinkingResponse) -> Result<(), Error> {
        self.state.begin();
        let result = async {
            self.client.respond_to_linking(linking_id, response).await?;
            info!(linking_id, %response, "linking answered");
            self.refresh().await
        }
        .await;
        self.state.settle(result)
    }

    async fn refresh(&mut self) -> Result<(), Error> {
        let linkings = self.client.list_linkings().await?;
        self.state.replace(linkings);
        Ok(())
    }
}
