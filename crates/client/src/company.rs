use procura_core::Company;
use tracing::instrument;

use crate::{Error, FailureKind, ProcuraClient, ensure_success, read_json, send};

impl ProcuraClient {
    /// Fetch a company's details.
    #[instrument(skip(self))]
    pub async fn get_company(&self, company_id: i64) -> Result<Company, Error> {
        let url = self.url("/company/get-company");
        let req = self
            .client
            .get(&url)
            .query(&[("company_id", company_id)]);
        let response = send(self.authorize(req)?).await?;
        let response = ensure_success(
            response,
            "Failed to fetch company details",
            FailureKind::Request,
        )
        .await?;
        read_json(response).await
    }
}
