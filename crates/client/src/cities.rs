use procura_core::City;
use tracing::{debug, instrument};

use crate::{Error, FailureKind, ProcuraClient, ensure_success, read_json, send};

impl ProcuraClient {
    /// List all cities. This endpoint is public; no token is sent.
    #[instrument(skip(self))]
    pub async fn list_cities(&self) -> Result<Vec<City>, Error> {
        let url = self.url("/cities/get-all-cities");
        let response = send(self.client.get(&url)).await?;
        let response =
            ensure_success(response, "Error fetching cities", FailureKind::Request).await?;
        read_json(response).await
    }
}

/// City list fetched once and kept for the life of the cache.
#[derive(Debug)]
pub struct CityCache {
    client: ProcuraClient,
    cities: Vec<City>,
}

impl CityCache {
    pub fn new(client: ProcuraClient) -> Self {
        Self {
            client,
            cities: Vec::new(),
        }
    }

    /// Return the cities, fetching them on first use.
    ///
    /// An empty result is not cached, so the next call asks again.
    pub async fn get(&mut self) -> Result<&[City], Error> {
        if self.cities.is_empty() {
            self.cities = self.client.list_cities().await?;
        } else {
            debug!(count = self.cities.len(), "cities served from cache");
        }
        Ok(&self.cities)
    }

    /// Cities loaded so far, without fetching.
    pub fn cached(&self) -> &[City] {
        &self.cities
    }
}
