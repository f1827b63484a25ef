//! Common operations layer for the Procura CLI.
//!
//! Wraps [`procura_client::ProcuraClient`] with configuration management and
//! owns one sync client per backend collection, so callers get the
//! reconcile-then-upsert-then-refetch flows without wiring them up.

mod config;
mod credentials;
mod error;
mod files;

pub use config::{DEFAULT_ENDPOINT, OpsConfig};
pub use error::OpsError;
pub use files::load_staged;

use std::path::PathBuf;
use std::sync::Arc;

use procura_client::{
    CatalogSync, CityCache, LinkingSync, ProcuraClient, SessionStore, UserSync,
};
use procura_core::{AttachmentSet, Company, Registration, Session};
use tracing::info;

use crate::credentials::OpsCredentials;

/// Re-export client and core types for consumers.
pub use procura_client;
pub use procura_core;

/// High-level operations client for the marketplace backend.
///
/// Holds the HTTP client, the signed-in session (if any) and the
/// collection state for catalog, staff, linkings and cities.
#[derive(Debug)]
pub struct OpsClient {
    client: ProcuraClient,
    session: Arc<SessionStore>,
    catalog: CatalogSync,
    users: UserSync,
    linkings: LinkingSync,
    cities: CityCache,
}

impl OpsClient {
    /// Create a new operations client from configuration.
    pub fn from_config(config: &OpsConfig) -> Result<Self, OpsError> {
        let session = Arc::new(SessionStore::new());
        let credentials = OpsCredentials::new(config.access_token.clone(), Arc::clone(&session));

        let mut builder =
            ProcuraClient::builder(&config.endpoint).credentials(Arc::new(credentials));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| OpsError::Configuration(e.to_string()))?;

        Ok(Self {
            catalog: CatalogSync::new(client.clone()),
            users: UserSync::new(client.clone()),
            linkings: LinkingSync::new(client.clone()),
            cities: CityCache::new(client.clone()),
            client,
            session,
        })
    }

    /// Access the underlying HTTP client directly.
    ///
    /// Use this when you need to call a specific client method that
    /// is not wrapped by the ops layer.
    pub fn client(&self) -> &ProcuraClient {
        &self.client
    }

    /// The current session, if [`login`](Self::login) or
    /// [`register`](Self::register) succeeded.
    pub fn session(&self) -> Option<Session> {
        self.session.session()
    }

    /// Sign in; later calls use the returned session's token.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, OpsError> {
        let session = self.client.login(email, password).await?;
        self.session.set(session.clone());
        Ok(session)
    }

    /// Register a company with its owner and sign in as the owner.
    pub async fn register(&self, registration: &Registration) -> Result<Session, OpsError> {
        let session = self.client.register(registration).await?;
        self.session.set(session.clone());
        Ok(session)
    }

    /// Forget the signed-in session.
    pub fn logout(&self) {
        self.session.clear();
        info!("signed out");
    }

    pub fn catalog(&mut self) -> &mut CatalogSync {
        &mut self.catalog
    }

    pub fn users(&mut self) -> &mut UserSync {
        &mut self.users
    }

    pub fn linkings(&mut self) -> &mut LinkingSync {
        &mut self.linkings
    }

    pub fn cities(&mut self) -> &mut CityCache {
        &mut self.cities
    }

    /// Fetch company details. Defaults to the signed-in user's company.
    pub async fn company(&self, company_id: Option<i64>) -> Result<Company, OpsError> {
        let company_id = company_id
            .or_else(|| self.session().and_then(|s| s.user.company_id))
            .ok_or_else(|| OpsError::Configuration("no company id given".into()))?;
        Ok(self.client.get_company(company_id).await?)
    }

    /// Build a picture set for a new catalog item from local files.
    pub async fn new_pictures(&self, files: &[PathBuf]) -> Result<AttachmentSet, OpsError> {
        let mut pictures = AttachmentSet::new();
        for path in files {
            pictures.push(load_staged(path).await?);
        }
        Ok(pictures)
    }

    /// Start from an item's current pictures, drop `remove`, and append `add`.
    ///
    /// The catalog is fetched first if the item is not known locally.
    pub async fn edit_pictures(
        &mut self,
        product_id: &str,
        add: &[PathBuf],
        remove: &[String],
    ) -> Result<AttachmentSet, OpsError> {
        if self.catalog.find(product_id).is_none() {
            self.catalog.fetch().await?;
        }
        let mut pictures = self
            .catalog
            .edit_pictures(product_id)
            .ok_or_else(|| OpsError::NotFound(format!("product {product_id}")))?;

        for reference in remove {
            if !pictures.remove_reference(reference) {
                return Err(OpsError::NotFound(format!(
                    "picture {reference} on product {product_id}"
                )));
            }
        }
        for path in add {
            pictures.push(load_staged(path).await?);
        }
        Ok(pictures)
    }
}
