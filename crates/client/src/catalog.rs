use procura_core::{AttachmentSet, CatalogItem, CatalogItemFields};
use serde::Serialize;
use tracing::{info, instrument};

use crate::reconcile::reconcile;
use crate::state::CollectionState;
use crate::{
    Error, FailureKind, ProcuraClient, encode_segment, ensure_success, list_field, read_json, send,
};

/// Body of a product create or update.
#[derive(Debug, Serialize)]
struct ProductUpsert<'a> {
    #[serde(flatten)]
    fields: &'a CatalogItemFields,
    picture_url: &'a [String],
    /// Advisory: the backend decides whether storage objects are deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pictures_to_remove: Option<&'a [String]>,
}

impl ProcuraClient {
    /// List every catalog item visible to the caller.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<CatalogItem>, Error> {
        let url = self.url("/products/");
        let response = send(self.authorize(self.client.get(&url))?).await?;
        let response = ensure_success(response, "Failed to fetch products", FailureKind::Request).await?;
        let body: serde_json::Value = read_json(response).await?;
        list_field(body, "products")
    }

    /// Create a catalog item with already-persisted picture references.
    ///
    /// Returns the new item's id when the backend echoes one back.
    #[instrument(skip(self, item, picture_urls), fields(name = %item.name, pictures = picture_urls.len()))]
    pub async fn create_product(
        &self,
        item: &CatalogItemFields,
        picture_urls: &[String],
    ) -> Result<Option<String>, Error> {
        let url = self.url("/products/");
        let body = ProductUpsert {
            fields: item,
            picture_url: picture_urls,
            pictures_to_remove: None,
        };
        let response = send(self.authorize(self.client.post(&url).json(&body))?).await?;
        let response = ensure_success(response, "Failed to add product", FailureKind::Upsert).await?;

        // The create response is not part of the contract; only its id is used.
        let created = response.json::<serde_json::Value>().await.ok();
        Ok(created.as_ref().and_then(product_id_of))
    }

    /// Replace a catalog item's fields and picture references.
    #[instrument(
        skip(self, item, picture_urls, pictures_to_remove),
        fields(pictures = picture_urls.len(), removed = pictures_to_remove.len())
    )]
    pub async fn update_product(
        &self,
        product_id: &str,
        item: &CatalogItemFields,
        picture_urls: &[String],
        pictures_to_remove: &[String],
    ) -> Result<(), Error> {
        let url = self.url(&format!("/products/{}", encode_segment(product_id)));
        let body = ProductUpsert {
            fields: item,
            picture_url: picture_urls,
            pictures_to_remove: Some(pictures_to_remove),
        };
        let response = send(self.authorize(self.client.put(&url).json(&body))?).await?;
        ensure_success(response, "Failed to update product", FailureKind::Upsert).await?;
        Ok(())
    }

    /// Delete a catalog item.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: &str) -> Result<(), Error> {
        let url = self.url(&format!("/products/{}", encode_segment(product_id)));
        let response = send(self.authorize(self.client.delete(&url))?).await?;
        ensure_success(response, "Failed to delete product", FailureKind::Request).await?;
        Ok(())
    }
}

fn product_id_of(body: &serde_json::Value) -> Option<String> {
    match body.get("product_id")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Catalog collection plus the create/update/delete flows that keep it in sync.
///
/// Every mutation reconciles pictures first, then upserts, then refetches the
/// whole catalog. The local list is never patched optimistically.
#[derive(Debug)]
pub struct CatalogSync {
    client: ProcuraClient,
    state: CollectionState<CatalogItem>,
}

impl CatalogSync {
    /// Create a sync client with an empty collection.
    pub fn new(client: ProcuraClient) -> Self {
        Self {
            client,
            state: CollectionState::new(),
        }
    }

    /// The collection, including loading and error flags.
    pub fn state(&self) -> &CollectionState<CatalogItem> {
        &self.state
    }

    /// Items as of the last refetch.
    pub fn items(&self) -> &[CatalogItem] {
        self.state.items()
    }

    /// Look up an item by id in the local collection.
    pub fn find(&self, product_id: &str) -> Option<&CatalogItem> {
        self.items()
            .iter()
            .find(|item| item.product_id() == Some(product_id))
    }

    /// Start an edit session seeded with an item's current pictures.
    pub fn edit_pictures(&self, product_id: &str) -> Option<AttachmentSet> {
        self.find(product_id)
            .map(|item| AttachmentSet::from_persisted(item.picture_url.iter().cloned()))
    }

    /// Refetch the full catalog.
    pub async fn fetch(&mut self) -> Result<(), Error> {
        self.state.begin();
        let result = self.refresh().await;
        self.state.settle(result)
    }

    /// Create an item, uploading its staged pictures first.
    ///
    /// The set's removal list is ignored: nothing was persisted yet.
    pub async fn create(
        &mut self,
        fields: CatalogItemFields,
        pictures: AttachmentSet,
    ) -> Result<CatalogItem, Error> {
        self.state.begin();
        let result = self.create_inner(fields, pictures).await;
        self.state.settle(result)
    }

    /// Update an item, reconciling kept references with newly staged files.
    pub async fn update(
        &mut self,
        product_id: &str,
        fields: CatalogItemFields,
        pictures: AttachmentSet,
    ) -> Result<CatalogItem, Error> {
        self.state.begin();
        let result = self.update_inner(product_id, fields, pictures).await;
        self.state.settle(result)
    }

    /// Delete an item.
    pub async fn remove(&mut self, product_id: &str) -> Result<(), Error> {
        self.state.begin();
        let result = self.remove_inner(product_id).await;
        self.state.settle(result)
    }

    async fn refresh(&mut self) -> Result<(), Error> {
        let items = self.client.list_products().await?;
        self.state.replace(items);
        Ok(())
    }

    async fn create_inner(
        &mut self,
        mut fields: CatalogItemFields,
        pictures: AttachmentSet,
    ) -> Result<CatalogItem, Error> {
        let (attachments, _) = pictures.into_parts();
        let reconciled = reconcile(&self.client, &attachments, &[]).await?;
        let created_id = self
            .client
            .create_product(&fields, &reconciled.references)
            .await?;
        info!(
            product_id = created_id.as_deref().unwrap_or("?"),
            uploaded = reconciled.uploaded,
            "catalog item created"
        );
        self.refresh().await?;

        let found = match created_id.as_deref() {
            Some(id) => self.find(id),
            None => self
                .items()
                .iter()
                .rev()
                .find(|item| item.fields.name == fields.name),
        };
        if let Some(item) = found {
            return Ok(item.clone());
        }
        fields.product_id = created_id;
        Ok(CatalogItem {
            fields,
            picture_url: reconciled.references,
        })
    }

    async fn update_inner(
        &mut self,
        product_id: &str,
        mut fields: CatalogItemFields,
        pictures: AttachmentSet,
    ) -> Result<CatalogItem, Error> {
        fields.product_id = Some(product_id.to_string());
        let (attachments, removals) = pictures.into_parts();
        let reconciled = reconcile(&self.client, &attachments, &removals).await?;
        self.client
            .update_product(product_id, &fields, &reconciled.references, &reconciled.removed)
            .await?;
        info!(
            product_id,
            uploaded = reconciled.uploaded,
            removed = reconciled.removed.len(),
            "catalog item updated"
        );
        self.refresh().await?;

        Ok(self.find(product_id).cloned().unwrap_or(CatalogItem {
            fields,
            picture_url: reconciled.references,
        }))
    }

    async fn remove_inner(&mut self, product_id: &str) -> Result<(), Error> {
        self.client.delete_product(product_id).await?;
        info!(product_id, "catalog item deleted");
        self.refresh().await
    }
}
