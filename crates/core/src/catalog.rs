//! Catalog (product) types.

use serde::{Deserialize, Deserializer, Serialize};

/// Scalar fields of a catalog item, sent alongside the picture references on upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItemFields {
    /// Backend-assigned identifier; absent until the item is created.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub product_id: Option<String>,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Units currently in stock.
    #[serde(default)]
    pub stock_quantity: i64,
    /// Price per unit for retail orders.
    #[serde(default)]
    pub retail_price: f64,
    /// Quantity at which bulk pricing applies.
    #[serde(default)]
    pub threshold: i64,
    /// Price per unit for bulk orders.
    #[serde(default)]
    pub bulk_price: f64,
    /// Smallest order accepted.
    #[serde(default)]
    pub minimum_order: i64,
    /// Unit of measure (e.g. `kg`, `pcs`).
    #[serde(default)]
    pub unit: String,
}

impl CatalogItemFields {
    /// Create fields with the given name and zeroed numbers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            product_id: None,
            name: name.into(),
            description: String::new(),
            stock_quantity: 0,
            retail_price: 0.0,
            threshold: 0,
            bulk_price: 0.0,
            minimum_order: 0,
            unit: String::new(),
        }
    }
}

/// Ids arrive as strings from some endpoints and as integers from others.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(Option::<Id>::deserialize(deserializer)?.map(|id| match id {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Uint(n) => n.to_string(),
    }))
}

/// A catalog item as held by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Scalar fields.
    #[serde(flatten)]
    pub fields: CatalogItemFields,
    /// Persisted picture references in display order.
    #[serde(default)]
    pub picture_url: Vec<String>,
}

impl CatalogItem {
    /// The backend identifier, if assigned.
    pub fn product_id(&self) -> Option<&str> {
        self.fields.product_id.as_deref()
    }
}
