//! Linking (partnership request) types.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Lifecycle state of a linking as reported by the backend.
///
/// Values this client does not know read as `Unknown` so one row never
/// breaks the whole list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkingStatus {
    Pending,
    Active,
    Accepted,
    Rejected,
    Unlinked,
    #[serde(other)]
    Unknown,
}

impl LinkingStatus {
    /// Returns `true` once the supplier has agreed to the partnership.
    pub fn is_linked(self) -> bool {
        matches!(self, Self::Active | Self::Accepted)
    }
}

/// Parse an RFC 3339 timestamp, or a naive one taken as UTC.
///
/// Anything else reads as `None` rather than failing the row.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    Ok(NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc()))
}

/// A supplier's answer to a linking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkingResponse {
    Pending,
    Accepted,
    Rejected,
    Unlinked,
}

impl LinkingResponse {
    /// The query-string value the backend expects.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Unlinked => "unlinked",
        }
    }
}

impl fmt::Display for LinkingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partnership request between a consumer and a supplier company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Linking {
    pub linking_id: i64,
    pub consumer_company_id: i64,
    pub supplier_company_id: i64,
    pub requested_by_user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_by_user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_salesman_user_id: Option<i64>,
    pub status: LinkingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,

    // Display names joined in by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by_user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_by_user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_salesman_name: Option<String>,
}
