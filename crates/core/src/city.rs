use serde::{Deserialize, Serialize};

/// A city offered as a company location, with localized names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub city_id: i64,
    pub city_name: String,
    #[serde(default)]
    pub city_name_ru: String,
    #[serde(default)]
    pub city_name_kz: String,
}
