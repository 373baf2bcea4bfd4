use crate::models::lenient;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of the OAuth token endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// One page of the `catalog` endpoint.
///
/// Vehicles stay raw so each one can be read on its own with
/// [`CatalogVehicle::from_value`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogResponse {
    #[serde(default, deserialize_with = "lenient::list")]
    pub vehicles: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default, deserialize_with = "lenient::integer")]
    pub current_page: Option<u32>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub total_pages: Option<u32>,
}

/// Summary entry of a vehicle in the catalog
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogVehicle {
    /// The API sends ids as strings or numbers
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub mileage: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub url: Option<String>,
}

impl CatalogVehicle {
    /// Read one raw catalog entry; fails only when the entry is not an object
    pub fn from_value(value: &Value) -> serde_json::Result<Self> {
        Self::deserialize(value)
    }

    /// Id as a path segment, `None` when absent or empty
    pub fn id_string(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
