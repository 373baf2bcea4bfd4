use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub(crate) mod lenient;

/// Origin identifiers used in the `source` field of a listing
pub const SOURCE_CARS_COM: &str = "cars.com";
pub const SOURCE_WEBMOTORS: &str = "webmotors";

/// Extra vehicle attributes only the API source provides
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VehicleDetails {
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub transmission: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub fuel: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub doors: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient::integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub seats: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::text_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub features: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient::text_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
}

/// One car for sale.
///
/// Every field is optional because collectors emit whatever the source gave them;
/// the validator decides whether the required ones are present and in range.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    // Derived by the processor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_mile: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_age: Option<f64>,

    #[serde(flatten)]
    pub details: VehicleDetails,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<DateTime<Utc>>,
}

/// Named listing fields the validator can require or constrain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Title,
    Price,
    Year,
    Mileage,
    Source,
    Url,
    Brand,
    Model,
    PricePerMile,
    Age,
    PricePerAge,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Price => "price",
            Field::Year => "year",
            Field::Mileage => "mileage",
            Field::Source => "source",
            Field::Url => "url",
            Field::Brand => "brand",
            Field::Model => "model",
            Field::PricePerMile => "price_per_mile",
            Field::Age => "age",
            Field::PricePerAge => "price_per_age",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Listing {
    /// Whether the given field carries a value
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Title => self.title.is_some(),
            Field::Source => self.source.is_some(),
            Field::Url => self.url.is_some(),
            Field::Brand => self.brand.is_some(),
            Field::Model => self.model.is_some(),
            _ => self.numeric(field).is_some(),
        }
    }

    /// Numeric view of a field, `None` for text fields or absent values
    pub fn numeric(&self, field: Field) -> Option<f64> {
        match field {
            Field::Price => self.price,
            Field::Year => self.year.map(f64::from),
            Field::Mileage => self.mileage.map(|m| m as f64),
            Field::PricePerMile => self.price_per_mile,
            Field::Age => self.age.map(f64::from),
            Field::PricePerAge => self.price_per_age,
            Field::Title | Field::Source | Field::Url | Field::Brand | Field::Model => None,
        }
    }
}
