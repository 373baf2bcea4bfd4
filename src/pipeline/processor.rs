use crate::error::ProcessError;
use crate::models::Listing;
use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info};

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("year pattern is valid"));
static BRAND_MODEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]+)\s+(.+)$").expect("brand/model pattern is valid"));

/// Derives brand, model, year and price ratios from raw listings
#[derive(Debug, Clone)]
pub struct Processor {
    reference_year: i32,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    /// Ages are computed against the current year
    pub fn new() -> Self {
        Self::with_reference_year(Utc::now().year())
    }

    pub fn with_reference_year(reference_year: i32) -> Self {
        Self { reference_year }
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Enrich a batch. Items that cannot be processed are logged and dropped.
    pub fn process(&self, data: &[Listing]) -> Vec<Listing> {
        let processed: Vec<Listing> = data
            .iter()
            .filter_map(|item| match self.process_item(item) {
                Ok(listing) => Some(listing),
                Err(e) => {
                    error!(error = %e, url = ?item.url, "Error processing item");
                    None
                }
            })
            .collect();

        info!("Processed {} items", data.len());
        processed
    }

    /// Enrich one listing. Fields that are already set are left alone.
    pub fn process_item(&self, item: &Listing) -> Result<Listing, ProcessError> {
        let mut listing = item.clone();
        let title = listing.title.clone().ok_or(ProcessError::MissingTitle)?;

        if listing.year.is_none() {
            listing.year = YEAR_RE
                .find(&title)
                .and_then(|m| m.as_str().parse().ok());
        }

        if listing.brand.is_none() && listing.model.is_none() {
            if let Some(caps) = BRAND_MODEL_RE.captures(&title) {
                listing.brand = Some(caps[1].to_string());
                listing.model = Some(caps[2].to_string());
            }
        }

        if let (Some(price), Some(mileage)) = (listing.price, listing.mileage) {
            if mileage > 0 {
                listing.price_per_mile = Some(price / mileage as f64);
            }
        }

        if let Some(year) = listing.year {
            let age = self.reference_year - year;
            listing.age = Some(age);
            if let Some(price) = listing.price {
                if age > 0 {
                    listing.price_per_age = Some(price / f64::from(age));
                }
            }
        }

        Ok(listing)
    }
}
