use crate::api::{CatalogResponse, CatalogVehicle, WebmotorsClient};
use crate::collectors::traits::Collector;
use crate::collectors::types::{CollectorConfig, Filters};
use crate::error::ConfigError;
use crate::models::{Listing, VehicleDetails, SOURCE_WEBMOTORS};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

/// Collector for the Webmotors partner API
pub struct WebmotorsCollector {
    name: String,
    config: CollectorConfig,
    client: WebmotorsClient,
}

impl WebmotorsCollector {
    pub fn new(client: WebmotorsClient, config: CollectorConfig) -> Self {
        Self {
            name: "webmotors".to_string(),
            config,
            client,
        }
    }

    pub fn client(&self) -> &WebmotorsClient {
        &self.client
    }

    fn paging(&self) -> Result<(u32, Filters), ConfigError> {
        let max_pages = self.config.require_max_pages()?;
        let filters = self.config.require_filters()?.clone();
        Ok((max_pages, filters))
    }

    async fn collect_page(&mut self, page: u32, catalog: &CatalogResponse) -> Vec<Listing> {
        let mut listings = Vec::with_capacity(catalog.vehicles.len());

        for (index, raw) in catalog.vehicles.iter().enumerate() {
            let vehicle = match CatalogVehicle::from_value(raw) {
                Ok(vehicle) => vehicle,
                Err(e) => {
                    warn!(page, index, error = %e, "Skipping unreadable catalog entry");
                    continue;
                }
            };
            let Some(vehicle_id) = vehicle.id_string() else {
                warn!(page, "Vehicle ID not found in catalog data");
                continue;
            };

            match self.client.get_vehicle_details(&vehicle_id).await {
                Some(details) => listings.push(create_listing(&vehicle, vehicle_id, details)),
                None => warn!(page, %vehicle_id, "Failed to get details for vehicle"),
            }
        }

        listings
    }
}

/// Merge the catalog summary and the details endpoint into one listing
fn create_listing(vehicle: &CatalogVehicle, id: String, details: VehicleDetails) -> Listing {
    Listing {
        id: Some(id),
        title: Some(vehicle.title.clone().unwrap_or_else(|| "Unknown".to_string())),
        price: vehicle.price,
        year: vehicle.year,
        mileage: vehicle.mileage,
        source: Some(SOURCE_WEBMOTORS.to_string()),
        url: Some(vehicle.url.clone().unwrap_or_default()),
        brand: vehicle.brand.clone(),
        model: vehicle.model.clone(),
        details,
        collected_at: Some(Utc::now()),
        ..Default::default()
    }
}

#[async_trait]
impl Collector for WebmotorsCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate_config(&self) -> Result<(), ConfigError> {
        self.paging().map(|_| ())
    }

    async fn collect(&mut self) -> Vec<Listing> {
        let (max_pages, filters) = match self.paging() {
            Ok(paging) => paging,
            Err(e) => {
                error!(collector = %self.name, error = %e, "Invalid configuration");
                return Vec::new();
            }
        };

        if !self.client.authenticate().await {
            error!("Failed to authenticate with Webmotors API");
            return Vec::new();
        }

        let mut all_listings = Vec::new();

        for page in 1..=max_pages {
            info!("Collecting page {} of {}", page, max_pages);

            let mut page_filters = filters.clone();
            page_filters.insert("page".to_string(), json!(page));

            let Some(catalog) = self.client.get_catalog(&page_filters).await else {
                warn!(page, "No data returned for page");
                continue;
            };

            let listings = self.collect_page(page, &catalog).await;
            info!(
                "Collected {} listings from page {} ({} vehicles in catalog)",
                listings.len(),
                page,
                catalog.vehicles.len()
            );
            all_listings.extend(listings);

            if let Some(pagination) = catalog.pagination {
                if let Some(total_pages) = pagination.total_pages {
                    let current = pagination.current_page.unwrap_or(page);
                    if current >= total_pages {
                        info!("Reached last page ({})", total_pages);
                        break;
                    }
                }
            }
        }

        info!("Collected a total of {} listings", all_listings.len());
        all_listings
    }
}
