//! Car listing collection: scrape and query listing sources, enrich and
//! validate the listings, and write them out as JSON.

pub mod api;
pub mod collectors;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod reference;

pub use config::Settings;
pub use models::Listing;
