use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Catalog filters, e.g. brand / model / year
pub type Filters = BTreeMap<String, Value>;

/// Collector options. Every key is optional here so that validation can
/// report exactly which one is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CollectorConfig {
    /// Last page to fetch, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<i64>,
    /// Pause before each page fetch, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,
}

impl CollectorConfig {
    pub fn require_max_pages(&self) -> Result<u32, ConfigError> {
        let max_pages = self.max_pages.ok_or(ConfigError::Missing { key: "max_pages" })?;
        if max_pages < 1 {
            return Err(ConfigError::Invalid {
                key: "max_pages",
                reason: format!("must be a positive integer, got {max_pages}"),
            });
        }
        u32::try_from(max_pages).map_err(|_| ConfigError::Invalid {
            key: "max_pages",
            reason: format!("{max_pages} is too large"),
        })
    }

    pub fn require_delay(&self) -> Result<Duration, ConfigError> {
        let delay = self.delay.ok_or(ConfigError::Missing { key: "delay" })?;
        if !delay.is_finite() || delay < 0.0 {
            return Err(ConfigError::Invalid {
                key: "delay",
                reason: format!("must be a non-negative number, got {delay}"),
            });
        }
        Ok(Duration::from_secs_f64(delay))
    }

    pub fn require_filters(&self) -> Result<&Filters, ConfigError> {
        self.filters
            .as_ref()
            .ok_or(ConfigError::Missing { key: "filters" })
    }
}
