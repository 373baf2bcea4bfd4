use crate::error::ConfigError;
use crate::models::Listing;
use async_trait::async_trait;

/// Common contract for every listing source.
/// New sources plug into the pipeline by implementing this trait.
#[async_trait]
pub trait Collector: Send {
    /// Name used for logging and output file names
    fn name(&self) -> &str;

    /// Check the configuration, naming the first violated constraint
    fn validate_config(&self) -> Result<(), ConfigError>;

    /// Page through the source and return raw listings.
    /// Never fails: an invalid config or unreachable source yields an empty list.
    async fn collect(&mut self) -> Vec<Listing>;
}
