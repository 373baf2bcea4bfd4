pub mod output;
pub mod processor;
pub mod validator;

pub use output::OutputWriter;
pub use processor::Processor;
pub use validator::{Range, Validator};

use crate::collectors::Collector;
use crate::models::Listing;
use anyhow::Result;
use tracing::{error, info};

/// Per-source counts of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub name: String,
    pub collected: usize,
    pub processed: usize,
    pub valid: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub sources: Vec<SourceSummary>,
    /// Valid listings from every source, in collector order
    pub valid: Vec<Listing>,
}

/// Runs every collector through processing and validation and stores the results
pub struct Pipeline {
    collectors: Vec<Box<dyn Collector>>,
    processor: Processor,
    validator: Validator,
    output: OutputWriter,
}

impl Pipeline {
    pub fn new(output: OutputWriter) -> Self {
        Self {
            collectors: Vec::new(),
            processor: Processor::new(),
            validator: Validator::default(),
            output,
        }
    }

    pub fn with_collector(mut self, collector: Box<dyn Collector>) -> Self {
        self.collectors.push(collector);
        self
    }

    pub fn with_processor(mut self, processor: Processor) -> Self {
        self.processor = processor;
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Collect -> process -> validate for each source, one after another.
    ///
    /// Only a missing output directory or a failed aggregate write aborts the
    /// run; a source whose files cannot be written is logged and skipped.
    pub async fn run(&mut self) -> Result<PipelineReport> {
        self.output.prepare().await?;

        let mut report = PipelineReport::default();

        for collector in self.collectors.iter_mut() {
            let name = collector.name().to_string();
            info!("Collecting data from {}", name);

            let raw = collector.collect().await;
            info!("Collected {} items from {}", raw.len(), name);

            let processed = self.processor.process(&raw);
            let (valid, invalid) = self.validator.validate(processed.clone());

            let ts = output::timestamp();
            for (stage, data) in [("raw", &raw), ("processed", &processed), ("valid", &valid)] {
                if let Err(e) = self.output.write_stage(&name, &ts, stage, data).await {
                    error!(collector = %name, stage, error = ?e, "Error saving collected data");
                }
            }

            report.sources.push(SourceSummary {
                name,
                collected: raw.len(),
                processed: processed.len(),
                valid: valid.len(),
                invalid: invalid.len(),
            });
            report.valid.extend(valid);
        }

        let path = self
            .output
            .write_json(&format!("all_data_{}.json", output::timestamp()), &report.valid)
            .await?;
        info!("💾 Saved all data to {}", path.display());

        Ok(report)
    }
}
