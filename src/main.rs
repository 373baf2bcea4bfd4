use anyhow::{bail, Result};
use car_scout::api::WebmotorsClient;
use car_scout::collectors::{CarsComCollector, WebmotorsCollector};
use car_scout::config::{mask, Settings, OPTIONAL_VARS, REQUIRED_VARS};
use car_scout::pipeline::{OutputWriter, Pipeline};
use car_scout::reference::ReferenceData;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warn!(error = %e, "Could not load .env file");
        }
    }

    let settings = Settings::from_env();
    let command = std::env::args().nth(1).unwrap_or_else(|| "collect".to_string());

    match command.as_str() {
        "collect" => collect(&settings).await,
        "check-env" => {
            check_env(&settings);
            Ok(())
        }
        "reference" => {
            show_reference(&settings);
            Ok(())
        }
        other => bail!("unknown command '{other}' (expected collect, check-env or reference)"),
    }
}

async fn collect(settings: &Settings) -> Result<()> {
    info!("🚗 Car Scout - listing collection");
    info!("==================================");

    let reference = ReferenceData::load(&settings.reference_dir);
    info!("Known brands: {}", reference.brands().len());

    let config = settings.pipeline_config()?;
    let mut pipeline = Pipeline::new(OutputWriter::new(&settings.output_dir));

    if let Some(cfg) = config.cars_com {
        pipeline = pipeline.with_collector(Box::new(CarsComCollector::new(cfg)?));
    }
    if let Some(cfg) = config.webmotors {
        let client = WebmotorsClient::new(settings.api.clone())?;
        pipeline = pipeline.with_collector(Box::new(WebmotorsCollector::new(client, cfg)));
    }

    let report = pipeline.run().await?;

    for source in &report.sources {
        info!(
            "{}: {} collected, {} processed, {} valid, {} invalid",
            source.name, source.collected, source.processed, source.valid, source.invalid
        );
    }
    info!("✅ Collected a total of {} valid car listings", report.valid.len());

    Ok(())
}

fn check_env(settings: &Settings) {
    println!("Checking environment variables for Webmotors API...");

    let missing = settings.missing_required();
    if missing.is_empty() {
        println!("✅ All required environment variables are set.");
        if let Some(id) = &settings.api.credentials.client_id {
            println!("  Client ID: {}", mask(id));
        }
    } else {
        println!("❌ Missing required environment variables:");
        for var in &missing {
            println!("  - {var}");
        }
        println!("\nPlease set these variables in your .env file.");
    }

    let set_optional: Vec<&str> = OPTIONAL_VARS
        .iter()
        .copied()
        .filter(|var| std::env::var(var).map_or(false, |v| !v.is_empty()))
        .collect();
    if !set_optional.is_empty() {
        println!("\n✅ Optional environment variables that are set:");
        for var in set_optional {
            println!("  - {var}");
        }
    }

    println!(
        "\n{} of {} required variables set.",
        REQUIRED_VARS.len() - missing.len(),
        REQUIRED_VARS.len()
    );
}

fn show_reference(settings: &Settings) {
    let reference = ReferenceData::load(&settings.reference_dir);

    println!("Brands: {}", reference.brands().len());
    for brand in reference.brands() {
        let models = reference.models_by_brand(brand);
        println!("  {} ({} models)", brand, models.len());
    }
    println!("Years: {:?}", reference.years());
    println!("States: {}", reference.states().join(", "));
}
