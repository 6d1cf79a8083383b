// Batch optimizer entry point
//
// Usage: optimize <catalogue.csv> <compatibility.csv> <request.json>
//
// Loads the catalogue and compatibility matrix, runs one generation request
// and prints the response JSON to stdout. Exits non-zero when the catalogue
// or index cannot be loaded.

use anyhow::Context;
use garden_optimizer::data::{CsvCatalogueStore, CsvCompatibilityStore};
use garden_optimizer::orchestrator::LoggingNotificationSink;
use garden_optimizer::{GardenRequest, Orchestrator};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "garden_optimizer=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        eprintln!("Usage: {} <catalogue.csv> <compatibility.csv> <request.json>", args[0]);
        std::process::exit(2);
    }

    let catalogue_store = CsvCatalogueStore::new(&args[1]);
    let compatibility_store = CsvCompatibilityStore::new(&args[2]);

    // Startup-fatal when either store fails to load
    let orchestrator = Orchestrator::from_stores(&catalogue_store, &compatibility_store)
        .context("failed to load catalogue or compatibility matrix")?
        .with_notifications(Box::new(LoggingNotificationSink));

    let raw = std::fs::read_to_string(&args[3])
        .with_context(|| format!("failed to read request file {}", args[3]))?;
    let request: GardenRequest =
        serde_json::from_str(&raw).context("failed to parse request JSON")?;

    let response = orchestrator.run(&request)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
