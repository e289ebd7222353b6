//! One-shot population run for manual use; prints the run summary and exits
//! non-zero when the run failed outright.

use std::sync::Arc;

use anyhow::Context;
use apifootball_client::ApiFootballClient;
use data_populator::{PopulationOrchestrator, PopulatorConfig};
use talent_store::PgStore;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = PopulatorConfig::from_env();

    let client =
        ApiFootballClient::new(config.api.clone()).context("failed to build API client")?;

    let store = PgStore::connect(&config.database.url, config.database.max_connections)
        .await
        .context("failed to connect to database")?;
    store.migrate().await.context("failed to apply migrations")?;

    let orchestrator = PopulationOrchestrator::new(
        Arc::new(client),
        Arc::new(store),
        config.population.clone(),
    );

    info!("starting one-shot population run");
    let summary = orchestrator.run().await;

    println!("{}", summary.message());
    for failure in &summary.soft_failures {
        println!("  soft failure [{}]: {}", failure.unit, failure.reason);
    }

    if summary.success() {
        Ok(())
    } else {
        anyhow::bail!("population run failed");
    }
}
