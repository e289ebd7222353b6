use std::sync::Arc;

use anyhow::Context;
use apifootball_client::ApiFootballClient;
use data_populator::{PopulationOrchestrator, PopulationScheduler, PopulatorConfig};
use talent_store::PgStore;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    info!("starting data-populator service");

    let config = PopulatorConfig::from_env();

    let client =
        ApiFootballClient::new(config.api.clone()).context("failed to build API client")?;

    let store = PgStore::connect(&config.database.url, config.database.max_connections)
        .await
        .context("failed to connect to database")?;
    store.migrate().await.context("failed to apply migrations")?;

    let orchestrator = Arc::new(PopulationOrchestrator::new(
        Arc::new(client),
        Arc::new(store),
        config.population.clone(),
    ));
    let scheduler = PopulationScheduler::new(orchestrator, config.scheduler.clone());

    scheduler.start().await;
    Ok(())
}
