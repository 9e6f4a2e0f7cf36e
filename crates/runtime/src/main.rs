//! Applies pending migrations and checks that the preference store is reachable.

use anyhow::Result;
use domain::models::{EntityId, UserId};
use preference_runtime::{logging, Config, ServiceFactory};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    logging::init_logging(&config.logging);

    let factory = ServiceFactory::bootstrap(&config).await?;
    factory.record_pool_metrics();

    // A lookup for an arbitrary pair proves the schema is in place.
    factory
        .preference_service()
        .find_by_user_and_entity(UserId(1), EntityId(1))
        .await?;
    info!("Preference store is ready");

    factory.shutdown().await;
    Ok(())
}
