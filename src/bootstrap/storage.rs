use oss_config::Config;
use oss_events::{AppEvent, EventBus};
use oss_storage::FileStore;
use anyhow::{Context, Result};
use std::sync::Arc;

pub async fn initialize(config: &Config, events: &Arc<EventBus>) -> Result<Arc<dyn FileStore>> {
    let store = oss_storage::open_store(&config.storage)
        .await
        .with_context(|| format!("Failed to open {} storage", config.storage.provider))?;

    events.emit(AppEvent::StoreReady {
        provider: store.provider().to_string(),
        location: store.location(),
    });

    Ok(store)
}
