use oss_config::Config;
use oss_events::{AppEvent, EventBus};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

pub async fn load(config_path: &str, events: &Arc<EventBus>) -> Result<Config> {
    let abs_config_path = std::path::absolute(config_path)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| config_path.to_string());

    events.emit(AppEvent::ConfigLoading {
        path: abs_config_path.clone(),
    });

    let config_exists = Path::new(config_path).exists();
    let config = Config::from_file_with_events(config_path, Some(events))
        .await
        .with_context(|| format!("Failed to load configuration from {}", abs_config_path))?;

    if !config_exists {
        events.emit(AppEvent::ConfigCreated {
            path: abs_config_path,
        });
    }

    config.validate()?;

    events.emit(AppEvent::ConfigLoaded {
        provider: config.storage.provider.to_string(),
    });

    Ok(config)
}
