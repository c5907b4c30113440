use super::errors::ConfigError;
use std::path::Path;
use std::sync::Arc;
use toml_edit::{DocumentMut, Item, Table, Value};

/// Migrates config file to latest format if needed
pub async fn migrate_config_if_needed<P: AsRef<Path>>(
    path: P,
    events: Option<&Arc<oss_events::EventBus>>,
) -> Result<(), ConfigError> {
    let content = tokio::fs::read_to_string(path.as_ref()).await?;
    let mut doc = content.parse::<DocumentMut>()?;

    let changes = migrate_document(&mut doc)?;

    // Only write if something changed
    if !changes.is_empty() {
        tokio::fs::write(path.as_ref(), doc.to_string()).await?;
        tracing::info!(changes = ?changes, "Migrated configuration file");

        if let Some(event_bus) = events {
            event_bus.emit(oss_events::AppEvent::ConfigMigrated { changes });
        }
    }

    Ok(())
}

pub(crate) fn migrate_document(doc: &mut DocumentMut) -> Result<Vec<String>, ConfigError> {
    let mut changes = Vec::new();
    migrate_storage_section(doc, &mut changes)?;
    Ok(changes)
}

fn migrate_storage_section(
    doc: &mut DocumentMut,
    changes: &mut Vec<String>,
) -> Result<(), ConfigError> {
    if !doc.contains_key("storage") {
        let mut table = Table::new();
        table.set_implicit(true);
        doc["storage"] = Item::Table(table);
        changes.push("storage".to_string());
    }

    let storage = doc["storage"]
        .as_table_mut()
        .ok_or_else(|| ConfigError::MigrationError("Invalid [storage] section in config".to_string()))?;

    // `backend` was the key name before providers other than local and s3 existed
    if let Some(legacy) = storage.remove("backend") {
        if storage.contains_key("provider") {
            changes.push("removed deprecated storage.backend".to_string());
        } else {
            storage.insert("provider", legacy);
            changes.push("storage.provider (renamed from storage.backend)".to_string());
        }
    }

    ensure_field(
        storage,
        "provider",
        Value::from(super::defaults::provider().as_str()),
        "storage.provider",
        changes,
    );

    if !storage.contains_key("local") {
        let mut local_table = Table::new();
        local_table.set_implicit(true);
        storage.insert("local", Item::Table(local_table));
        changes.push("storage.local".to_string());
    }

    let local = storage["local"]
        .as_table_mut()
        .ok_or_else(|| ConfigError::MigrationError("Invalid [storage.local] section in config".to_string()))?;
    ensure_field(
        local,
        "root_path",
        Value::from(super::defaults::local_root_path()),
        "storage.local.root_path",
        changes,
    );

    Ok(())
}

fn ensure_field(
    table: &mut Table,
    key: &str,
    default_value: Value,
    label: &str,
    changes: &mut Vec<String>,
) {
    if !table.contains_key(key) {
        table[key] = Item::Value(default_value);
        changes.push(label.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Provider, DEFAULT_CONFIG_TEMPLATE};

    fn migrate(content: &str) -> (String, Vec<String>) {
        let mut doc = content.parse::<DocumentMut>().unwrap();
        let changes = migrate_document(&mut doc).unwrap();
        (doc.to_string(), changes)
    }

    #[test]
    fn test_default_template_needs_no_migration() {
        let (_, changes) = migrate(DEFAULT_CONFIG_TEMPLATE);
        assert!(changes.is_empty(), "unexpected changes: {:?}", changes);
    }

    #[test]
    fn test_empty_file_gets_storage_section() {
        let (migrated, changes) = migrate("");
        assert!(changes.contains(&"storage".to_string()));
        assert!(changes.contains(&"storage.local.root_path".to_string()));

        let config: Config = migrated.parse().unwrap();
        assert_eq!(config.storage.provider, Provider::Local);
        assert_eq!(config.storage.local.root_path, "oss-data");
    }

    #[test]
    fn test_legacy_backend_key_is_renamed() {
        let (migrated, changes) = migrate("[storage]\nbackend = \"s3\"\n");
        assert!(changes
            .iter()
            .any(|c| c.starts_with("storage.provider (renamed")));
        assert!(!migrated.contains("backend"));

        let config: Config = migrated.parse().unwrap();
        assert_eq!(config.storage.provider, Provider::S3);
    }

    #[test]
    fn test_legacy_backend_key_dropped_when_provider_present() {
        let (migrated, changes) = migrate("[storage]\nprovider = \"gcs\"\nbackend = \"local\"\n");
        assert!(changes.contains(&"removed deprecated storage.backend".to_string()));

        let config: Config = migrated.parse().unwrap();
        assert_eq!(config.storage.provider, Provider::Gcs);
    }

    #[test]
    fn test_existing_values_are_preserved() {
        let content = "[storage]\nprovider = \"local\"\n\n[storage.local]\nroot_path = \"/srv/blobs\" # keep me\n";
        let (migrated, changes) = migrate(content);
        assert!(changes.is_empty());
        assert!(migrated.contains("# keep me"));
    }

    #[test]
    fn test_storage_must_be_a_table() {
        let mut doc = "storage = 42\n".parse::<DocumentMut>().unwrap();
        let result = migrate_document(&mut doc);
        assert!(matches!(result, Err(ConfigError::MigrationError(_))));
    }
}
