//! Adapter over the plugin's persistent settings document.
//!
//! The authoritative store is a single JSON document per plugin instance.
//! Every `set` rewrites the document so the on-disk state never lags the
//! in-memory state; a mutex keeps writers single-file.

use crate::catalog::SettingValue;
use crate::error::StoreError;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

pub struct SettingsStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, SettingValue>>,
}

impl SettingsStore {
    /// Load the store from its serialized document.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let content = fs::read_to_string(&path)?;
        let values: BTreeMap<String, SettingValue> = serde_json::from_str(&content)?;
        info!("loaded {} settings from {}", values.len(), path.display());
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn get(&self, key: &str) -> Result<SettingValue, StoreError> {
        self.values
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    /// Set a key and persist the whole document.
    pub fn set(&self, key: &str, value: SettingValue) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap();
        values.insert(key.to_string(), value);
        let content = serde_json::to_string_pretty(&*values)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Current state of every key, for resync.
    pub fn snapshot(&self) -> BTreeMap<String, SettingValue> {
        self.values.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed_store(dir: &TempDir, json: &str) -> SettingsStore {
        let path = dir.path().join("config.json");
        fs::write(&path, json).unwrap();
        SettingsStore::load(&path).unwrap()
    }

    #[test]
    fn test_load_and_get_typed_values() {
        let dir = TempDir::new().unwrap();
        let store = seed_store(
            &dir,
            r#"{"usedac": true, "kodi_webserver_port": 8080, "kodi_webserver_username": "kodi"}"#,
        );

        assert_eq!(store.get("usedac").unwrap(), SettingValue::Bool(true));
        assert_eq!(
            store.get("kodi_webserver_port").unwrap(),
            SettingValue::Int(8080)
        );
        assert_eq!(
            store.get("kodi_webserver_username").unwrap(),
            SettingValue::Text("kodi".into())
        );
    }

    #[test]
    fn test_get_unknown_key_fails() {
        let dir = TempDir::new().unwrap();
        let store = seed_store(&dir, "{}");
        assert!(matches!(
            store.get("nope"),
            Err(StoreError::KeyNotFound(k)) if k == "nope"
        ));
    }

    #[test]
    fn test_set_persists_immediately() {
        let dir = TempDir::new().unwrap();
        let store = seed_store(&dir, r#"{"audiodelay": 0}"#);

        store.set("audiodelay", SettingValue::Int(125)).unwrap();

        // A fresh load must see the new value.
        let reloaded = SettingsStore::load(dir.path().join("config.json")).unwrap();
        assert_eq!(reloaded.get("audiodelay").unwrap(), SettingValue::Int(125));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = SettingsStore::load(dir.path().join("absent.json"));
        assert!(matches!(result, Err(StoreError::Io(_))));
    }
}
