//! Local durable persistence for the cached settings record.
//!
//! One JSON document under a fixed key, read once at cache construction and
//! written on every successful fetch or update. Storage failures are
//! reported as [`SettingsError::Storage`] and the cache absorbs them - they
//! never block a fetch or update.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::{Result, SettingsError};
use crate::models::BusinessSettings;

/// File name of the persisted settings document.
const STORAGE_KEY: &str = "business-settings.json";

/// Trait for the durable client-side settings store.
pub trait SettingsStore: Send + Sync {
    /// Load the persisted record, if any.
    fn load(&self) -> Result<Option<BusinessSettings>>;

    /// Persist the record, overwriting any previous copy.
    fn save(&self, settings: &BusinessSettings) -> Result<()>;
}

/// JSON-file store rooted in a caller-supplied directory.
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    /// Store the settings document under `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORAGE_KEY),
        }
    }

    /// Full path of the settings document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<Option<BusinessSettings>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| SettingsError::Storage(format!("read {}: {e}", self.path.display())))?;
        let settings = serde_json::from_str(&raw)
            .map_err(|e| SettingsError::Storage(format!("parse {}: {e}", self.path.display())))?;
        Ok(Some(settings))
    }

    fn save(&self, settings: &BusinessSettings) -> Result<()> {
        let raw = serde_json::to_string(settings)
            .map_err(|e| SettingsError::Storage(format!("serialize settings: {e}")))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::Storage(format!("create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&self.path, raw)
            .map_err(|e| SettingsError::Storage(format!("write {}: {e}", self.path.display())))
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemorySettingsStore {
    inner: Mutex<Option<BusinessSettings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a persisted record.
    pub fn with_settings(settings: BusinessSettings) -> Self {
        Self {
            inner: Mutex::new(Some(settings)),
        }
    }

    /// The currently persisted record, if any.
    pub fn persisted(&self) -> Option<BusinessSettings> {
        self.inner.lock().unwrap().clone()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Option<BusinessSettings>> {
        Ok(self.inner.lock().unwrap().clone())
    }

    fn save(&self, settings: &BusinessSettings) -> Result<()> {
        *self.inner.lock().unwrap() = Some(settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path());
        assert!(store.load().unwrap().is_none());

        let settings = BusinessSettings {
            company_id: Some(7),
            currency: "EUR".to_string(),
            ..Default::default()
        };
        store.save(&settings).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_file_store_overwrites_previous_copy() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path());

        store.save(&BusinessSettings::default()).unwrap();
        let updated = BusinessSettings {
            overtime_rate: 2.0,
            ..Default::default()
        };
        store.save(&updated).unwrap();

        assert_eq!(store.load().unwrap().unwrap().overtime_rate, 2.0);
    }

    #[test]
    fn test_file_store_reports_corrupt_document() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path());
        std::fs::write(store.path(), "{ not json").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, SettingsError::Storage(_)));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemorySettingsStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&BusinessSettings::default()).unwrap();
        assert!(store.persisted().is_some());
    }
}
