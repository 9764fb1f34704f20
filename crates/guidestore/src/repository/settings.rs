use crate::clock;
use crate::error::StoreResult;
use crate::models::AppSetting;
use crate::schema::SETTING_KEY;
use guidestore_core::{Collection, Engine, IndexValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Key-value application settings.
///
/// Keys are unique ignoring case. Values are stored verbatim.
#[derive(Clone)]
pub struct SettingsRepository {
    settings: Collection<AppSetting>,
}

impl SettingsRepository {
    /// Creates a repository over `engine`.
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            settings: Collection::new(engine),
        }
    }

    /// Gets the full setting record for `key`.
    pub fn get(&self, key: &str) -> StoreResult<Option<AppSetting>> {
        Ok(self
            .settings
            .find_one_by_index(SETTING_KEY, IndexValue::text(key))?)
    }

    /// Gets the value stored under `key`.
    pub fn get_value(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.get(key)?.map(|s| s.value))
    }

    /// Stores `value` under `key`, updating in place if the key exists.
    pub fn set_value(&self, key: &str, value: &str) -> StoreResult<()> {
        let existing = self.get(key)?;
        self.upsert(existing, key, value)
    }

    /// Writes `value` over `existing`, inserting when there is nothing to
    /// overwrite.
    fn upsert(&self, existing: Option<AppSetting>, key: &str, value: &str) -> StoreResult<()> {
        if let Some(mut existing) = existing {
            existing.value = value.to_string();
            existing.updated_at = clock::now();
            if self.settings.update(&existing)? {
                return Ok(());
            }
            // Removed by another handle since the lookup.
        }
        let mut setting = AppSetting::new(key, value);
        self.settings.insert(&mut setting)?;
        Ok(())
    }

    /// Removes `key`. Returns true if something was removed.
    pub fn delete_by_key(&self, key: &str) -> StoreResult<bool> {
        let matches = self
            .settings
            .find_by_index(SETTING_KEY, IndexValue::text(key))?;
        let mut removed = false;
        for setting in matches {
            removed |= self.settings.delete(setting.id)?;
        }
        Ok(removed)
    }

    /// Decodes the JSON value under `key`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.get_value(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Stores `value` as JSON under `key`.
    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set_value(key, &raw)
    }

    /// Every setting, ordered by key.
    pub fn all(&self) -> StoreResult<Vec<AppSetting>> {
        let mut settings = self.settings.all()?;
        settings.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(settings)
    }
}
