use crate::clock;
use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use guidestore_core::{Document, EntityId};
use serde::{Deserialize, Serialize};

/// A key-value application setting.
///
/// Values are opaque strings; by convention callers store JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSetting {
    /// Identity.
    pub id: EntityId,
    /// Unique key.
    pub key: String,
    /// Stored value.
    pub value: String,
    /// Last write time.
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl AppSetting {
    /// Creates an unsaved setting stamped now.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: EntityId::nil(),
            key: key.into(),
            value: value.into(),
            updated_at: clock::now(),
        }
    }
}

impl Document for AppSetting {
    const COLLECTION: &'static str = "settings";

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}
