use crate::clock;
use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use guidestore_core::{Document, EntityId};
use serde::{Deserialize, Serialize};

/// A named grouping of guides.
///
/// Names are unique ignoring case. Guides refer to categories by name
/// only, so renaming a category does not touch its guides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Identity.
    pub id: EntityId,
    /// Display name, unique ignoring case.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Icon glyph shown next to the name.
    pub icon_glyph: String,
    /// Accent color, conventionally `#RRGGBB`.
    pub color: String,
    /// Creation time.
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Creates an unsaved category with empty presentation fields.
    pub fn new(name: impl Into<String>) -> Self {
        let now = clock::now();
        Self {
            id: EntityId::nil(),
            name: name.into(),
            description: String::new(),
            icon_glyph: String::new(),
            color: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Document for Category {
    const COLLECTION: &'static str = "categories";

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}
