use crate::clock;
use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use guidestore_core::{Document, EntityId};
use serde::{Deserialize, Serialize};

/// A multi-step procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guide {
    /// Identity.
    pub id: EntityId,
    /// Title, used for ordering.
    pub title: String,
    /// Summary.
    pub description: String,
    /// Category name. Not checked against the categories collection.
    pub category: String,
    /// Expected duration.
    pub estimated_minutes: u32,
    /// Embedded steps, conventionally ordered by [`Step::order`].
    pub steps: Vec<Step>,
    /// Creation time.
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    /// Author.
    pub created_by: String,
}

/// One step of a guide. Steps only exist inside their guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Identity, unique within the guide.
    pub id: EntityId,
    /// 1-based position. Uniqueness and contiguity are up to the caller.
    pub order: u32,
    /// Step title.
    pub title: String,
    /// Body text, plain or rich; stored as given.
    pub content: String,
    /// Blob store ids of the step's images.
    pub image_ids: Vec<String>,
    /// Creation time.
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Guide {
    /// Creates an unsaved guide without steps.
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        let now = clock::now();
        Self {
            id: EntityId::nil(),
            title: title.into(),
            description: String::new(),
            category: category.into(),
            estimated_minutes: 0,
            steps: Vec::new(),
            created_at: now,
            updated_at: now,
            created_by: String::new(),
        }
    }

    /// Appends a step, numbering it after the current last step.
    pub fn push_step(&mut self, title: impl Into<String>, content: impl Into<String>) -> &mut Step {
        let order = self.steps.iter().map(|s| s.order).max().unwrap_or(0) + 1;
        self.steps.push(Step::new(order, title, content));
        let last = self.steps.len() - 1;
        &mut self.steps[last]
    }

    /// Number of steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Every blob id referenced by any step, in step order.
    pub fn image_ids(&self) -> impl Iterator<Item = &str> {
        self.steps
            .iter()
            .flat_map(|s| s.image_ids.iter().map(String::as_str))
    }

    /// Sorts steps by `order`. Duplicates and gaps are left alone.
    pub fn sort_steps(&mut self) {
        self.steps.sort_by_key(|s| s.order);
    }

    /// Returns the step at `order`, if any.
    #[must_use]
    pub fn step(&self, order: u32) -> Option<&Step> {
        self.steps.iter().find(|s| s.order == order)
    }
}

impl Step {
    /// Creates a step with a fresh id and no images.
    pub fn new(order: u32, title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = clock::now();
        Self {
            id: EntityId::new(),
            order,
            title: title.into(),
            content: content.into(),
            image_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds an image reference.
    pub fn with_image(mut self, blob_id: impl Into<String>) -> Self {
        self.image_ids.push(blob_id.into());
        self
    }
}

impl Document for Guide {
    const COLLECTION: &'static str = "guides";

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}
