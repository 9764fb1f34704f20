//! Entity builders.

use chrono::Duration;
use guidestore::{EntityId, Guide, Progress, Step};

/// Builds guides for tests.
#[derive(Debug, Clone)]
pub struct GuideBuilder {
    guide: Guide,
}

impl GuideBuilder {
    /// Starts a guide titled `title` in category "General".
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            guide: Guide::new(title, "General"),
        }
    }

    /// Sets the category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.guide.category = category.into();
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.guide.description = description.into();
        self
    }

    /// Appends a step without images.
    pub fn step(mut self, title: impl Into<String>, content: impl Into<String>) -> Self {
        self.guide.push_step(title, content);
        self
    }

    /// Appends a step referencing `image_ids`.
    pub fn step_with_images<I, S>(mut self, title: impl Into<String>, image_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let step = self.guide.push_step(title, "");
        step.image_ids.extend(image_ids.into_iter().map(Into::into));
        self
    }

    /// Appends a step with an explicit order, without renumbering.
    pub fn raw_step(mut self, order: u32, title: impl Into<String>) -> Self {
        self.guide.steps.push(Step::new(order, title, ""));
        self
    }

    /// Finishes the guide. It is unsaved and has a nil id.
    pub fn build(self) -> Guide {
        self.guide
    }
}

/// A progress record for `user` on `guide`, completed `minutes` after it
/// started when `Some`.
pub fn progress_record(user: EntityId, guide: EntityId, minutes: Option<u32>) -> Progress {
    let mut progress = Progress::new(user, guide);
    progress.completed_at =
        minutes.map(|m| progress.started_at + Duration::minutes(i64::from(m)));
    progress
}
