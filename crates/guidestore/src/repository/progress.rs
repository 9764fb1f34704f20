use crate::clock;
use crate::error::{StoreError, StoreResult};
use crate::models::{Progress, MAX_NOTES_LEN};
use crate::schema::{PROGRESS_GUIDE, PROGRESS_USER, PROGRESS_USER_GUIDE};
use crate::stats::ProgressStatistics;
use guidestore_core::{Collection, Engine, EntityId, IndexValue};
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::debug;

/// Access to per-user guide progress.
#[derive(Clone)]
pub struct ProgressRepository {
    progress: Collection<Progress>,
}

impl ProgressRepository {
    /// Creates a repository over `engine`.
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            progress: Collection::new(engine),
        }
    }

    /// Gets a record by id.
    pub fn get(&self, id: EntityId) -> StoreResult<Option<Progress>> {
        Ok(self.progress.get(id)?)
    }

    /// Inserts a record.
    ///
    /// Fails with a unique violation if the user already has a record for
    /// the guide.
    pub fn insert(&self, progress: &mut Progress) -> StoreResult<EntityId> {
        Ok(self.progress.insert(progress)?)
    }

    /// Saves `progress` as given. Returns `false` if it does not exist.
    pub fn update(&self, progress: &Progress) -> StoreResult<bool> {
        Ok(self.progress.update(progress)?)
    }

    /// Deletes a record.
    pub fn delete(&self, id: EntityId) -> StoreResult<bool> {
        Ok(self.progress.delete(id)?)
    }

    /// The user's record for a guide, if they started it.
    pub fn get_by_user_and_guide(
        &self,
        user_id: EntityId,
        guide_id: EntityId,
    ) -> StoreResult<Option<Progress>> {
        let key = IndexValue::of(&(user_id, guide_id))?;
        Ok(self.progress.find_one_by_index(PROGRESS_USER_GUIDE, key)?)
    }

    /// Every record of a user, in no particular order.
    pub fn get_by_user(&self, user_id: EntityId) -> StoreResult<Vec<Progress>> {
        Ok(self
            .progress
            .find_by_index(PROGRESS_USER, IndexValue::of(&user_id)?)?)
    }

    /// The user's unfinished guides, most recently accessed first.
    pub fn get_active_by_user(&self, user_id: EntityId) -> StoreResult<Vec<Progress>> {
        let mut records: Vec<Progress> = self
            .get_by_user(user_id)?
            .into_iter()
            .filter(|p| p.completed_at.is_none())
            .collect();
        records.sort_by_key(|p| (Reverse(p.last_accessed_at), p.id));
        Ok(records)
    }

    /// The user's finished guides, most recently completed first.
    pub fn get_completed_by_user(&self, user_id: EntityId) -> StoreResult<Vec<Progress>> {
        let mut records: Vec<Progress> = self
            .get_by_user(user_id)?
            .into_iter()
            .filter(|p| p.completed_at.is_some())
            .collect();
        records.sort_by_key(|p| (Reverse(p.completed_at), p.id));
        Ok(records)
    }

    /// Every user's record for a guide, in no particular order.
    pub fn get_all_for_guide(&self, guide_id: EntityId) -> StoreResult<Vec<Progress>> {
        Ok(self
            .progress
            .find_by_index(PROGRESS_GUIDE, IndexValue::of(&guide_id)?)?)
    }

    /// Aggregates the user's progress history.
    pub fn get_statistics(&self, user_id: EntityId) -> StoreResult<ProgressStatistics> {
        let records = self.get_by_user(user_id)?;
        Ok(ProgressStatistics::from_records(&records))
    }

    /// Returns the user's record for a guide, starting one if needed.
    ///
    /// Like category creation, the lookup and insert are separate steps;
    /// the composite unique index rejects a racing second insert.
    pub fn start_guide(&self, user_id: EntityId, guide_id: EntityId) -> StoreResult<Progress> {
        if let Some(existing) = self.get_by_user_and_guide(user_id, guide_id)? {
            return Ok(existing);
        }

        let mut progress = Progress::new(user_id, guide_id);
        self.progress.insert(&mut progress)?;
        debug!(user = %user_id, guide = %guide_id, "started guide");
        Ok(progress)
    }

    /// Marks step `order` done or not done.
    ///
    /// Adding a present order or removing an absent one changes only
    /// `last_accessed_at`. Returns `false` if the record does not exist.
    pub fn update_step_completion(
        &self,
        id: EntityId,
        order: u32,
        completed: bool,
    ) -> StoreResult<bool> {
        self.modify(id, |p| {
            if completed {
                p.completed_step_orders.insert(order);
            } else {
                p.completed_step_orders.remove(&order);
            }
        })
    }

    /// Moves the step pointer.
    pub fn update_current_step(&self, id: EntityId, order: u32) -> StoreResult<bool> {
        self.modify(id, |p| {
            p.current_step_order = order;
        })
    }

    /// Marks the guide complete.
    ///
    /// Calling again re-stamps `completed_at`.
    pub fn mark_guide_complete(&self, id: EntityId) -> StoreResult<bool> {
        self.modify(id, |p| {
            p.completed_at = Some(p.last_accessed_at);
        })
    }

    /// Adds `seconds` to the accumulated active time.
    pub fn add_active_time(&self, id: EntityId, seconds: u64) -> StoreResult<bool> {
        self.modify(id, |p| {
            p.total_active_time_seconds = p.total_active_time_seconds.saturating_add(seconds);
        })
    }

    /// Replaces the notes.
    ///
    /// Rejects notes longer than [`MAX_NOTES_LEN`] characters with a
    /// validation error, before touching the record.
    pub fn update_notes(&self, id: EntityId, notes: &str) -> StoreResult<bool> {
        let len = notes.chars().count();
        if len > MAX_NOTES_LEN {
            return Err(StoreError::validation(format!(
                "notes are {len} characters, limit is {MAX_NOTES_LEN}"
            )));
        }
        self.modify(id, |p| {
            p.notes = notes.to_string();
        })
    }

    /// Loads a record, applies `change`, refreshes `last_accessed_at` and
    /// saves it.
    fn modify<F>(&self, id: EntityId, change: F) -> StoreResult<bool>
    where
        F: FnOnce(&mut Progress),
    {
        let Some(mut progress) = self.progress.get(id)? else {
            return Ok(false);
        };
        progress.last_accessed_at = clock::now();
        change(&mut progress);
        Ok(self.progress.update(&progress)?)
    }
}
