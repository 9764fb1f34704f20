use crate::clock;
use chrono::serde::{ts_milliseconds, ts_milliseconds_option};
use chrono::{DateTime, Utc};
use guidestore_core::{Document, EntityId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Longest notes text a progress record accepts, in characters.
pub const MAX_NOTES_LEN: usize = 5000;

/// Lifecycle of a user's progress through one guide.
///
/// A missing record is the not-started state; this type covers the two
/// states a stored record can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressState {
    /// `completed_at` is unset.
    InProgress,
    /// `completed_at` is set. Terminal unless a caller clears it.
    Completed,
}

/// One user's progress through one guide.
///
/// At most one record exists per `(user_id, guide_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Identity.
    pub id: EntityId,
    /// Guide being followed.
    pub guide_id: EntityId,
    /// User following it.
    pub user_id: EntityId,
    /// Step the user is on.
    pub current_step_order: u32,
    /// Orders of the steps marked done.
    pub completed_step_orders: BTreeSet<u32>,
    /// When the user started.
    #[serde(with = "ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    /// Last interaction.
    #[serde(with = "ts_milliseconds")]
    pub last_accessed_at: DateTime<Utc>,
    /// Completion time, unset while in progress.
    #[serde(with = "ts_milliseconds_option", default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Free-text notes, at most [`MAX_NOTES_LEN`] characters.
    pub notes: String,
    /// Accumulated active time.
    pub total_active_time_seconds: u64,
}

impl Progress {
    /// Creates an unsaved in-progress record positioned at step 1.
    #[must_use]
    pub fn new(user_id: EntityId, guide_id: EntityId) -> Self {
        let now = clock::now();
        Self {
            id: EntityId::nil(),
            guide_id,
            user_id,
            current_step_order: 1,
            completed_step_orders: BTreeSet::new(),
            started_at: now,
            last_accessed_at: now,
            completed_at: None,
            notes: String::new(),
            total_active_time_seconds: 0,
        }
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> ProgressState {
        if self.completed_at.is_some() {
            ProgressState::Completed
        } else {
            ProgressState::InProgress
        }
    }

    /// Returns true once `completed_at` is set.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state() == ProgressState::Completed
    }

    /// Share of `total_steps` marked done, 0 to 100.
    ///
    /// Orders beyond `total_steps` still count, so the result is capped.
    #[must_use]
    pub fn percent_complete(&self, total_steps: usize) -> f64 {
        if total_steps == 0 {
            return 0.0;
        }
        let done = self.completed_step_orders.len() as f64;
        (100.0 * done / total_steps as f64).min(100.0)
    }

    /// Time from start to completion, if completed.
    #[must_use]
    pub fn completion_time(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|done| done - self.started_at)
    }
}

impl Document for Progress {
    const COLLECTION: &'static str = "progress";

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}
