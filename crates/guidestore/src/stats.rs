//! Aggregate statistics over a user's progress history.

use crate::models::Progress;
use serde::{Deserialize, Serialize};

/// Summary of a user's progress records.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressStatistics {
    /// Records the user has.
    pub total_started: usize,
    /// Records with a completion time.
    pub total_completed: usize,
    /// `total_started - total_completed`.
    pub currently_in_progress: usize,
    /// Mean start-to-completion time of completed records, in minutes,
    /// rounded to 2 decimals. 0 when nothing is completed.
    pub average_completion_time_minutes: f64,
    /// Percentage of started records that are completed, rounded to 2
    /// decimals. 0 when nothing is started.
    pub completion_rate: f64,
}

impl ProgressStatistics {
    /// Computes statistics over `records`.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Progress>,
    {
        let mut started = 0usize;
        let mut completed = 0usize;
        let mut total_minutes = 0.0;

        for record in records {
            started += 1;
            if let Some(duration) = record.completion_time() {
                completed += 1;
                total_minutes += duration.num_milliseconds() as f64 / 60_000.0;
            }
        }

        let average = if completed == 0 {
            0.0
        } else {
            round2(total_minutes / completed as f64)
        };
        let rate = if started == 0 {
            0.0
        } else {
            round2(100.0 * completed as f64 / started as f64)
        };

        Self {
            total_started: started,
            total_completed: completed,
            currently_in_progress: started - completed,
            average_completion_time_minutes: average,
            completion_rate: rate,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use guidestore_core::EntityId;

    fn record(minutes: Option<i64>) -> Progress {
        let mut progress = Progress::new(EntityId::new(), EntityId::new());
        progress.completed_at = minutes.map(|m| progress.started_at + Duration::minutes(m));
        progress
    }

    #[test]
    fn empty_history_is_all_zero() {
        let stats = ProgressStatistics::from_records(&Vec::<Progress>::new());
        assert_eq!(stats, ProgressStatistics::default());
    }

    #[test]
    fn three_of_four_completed() {
        let records = [record(Some(10)), record(Some(20)), record(Some(30)), record(None)];
        let stats = ProgressStatistics::from_records(&records);

        assert_eq!(stats.total_started, 4);
        assert_eq!(stats.total_completed, 3);
        assert_eq!(stats.currently_in_progress, 1);
        assert_eq!(stats.average_completion_time_minutes, 20.0);
        assert_eq!(stats.completion_rate, 75.0);
    }

    #[test]
    fn rounds_to_two_decimals() {
        let mut odd = record(None);
        odd.completed_at = Some(odd.started_at + Duration::seconds(100));
        let records = [odd, record(None), record(None)];
        let stats = ProgressStatistics::from_records(&records);

        assert_eq!(stats.average_completion_time_minutes, 1.67);
        assert_eq!(stats.completion_rate, 33.33);
    }

    #[test]
    fn none_completed() {
        let records = [record(None), record(None)];
        let stats = ProgressStatistics::from_records(&records);

        assert_eq!(stats.currently_in_progress, 2);
        assert_eq!(stats.average_completion_time_minutes, 0.0);
        assert_eq!(stats.completion_rate, 0.0);
    }
}
