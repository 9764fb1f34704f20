//! Stats command implementation.

use guidestore::{EntityId, GuideStore, InMemoryBlobStore, ProgressStatistics};
use guidestore::{Config, OpenMode};
use std::path::Path;
use std::sync::Arc;

/// Computes progress statistics of `user` in the catalog at `path`.
pub fn statistics(path: &Path, user: &str) -> Result<ProgressStatistics, Box<dyn std::error::Error>> {
    let user: EntityId = user
        .parse()
        .map_err(|_| format!("Invalid user id: {user}"))?;
    let config = Config::default()
        .create_if_missing(false)
        .open_mode(OpenMode::Shared);
    let store = GuideStore::with_config(path, config, Arc::new(InMemoryBlobStore::new()));
    let stats = store.progress().get_statistics(user)?;
    store.close()?;
    Ok(stats)
}

/// Runs the stats command.
pub fn run(path: &Path, user: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let stats = statistics(path, user)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
        _ => {
            println!("Progress of {user}");
            println!("  Started:         {}", stats.total_started);
            println!("  Completed:       {}", stats.total_completed);
            println!("  In progress:     {}", stats.currently_in_progress);
            println!(
                "  Avg completion:  {:.2} min",
                stats.average_completion_time_minutes
            );
            println!("  Completion rate: {:.2}%", stats.completion_rate);
        }
    }
    Ok(())
}
