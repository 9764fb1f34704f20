//! Domain repositories.
//!
//! Each repository composes a typed [`Collection`](guidestore_core::Collection)
//! over the shared engine and adds the catalog's queries and write rules.
//! None of them cache; every call goes to the engine.

mod category;
mod guide;
mod progress;
mod settings;
mod user;

pub use category::CategoryRepository;
pub use guide::{BlobDeletion, BlobOutcome, GuideDeletion, GuideRepository};
pub use progress::ProgressRepository;
pub use settings::SettingsRepository;
pub use user::UserRepository;

/// Trims a query, treating empty and whitespace-only input as absent.
pub(crate) fn normalize_query(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_queries_are_absent() {
        assert_eq!(normalize_query(None), None);
        assert_eq!(normalize_query(Some("")), None);
        assert_eq!(normalize_query(Some(" \t ")), None);
        assert_eq!(normalize_query(Some(" Router ")), Some("router".into()));
    }
}
