//! Collections and indexes of the catalog file.

use crate::models::{AppSetting, Category, Guide, Progress, User};
use guidestore_core::{CollectionSchema, Document, IndexDefinition, Schema};

/// Index on `categories.name`, unique ignoring case.
pub const CATEGORY_NAME: &str = "name";
/// Index on `guides.title`.
pub const GUIDE_TITLE: &str = "title";
/// Index on `guides.category`.
pub const GUIDE_CATEGORY: &str = "category";
/// Index on `guides.updated_at`.
pub const GUIDE_UPDATED_AT: &str = "updated_at";
/// Unique index on `progress.(user_id, guide_id)`.
pub const PROGRESS_USER_GUIDE: &str = "user_guide";
/// Index on `progress.user_id`.
pub const PROGRESS_USER: &str = "user_id";
/// Index on `progress.guide_id`.
pub const PROGRESS_GUIDE: &str = "guide_id";
/// Index on `progress.completed_at`; unfinished records key as null.
pub const PROGRESS_COMPLETED_AT: &str = "completed_at";
/// Index on `progress.last_accessed_at`.
pub const PROGRESS_LAST_ACCESSED_AT: &str = "last_accessed_at";
/// Unique index on `settings.key`.
pub const SETTING_KEY: &str = "key";
/// Index on `users.role`.
pub const USER_ROLE: &str = "role";
/// Index on `users.activated_at`.
pub const USER_ACTIVATED_AT: &str = "activated_at";

/// Returns the schema every catalog database is opened with.
#[must_use]
pub fn catalog_schema() -> Schema {
    Schema::new()
        .collection(
            CollectionSchema::new(User::COLLECTION)
                .index(IndexDefinition::hash(USER_ROLE))
                .index(IndexDefinition::btree(USER_ACTIVATED_AT)),
        )
        .collection(
            CollectionSchema::new(AppSetting::COLLECTION)
                .index(IndexDefinition::hash(SETTING_KEY).unique()),
        )
        .collection(
            CollectionSchema::new(Guide::COLLECTION)
                .index(IndexDefinition::btree(GUIDE_TITLE))
                .index(IndexDefinition::hash(GUIDE_CATEGORY))
                .index(IndexDefinition::btree(GUIDE_UPDATED_AT)),
        )
        .collection(
            CollectionSchema::new(Category::COLLECTION)
                .index(IndexDefinition::btree(CATEGORY_NAME).unique()),
        )
        .collection(
            CollectionSchema::new(Progress::COLLECTION)
                .index(
                    IndexDefinition::composite(PROGRESS_USER_GUIDE, ["user_id", "guide_id"])
                        .unique(),
                )
                .index(IndexDefinition::hash(PROGRESS_USER))
                .index(IndexDefinition::hash(PROGRESS_GUIDE))
                .index(IndexDefinition::btree(PROGRESS_COMPLETED_AT))
                .index(IndexDefinition::btree(PROGRESS_LAST_ACCESSED_AT)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_collections() {
        let schema = catalog_schema();
        let names: Vec<&str> = schema
            .collections()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["users", "settings", "guides", "categories", "progress"]);
    }

    #[test]
    fn uniqueness_constraints() {
        let schema = catalog_schema();
        let unique = |collection: &str, index: &str| {
            schema
                .find(collection)
                .and_then(|c| c.find_index(index))
                .map(|i| i.unique)
        };

        assert_eq!(unique("categories", CATEGORY_NAME), Some(true));
        assert_eq!(unique("settings", SETTING_KEY), Some(true));
        assert_eq!(unique("progress", PROGRESS_USER_GUIDE), Some(true));
        assert_eq!(unique("guides", GUIDE_TITLE), Some(false));
    }

    #[test]
    fn every_required_index_is_declared() {
        let schema = catalog_schema();
        for &(collection, index, unique) in REQUIRED_INDEXES {
            let definition = schema
                .find(collection)
                .and_then(|c| c.find_index(index))
                .unwrap_or_else(|| panic!("{collection}.{index} not declared"));
            assert_eq!(definition.unique, unique, "{collection}.{index}");
        }
    }

    const REQUIRED_INDEXES: &[(&str, &str, bool)] = &[
        ("users", USER_ROLE, false),
        ("settings", SETTING_KEY, true),
        ("guides", GUIDE_TITLE, false),
        ("guides", GUIDE_CATEGORY, false),
        ("guides", GUIDE_UPDATED_AT, false),
        ("categories", CATEGORY_NAME, true),
        ("progress", PROGRESS_USER_GUIDE, true),
        ("progress", PROGRESS_USER, false),
        ("progress", PROGRESS_GUIDE, false),
        ("progress", PROGRESS_COMPLETED_AT, false),
        ("progress", PROGRESS_LAST_ACCESSED_AT, false),
    ];
}
