use crate::clock;
use crate::error::StoreResult;
use crate::models::Category;
use crate::schema::CATEGORY_NAME;
use guidestore_core::{Collection, Engine, EntityId, IndexValue, ScanOrder};
use std::sync::Arc;
use tracing::debug;

/// Access to guide categories.
#[derive(Clone)]
pub struct CategoryRepository {
    categories: Collection<Category>,
}

impl CategoryRepository {
    /// Creates a repository over `engine`.
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            categories: Collection::new(engine),
        }
    }

    /// Gets a category by id.
    pub fn get(&self, id: EntityId) -> StoreResult<Option<Category>> {
        Ok(self.categories.get(id)?)
    }

    /// Gets the category named `name`, ignoring case.
    pub fn get_by_name(&self, name: &str) -> StoreResult<Option<Category>> {
        Ok(self
            .categories
            .find_one_by_index(CATEGORY_NAME, IndexValue::text(name))?)
    }

    /// Returns true if a category is named `name`, ignoring case.
    pub fn exists_name(&self, name: &str) -> StoreResult<bool> {
        Ok(self
            .categories
            .count_by_index(CATEGORY_NAME, IndexValue::text(name))?
            > 0)
    }

    /// Returns true if a category other than `excluding` is named `name`.
    ///
    /// Used to validate a rename.
    pub fn exists_name_excluding(&self, name: &str, excluding: EntityId) -> StoreResult<bool> {
        let matches = self
            .categories
            .find_by_index(CATEGORY_NAME, IndexValue::text(name))?;
        Ok(matches.iter().any(|c| c.id != excluding))
    }

    /// Returns every category ordered by name, ignoring case.
    pub fn all(&self) -> StoreResult<Vec<Category>> {
        Ok(self
            .categories
            .scan_index(CATEGORY_NAME, ScanOrder::Ascending, None)?)
    }

    /// Number of categories.
    pub fn count(&self) -> StoreResult<usize> {
        Ok(self.categories.len()?)
    }

    /// Inserts a category, stamping both timestamps.
    ///
    /// Fails with a unique violation if the name is taken; check with
    /// [`exists_name`](Self::exists_name) first.
    pub fn insert(&self, category: &mut Category) -> StoreResult<EntityId> {
        let now = clock::now();
        category.created_at = now;
        category.updated_at = now;
        Ok(self.categories.insert(category)?)
    }

    /// Returns the category named `name`, creating it if missing.
    ///
    /// The lookup and the insert are separate steps. Two callers racing on
    /// the same new name can both miss; the loser then fails on the unique
    /// name index.
    pub fn ensure_category(&self, name: &str) -> StoreResult<Category> {
        if let Some(existing) = self.get_by_name(name)? {
            return Ok(existing);
        }

        let mut category = Category::new(name);
        self.insert(&mut category)?;
        debug!(name, id = %category.id, "created category");
        Ok(category)
    }

    /// Saves `category`, re-stamping `updated_at`.
    ///
    /// Returns `false` if no category has its id.
    pub fn update(&self, category: &mut Category) -> StoreResult<bool> {
        category.updated_at = clock::now();
        Ok(self.categories.update(category)?)
    }

    /// Deletes a category. Guides naming it are left alone.
    pub fn delete(&self, id: EntityId) -> StoreResult<bool> {
        Ok(self.categories.delete(id)?)
    }
}
