use super::normalize_query;
use crate::blob::BlobStore;
use crate::clock;
use crate::error::StoreResult;
use crate::models::Guide;
use crate::schema::{GUIDE_CATEGORY, GUIDE_TITLE, GUIDE_UPDATED_AT};
use guidestore_core::{Collection, Engine, EntityId, IndexValue, ScanOrder};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to one blob during a guide delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BlobOutcome {
    /// The blob store accepted the delete.
    Deleted,
    /// The blob store failed; the blob may be orphaned.
    Failed(String),
}

/// One blob touched by a guide delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobDeletion {
    /// Blob id from the step.
    pub id: String,
    /// Outcome.
    pub outcome: BlobOutcome,
}

/// Report of a guide delete.
///
/// Blobs are deleted first and the document last, so an interruption
/// leaves orphaned blobs rather than a guide pointing at missing images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuideDeletion {
    /// Guide that was asked for.
    pub guide_id: EntityId,
    /// Every blob delete attempted, in step order.
    pub blobs: Vec<BlobDeletion>,
    /// Whether the guide document was removed.
    pub document_deleted: bool,
}

impl GuideDeletion {
    /// Blob deletes that failed.
    pub fn failed_blobs(&self) -> impl Iterator<Item = &BlobDeletion> {
        self.blobs
            .iter()
            .filter(|b| matches!(b.outcome, BlobOutcome::Failed(_)))
    }

    /// True if the document and every blob are gone.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.document_deleted && self.failed_blobs().next().is_none()
    }
}

/// Access to guides and their embedded steps.
#[derive(Clone)]
pub struct GuideRepository {
    guides: Collection<Guide>,
    blobs: Arc<dyn BlobStore>,
}

impl GuideRepository {
    /// Creates a repository over `engine`. Guide deletes clean up images
    /// in `blobs`.
    pub fn new(engine: Arc<Engine>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            guides: Collection::new(engine),
            blobs,
        }
    }

    /// Gets a guide by id.
    pub fn get(&self, id: EntityId) -> StoreResult<Option<Guide>> {
        Ok(self.guides.get(id)?)
    }

    /// Returns every guide ordered by title, ignoring case.
    pub fn all(&self) -> StoreResult<Vec<Guide>> {
        Ok(self
            .guides
            .scan_index(GUIDE_TITLE, ScanOrder::Ascending, None)?)
    }

    /// Number of guides.
    pub fn count(&self) -> StoreResult<usize> {
        Ok(self.guides.len()?)
    }

    /// Inserts a guide, stamping both timestamps.
    pub fn insert(&self, guide: &mut Guide) -> StoreResult<EntityId> {
        let now = clock::now();
        guide.created_at = now;
        guide.updated_at = now;
        Ok(self.guides.insert(guide)?)
    }

    /// Saves `guide`, re-stamping `updated_at`.
    ///
    /// Returns `false` if no guide has its id. Step orders are stored as
    /// given.
    pub fn update(&self, guide: &mut Guide) -> StoreResult<bool> {
        guide.updated_at = clock::now();
        Ok(self.guides.update(guide)?)
    }

    /// Case-insensitive substring search over title, description and
    /// category, ordered by title.
    ///
    /// `None` or a blank query returns every guide, same as [`all`](Self::all).
    pub fn search(&self, query: Option<&str>) -> StoreResult<Vec<Guide>> {
        let guides = self.all()?;
        let Some(needle) = normalize_query(query) else {
            return Ok(guides);
        };

        Ok(guides
            .into_iter()
            .filter(|g| {
                g.title.to_lowercase().contains(&needle)
                    || g.description.to_lowercase().contains(&needle)
                    || g.category.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Guides whose category equals `name` ignoring case, ordered by title.
    pub fn get_by_category(&self, name: &str) -> StoreResult<Vec<Guide>> {
        let mut guides = self
            .guides
            .find_by_index(GUIDE_CATEGORY, IndexValue::text(name))?;
        guides.sort_by_cached_key(|g| (g.title.to_lowercase(), g.id));
        Ok(guides)
    }

    /// Number of guides in category `name`, ignoring case.
    pub fn get_category_count(&self, name: &str) -> StoreResult<usize> {
        Ok(self
            .guides
            .count_by_index(GUIDE_CATEGORY, IndexValue::text(name))?)
    }

    /// The `count` most recently modified guides, newest first.
    pub fn get_recently_modified(&self, count: usize) -> StoreResult<Vec<Guide>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        Ok(self
            .guides
            .scan_index(GUIDE_UPDATED_AT, ScanOrder::Descending, Some(count))?)
    }

    /// Category names in use by at least one guide, alphabetical.
    ///
    /// Names differing only in case collapse to the spelling of the first
    /// guide by title. Blank categories are skipped.
    pub fn get_distinct_categories(&self) -> StoreResult<Vec<String>> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for guide in self.all()? {
            let name = guide.category.trim();
            if name.is_empty() {
                continue;
            }
            if seen.insert(name.to_lowercase()) {
                names.push(name.to_string());
            }
        }
        names.sort_by_cached_key(|n| n.to_lowercase());
        Ok(names)
    }

    /// Deletes a guide and every image its steps reference.
    ///
    /// Returns `false` if the guide does not exist.
    pub fn delete(&self, id: EntityId) -> StoreResult<bool> {
        Ok(self.delete_with_report(id)?.document_deleted)
    }

    /// Deletes a guide and reports each blob delete.
    ///
    /// Blob failures are logged and recorded but never stop the remaining
    /// blobs or the document delete. Only an engine failure is returned as
    /// an error.
    pub fn delete_with_report(&self, id: EntityId) -> StoreResult<GuideDeletion> {
        let Some(guide) = self.guides.get(id)? else {
            return Ok(GuideDeletion {
                guide_id: id,
                blobs: Vec::new(),
                document_deleted: false,
            });
        };

        let mut blobs = Vec::new();
        for blob_id in guide.image_ids() {
            let outcome = match self.blobs.delete(blob_id) {
                Ok(()) => BlobOutcome::Deleted,
                Err(e) => {
                    warn!(guide = %id, blob = blob_id, error = %e, "failed to delete guide image");
                    BlobOutcome::Failed(e.to_string())
                }
            };
            blobs.push(BlobDeletion {
                id: blob_id.to_string(),
                outcome,
            });
        }

        let document_deleted = self.guides.delete(id)?;
        debug!(guide = %id, blobs = blobs.len(), "deleted guide");

        Ok(GuideDeletion {
            guide_id: id,
            blobs,
            document_deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::InMemoryBlobStore;
    use crate::models::Step;
    use crate::schema::catalog_schema;

    fn repo() -> (GuideRepository, Arc<InMemoryBlobStore>) {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let engine = Arc::new(Engine::in_memory(catalog_schema()));
        (GuideRepository::new(engine, blobs.clone()), blobs)
    }

    fn add(repo: &GuideRepository, title: &str, category: &str) -> Guide {
        let mut guide = Guide::new(title, category);
        repo.insert(&mut guide).unwrap();
        guide
    }

    fn titles(guides: &[Guide]) -> Vec<&str> {
        guides.iter().map(|g| g.title.as_str()).collect()
    }

    #[test]
    fn search_matches_any_text_field() {
        let (repo, _) = repo();
        add(&repo, "Installing a Cisco Router", "Networking");
        let mut printer = Guide::new("Printer setup", "Hardware");
        printer.description = "Connect to the office router".into();
        repo.insert(&mut printer).unwrap();
        add(&repo, "Password reset", "Accounts");

        let hits = repo.search(Some("ROUTER")).unwrap();
        assert_eq!(titles(&hits), ["Installing a Cisco Router", "Printer setup"]);

        let hits = repo.search(Some("account")).unwrap();
        assert_eq!(titles(&hits), ["Password reset"]);
    }

    #[test]
    fn blank_search_returns_all_by_title() {
        let (repo, _) = repo();
        add(&repo, "b", "x");
        add(&repo, "C", "x");
        add(&repo, "a", "x");

        let all = repo.all().unwrap();
        assert_eq!(titles(&all), ["a", "b", "C"]);
        assert_eq!(repo.search(None).unwrap(), all);
        assert_eq!(repo.search(Some("   ")).unwrap(), all);
    }

    #[test]
    fn category_queries_ignore_case() {
        let (repo, _) = repo();
        add(&repo, "Zeta", "Networking");
        add(&repo, "Alpha", "networking");
        add(&repo, "Other", "Hardware");

        let guides = repo.get_by_category("NETWORKING").unwrap();
        assert_eq!(titles(&guides), ["Alpha", "Zeta"]);
        assert_eq!(repo.get_category_count("networking").unwrap(), 2);
        assert_eq!(repo.get_category_count("Mobile").unwrap(), 0);
    }

    #[test]
    fn distinct_categories_dedupe_ignoring_case() {
        let (repo, _) = repo();
        add(&repo, "A", "networking");
        add(&repo, "B", "Networking");
        add(&repo, "C", "hardware");
        add(&repo, "D", "  ");

        assert_eq!(
            repo.get_distinct_categories().unwrap(),
            ["hardware", "networking"]
        );
    }

    #[test]
    fn delete_removes_every_image() {
        let (repo, blobs) = repo();
        let first = blobs.store(b"1").unwrap();
        let second = blobs.store(b"2").unwrap();
        let unrelated = blobs.store(b"3").unwrap();

        let mut guide = Guide::new("Swap disk", "Hardware");
        guide.steps.push(Step::new(1, "Open", "").with_image(first.clone()));
        guide.steps.push(Step::new(2, "Swap", "").with_image(second.clone()));
        repo.insert(&mut guide).unwrap();

        let report = repo.delete_with_report(guide.id).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.blobs.len(), 2);
        assert!(repo.get(guide.id).unwrap().is_none());
        assert!(!blobs.contains(&first).unwrap());
        assert!(blobs.contains(&unrelated).unwrap());
    }

    #[test]
    fn delete_missing_guide() {
        let (repo, _) = repo();
        assert!(!repo.delete(EntityId::new()).unwrap());
    }

    #[test]
    fn update_restamps() {
        let (repo, _) = repo();
        let mut guide = add(&repo, "Old title", "x");
        let stale = guide.updated_at - chrono::Duration::hours(1);
        guide.updated_at = stale;
        guide.title = "New title".into();

        assert!(repo.update(&mut guide).unwrap());
        assert!(guide.updated_at > stale);
        assert_eq!(repo.get(guide.id).unwrap().unwrap().title, "New title");
    }

    #[test]
    fn recently_modified_zero() {
        let (repo, _) = repo();
        add(&repo, "a", "x");
        assert!(repo.get_recently_modified(0).unwrap().is_empty());
        assert_eq!(repo.get_recently_modified(5).unwrap().len(), 1);
    }
}
