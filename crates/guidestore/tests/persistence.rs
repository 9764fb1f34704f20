//! Catalog data on disk: reopen, backup, compaction, locking.

use guidestore::{schema, Category, Config, CoreError, EntityId, GuideStore, OpenMode, StoreError};
use guidestore_testkit::prelude::*;

#[test]
fn reopen_keeps_data_and_indexes() {
    let store = TestStore::file();
    scenarios::categories(&store, &["Networking"]);
    let user = EntityId::new();
    let guide = scenarios::guides(&store, &[("Router reset", "Networking")]).remove(0);
    store.progress().start_guide(user, guide.id).unwrap();
    store.settings().set_value("theme", "Dark").unwrap();

    let store = store.reopen();

    assert!(store.categories().exists_name("NETWORKING").unwrap());
    assert_eq!(store.guides().get_by_category("networking").unwrap().len(), 1);
    assert!(store
        .progress()
        .get_by_user_and_guide(user, guide.id)
        .unwrap()
        .is_some());
    assert_eq!(store.settings().get_value("theme").unwrap().as_deref(), Some("Dark"));

    let err = store
        .categories()
        .insert(&mut Category::new("networking"))
        .unwrap_err();
    assert!(err.is_constraint_violation());
}

#[test]
fn reopened_file_carries_every_catalog_index() {
    let store = TestStore::file();
    let user = EntityId::new();
    let guides = scenarios::guides(&store, &[("Printer jam", "Office"), ("VPN setup", "Networking")]);
    let started = store.progress().start_guide(user, guides[0].id).unwrap();
    store.progress().start_guide(user, guides[1].id).unwrap();
    assert!(store.progress().mark_guide_complete(started.id).unwrap());

    let store = store.reopen();
    let db = store.engine().database().unwrap();
    let expected = [
        ("users", vec![schema::USER_ROLE, schema::USER_ACTIVATED_AT]),
        ("settings", vec![schema::SETTING_KEY]),
        (
            "guides",
            vec![schema::GUIDE_TITLE, schema::GUIDE_CATEGORY, schema::GUIDE_UPDATED_AT],
        ),
        ("categories", vec![schema::CATEGORY_NAME]),
        (
            "progress",
            vec![
                schema::PROGRESS_USER_GUIDE,
                schema::PROGRESS_USER,
                schema::PROGRESS_GUIDE,
                schema::PROGRESS_COMPLETED_AT,
                schema::PROGRESS_LAST_ACCESSED_AT,
            ],
        ),
    ];
    for (collection, names) in expected {
        let indexes = db.indexes(collection).unwrap();
        for name in names {
            assert!(
                indexes.iter().any(|i| i.name == name),
                "{collection}.{name} missing after reopen"
            );
        }
    }

    let completed = store.progress().get_completed_by_user(user).unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].guide_id, guides[0].id);
    assert_eq!(store.progress().get_active_by_user(user).unwrap().len(), 1);
}

#[test]
fn second_exclusive_opener_is_rejected() {
    let store = TestStore::file();
    store.settings().set_value("k", "v").unwrap();

    let path = store.path().unwrap();
    let other = GuideStore::open(path, store.blobs.clone());
    let err = other.settings().get_value("k").unwrap_err();
    assert!(matches!(err, StoreError::Core(CoreError::DatabaseLocked)));
}

#[test]
fn shared_mode_sees_other_handle_writes() {
    let config = Config::default().open_mode(OpenMode::Shared);
    let first = TestStore::file_with_config(config.clone());
    first.settings().set_value("language", "en").unwrap();

    let second = GuideStore::with_config(first.path().unwrap(), config, first.blobs.clone());
    assert_eq!(
        second.settings().get_value("language").unwrap().as_deref(),
        Some("en")
    );

    second.settings().set_value("language", "de").unwrap();
    assert_eq!(
        first.settings().get_value("language").unwrap().as_deref(),
        Some("de")
    );
}

#[test]
fn backup_copies_checkpointed_file() {
    let store = TestStore::file();
    scenarios::guides(&store, &[("Backup me", "General")]);

    let backup = store.backup(None).unwrap();
    let original = std::fs::read(store.path().unwrap()).unwrap();
    assert_eq!(std::fs::read(&backup).unwrap(), original);

    let restored = GuideStore::open(&backup, store.blobs.clone());
    assert_eq!(restored.guides().all().unwrap()[0].title, "Backup me");
}

#[test]
fn compaction_preserves_logical_state() {
    let store = TestStore::file();
    let mut guides = scenarios::guides(&store, &[("keep", "A"), ("drop", "B")]);
    for _ in 0..5 {
        store.guides().update(&mut guides[0]).unwrap();
    }
    store.guides().delete(guides[1].id).unwrap();

    let db = store.engine().database().unwrap();
    let result = db.compact().unwrap();
    assert!(result.bytes_after < result.bytes_before);

    let all = store.guides().all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], guides[0]);
    assert_eq!(store.guides().get_category_count("a").unwrap(), 1);
    assert!(db.verify().unwrap().is_clean());
}
