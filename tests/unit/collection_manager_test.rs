//! Unit tests for the bookmark collection and its reconciliation logic.
//!
//! The reconciler is a pure `(collection, event) -> collection` transition;
//! these tests exercise it directly and through `CollectionManager`.

use livemark::managers::collection_manager::{
    reconcile, CollectionManager, CollectionManagerTrait,
};
use livemark::types::bookmark::Bookmark;
use livemark::types::event::ChangeEvent;

fn record(id: &str, title: &str, created_at: i64) -> Bookmark {
    Bookmark {
        id: id.to_string(),
        owner_id: "u1".to_string(),
        url: format!("https://{}.example.com", id),
        title: title.to_string(),
        created_at,
    }
}

#[test]
fn test_insert_prepends_new_record() {
    let collection = vec![record("r1", "Older", 1)];
    let result = reconcile(collection, ChangeEvent::insert(record("r2", "Newer", 2)));

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].id, "r2");
    assert_eq!(result[1].id, "r1");
}

#[test]
fn test_insert_existing_id_is_noop() {
    let collection = vec![record("r1", "Original", 1)];
    let result = reconcile(
        collection.clone(),
        ChangeEvent::insert(record("r1", "Duplicate delivery", 9)),
    );

    // The original record is untouched, not replaced.
    assert_eq!(result, collection);
}

#[test]
fn test_update_replaces_in_place() {
    let collection = vec![
        record("r3", "Third", 3),
        record("r2", "Second", 2),
        record("r1", "First", 1),
    ];
    let result = reconcile(
        collection,
        ChangeEvent::update(record("r2", "Second, renamed", 2)),
    );

    assert_eq!(result.len(), 3);
    // Position unchanged.
    assert_eq!(result[1].id, "r2");
    assert_eq!(result[1].title, "Second, renamed");
}

#[test]
fn test_update_unknown_id_is_noop() {
    let collection = vec![record("r1", "First", 1)];
    let result = reconcile(
        collection.clone(),
        ChangeEvent::update(record("ghost", "Ghost", 5)),
    );
    assert_eq!(result, collection);
}

#[test]
fn test_delete_removes_matching_record() {
    let collection = vec![record("r2", "Second", 2), record("r1", "First", 1)];
    let result = reconcile(collection, ChangeEvent::delete(record("r2", "Second", 2)));

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, "r1");
}

#[test]
fn test_delete_unknown_id_is_noop() {
    let collection = vec![record("r1", "First", 1)];
    let result = reconcile(
        collection.clone(),
        ChangeEvent::delete(record("ghost", "Ghost", 5)),
    );
    assert_eq!(result, collection);
}

#[test]
fn test_replace_all_discards_prior_state() {
    let mut manager = CollectionManager::new();
    manager.apply(ChangeEvent::insert(record("stale", "Stale", 1)));

    let snapshot = vec![record("r2", "Second", 2), record("r1", "First", 1)];
    manager.replace_all(snapshot.clone());

    // The collection exactly equals the fetched sequence.
    assert_eq!(manager.records(), snapshot.as_slice());
    assert!(manager.get("stale").is_none());
}

#[test]
fn test_replace_then_reapply_snapshot_insert_is_harmless() {
    // A live insert may arrive before the snapshot that already contains it;
    // reapplying it afterwards must not duplicate the record.
    let mut manager = CollectionManager::new();
    let r9 = record("r9", "Raced", 9);
    manager.apply(ChangeEvent::insert(r9.clone()));
    manager.replace_all(vec![r9.clone(), record("r1", "First", 1)]);
    manager.apply(ChangeEvent::insert(r9));

    assert_eq!(manager.len(), 2);
    assert_eq!(manager.records()[0].id, "r9");
}

#[test]
fn test_clear_empties_collection() {
    let mut manager = CollectionManager::new();
    manager.replace_all(vec![record("r1", "First", 1)]);
    assert!(!manager.is_empty());

    manager.clear();
    assert!(manager.is_empty());
    assert_eq!(manager.len(), 0);
}

#[test]
fn test_loading_flag() {
    let mut manager = CollectionManager::new();
    assert!(!manager.is_loading());
    manager.set_loading(true);
    assert!(manager.is_loading());
    manager.set_loading(false);
    assert!(!manager.is_loading());
}

#[test]
fn test_get_finds_by_id() {
    let mut manager = CollectionManager::new();
    manager.replace_all(vec![record("r2", "Second", 2), record("r1", "First", 1)]);
    assert_eq!(manager.get("r1").map(|r| r.title.as_str()), Some("First"));
    assert!(manager.get("nope").is_none());
}
