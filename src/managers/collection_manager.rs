//! Client-side bookmark collection and its reconciliation logic.
//!
//! The collection is an ordered sequence of records, creation time
//! descending, unique by id, scoped to exactly one identity at a time. Only
//! two paths mutate it: the snapshot loader's full replace and the
//! reconciler's incremental application of live-feed events.

use crate::types::bookmark::Bookmark;
use crate::types::event::{ChangeEvent, ChangeKind};

/// Applies one change event to a collection.
///
/// Pure state transition, independent of the transport that delivered the
/// event:
/// - insert: no-op if the id is already present, otherwise prepend (new
///   records are always the newest in a descending-creation-time order);
/// - update: replace the matching record in place, position unchanged;
///   no-op if absent;
/// - delete: remove the matching record; no-op if absent.
pub fn reconcile(mut collection: Vec<Bookmark>, event: ChangeEvent) -> Vec<Bookmark> {
    match event.kind {
        ChangeKind::Insert => {
            if !collection.iter().any(|r| r.id == event.record.id) {
                collection.insert(0, event.record);
            }
        }
        ChangeKind::Update => {
            if let Some(pos) = collection.iter().position(|r| r.id == event.record.id) {
                collection[pos] = event.record;
            }
        }
        ChangeKind::Delete => {
            if let Some(pos) = collection.iter().position(|r| r.id == event.record.id) {
                collection.remove(pos);
            }
        }
    }
    collection
}

/// Trait defining the collection interface.
pub trait CollectionManagerTrait {
    /// Replaces the whole collection with a snapshot result. This is the
    /// authoritative baseline, not a merge.
    fn replace_all(&mut self, records: Vec<Bookmark>);
    /// Applies one live-feed event via [`reconcile`].
    fn apply(&mut self, event: ChangeEvent);
    /// Discards the collection (identity change, sign-out).
    fn clear(&mut self);
    fn records(&self) -> &[Bookmark];
    fn get(&self, id: &str) -> Option<&Bookmark>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
    fn set_loading(&mut self, loading: bool);
    fn is_loading(&self) -> bool;
}

/// In-memory bookmark collection for the current identity.
pub struct CollectionManager {
    records: Vec<Bookmark>,
    loading: bool,
}

impl CollectionManager {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            loading: false,
        }
    }
}

impl Default for CollectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionManagerTrait for CollectionManager {
    fn replace_all(&mut self, records: Vec<Bookmark>) {
        self.records = records;
    }

    fn apply(&mut self, event: ChangeEvent) {
        self.records = reconcile(std::mem::take(&mut self.records), event);
    }

    fn clear(&mut self) {
        self.records.clear();
    }

    fn records(&self) -> &[Bookmark] {
        &self.records
    }

    fn get(&self, id: &str) -> Option<&Bookmark> {
        self.records.iter().find(|r| r.id == id)
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn is_loading(&self) -> bool {
        self.loading
    }
}
