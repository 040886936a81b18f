use serde::{Deserialize, Serialize};

/// A saved bookmark record, as stored by the backend.
///
/// `id` and `created_at` are assigned by the backend on insert; `owner_id`
/// always equals the id of the identity that created the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub owner_id: String,
    pub url: String,
    pub title: String,
    /// Creation time in unix milliseconds.
    pub created_at: i64,
}
