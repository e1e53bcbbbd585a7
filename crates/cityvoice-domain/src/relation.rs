//! Relation module (pairwise connections between items)

use super::ItemId;
use serde::{Deserialize, Serialize};

/// A discovered edge between two items
///
/// Directed as produced (the finder was asked about `source_id` and proposed
/// `target_id`), but treated as undirected for connectivity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Item the finder was asked about
    pub source_id: ItemId,

    /// Item proposed as related
    pub target_id: ItemId,

    /// Human-readable reason for the connection
    #[serde(default)]
    pub reason: String,
}

impl Relation {
    /// Create a new relation
    pub fn new(source_id: ItemId, target_id: ItemId, reason: impl Into<String>) -> Self {
        Self {
            source_id,
            target_id,
            reason: reason.into(),
        }
    }

    /// Whether both endpoints are the same item
    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }
}

/// One entry of a relation finder's answer for a single target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedItem {
    /// Related item
    pub id: ItemId,

    /// Why it is related
    pub reason: String,
}

impl RelatedItem {
    /// Create a new related-item entry
    pub fn new(id: ItemId, reason: impl Into<String>) -> Self {
        Self {
            id,
            reason: reason.into(),
        }
    }

    /// Turn this answer into an edge originating at `source_id`
    pub fn into_relation(self, source_id: ItemId) -> Relation {
        Relation::new(source_id, self.id, self.reason)
    }
}
