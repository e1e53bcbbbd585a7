//! Item module - one ingested civic suggestion

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Stable integer identifier of an item
pub type ItemId = u64;

/// Lifecycle state of an item
///
/// Items from a live search are `Provisional` until the operator commits or
/// discards them. Imported items are `Committed` immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Awaiting review; may be discarded
    Provisional,
    /// Part of the permanent dataset
    #[default]
    Committed,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Provisional => write!(f, "provisional"),
            ItemStatus::Committed => write!(f, "committed"),
        }
    }
}

/// A single suggestion as stored in the graph document
///
/// `topic`, `topic_id` and `topic_label` are derived by the clustering run and
/// overwritten on every run. Fields this type does not know about are kept in
/// `extra` so that a load/save cycle does not lose them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique, stable identifier
    pub id: ItemId,

    /// Author handle (without the leading `@`)
    #[serde(default)]
    pub username: String,

    /// Free text of the suggestion; may be empty
    #[serde(default)]
    pub summary: String,

    /// ISO-8601 date or empty
    #[serde(default)]
    pub date: String,

    /// Source URL or empty
    #[serde(default)]
    pub link: String,

    /// Lifecycle state
    #[serde(default)]
    pub status: ItemStatus,

    /// Where the item came from (`csv`, `search:<location>`, ...)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,

    /// Coarse topic assigned by the classifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// Identifier of the cluster this item landed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,

    /// Display label of the cluster this item landed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_label: Option<String>,

    /// Unknown fields, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// Create a committed item with no derived tags
    ///
    /// # Examples
    ///
    /// ```
    /// use cityvoice_domain::{Item, ItemStatus};
    ///
    /// let item = Item::new(1, "alice", "wider sidewalks on 5th ave");
    /// assert_eq!(item.status, ItemStatus::Committed);
    /// assert!(item.topic.is_none());
    /// ```
    pub fn new(id: ItemId, username: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            summary: summary.into(),
            date: String::new(),
            link: String::new(),
            status: ItemStatus::Committed,
            source: String::new(),
            topic: None,
            topic_id: None,
            topic_label: None,
            extra: Map::new(),
        }
    }

    /// Set the date
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    /// Set the link
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the source tag
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Whether the item is still awaiting review
    pub fn is_provisional(&self) -> bool {
        self.status == ItemStatus::Provisional
    }

    /// Clear all tags derived by a previous clustering run
    pub fn clear_derived(&mut self) {
        self.topic = None;
        self.topic_id = None;
        self.topic_label = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let item: Item = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(item.id, 7);
        assert_eq!(item.summary, "");
        assert_eq!(item.status, ItemStatus::Committed);
        assert!(item.extra.is_empty());
    }

    #[test]
    fn test_unknown_fields_survive() {
        let json = r#"{"id": 3, "username": "bob", "summary": "trees", "likes": 12}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.extra.get("likes"), Some(&Value::from(12)));

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["likes"], Value::from(12));
        assert!(back.get("topic").is_none());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let item = Item::new(1, "a", "b").with_status(ItemStatus::Provisional);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["status"], "provisional");
        assert!(item.is_provisional());
    }

    #[test]
    fn test_clear_derived() {
        let mut item = Item::new(1, "a", "b");
        item.topic = Some("Housing".into());
        item.topic_id = Some("topic_0".into());
        item.topic_label = Some("Housing Development".into());
        item.clear_derived();
        assert!(item.topic.is_none() && item.topic_id.is_none() && item.topic_label.is_none());
    }
}
