//! The graph document: items, edges, and the fields derived from them
//!
//! This is the in-memory item store. Items keep their insertion order, which
//! the clustering run relies on for reproducible output.

use cityvoice_domain::{Item, ItemId, ItemStatus, Relation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{info, warn};

/// Per-cluster entry of the document's `topics` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSummary {
    /// `topic_<n>` or `misc`
    pub id: String,
    /// Display label
    pub label: String,
    /// Number of items
    pub count: usize,
    /// Assigned by the frontend
    #[serde(default)]
    pub color: String,
}

/// Free-form project metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    /// Analysis context, e.g. "civic" or a city name
    #[serde(default)]
    pub context: String,

    /// Unknown fields, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One row of a live search result, before it becomes an item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRow {
    /// ISO date of the post
    #[serde(default, alias = "Date")]
    pub date: String,
    /// Author handle
    #[serde(default, alias = "Username")]
    pub username: String,
    /// Summary or quote
    #[serde(default, alias = "Summary/Quote")]
    pub summary: String,
    /// Canonical post URL
    #[serde(default, alias = "Link")]
    pub link: String,
}

/// The persisted graph shape
///
/// The core owns `topic`, `topic_id`, `topic_label` on nodes and the
/// `topics` list; everything else is written back as it was read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Items in insertion order
    #[serde(default)]
    pub nodes: Vec<Item>,

    /// Discovered relations
    #[serde(default)]
    pub edges: Vec<Relation>,

    /// Cluster summaries from the latest clustering run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<TopicSummary>>,

    /// Project metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GraphMetadata>,

    /// Unknown top-level fields, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GraphDocument {
    /// Document with the given items and no edges
    pub fn from_items(nodes: Vec<Item>) -> Self {
        Self {
            nodes,
            ..Self::default()
        }
    }

    /// Look up an item by id
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Whether an item with this id exists
    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Id to assign to the next ingested item
    pub fn next_id(&self) -> ItemId {
        self.nodes.iter().map(|n| n.id).max().map_or(1, |max| max + 1)
    }

    /// Analysis context from the metadata, if any
    pub fn context(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .map(|m| m.context.as_str())
            .filter(|c| !c.is_empty())
    }

    /// Number of items awaiting review
    pub fn provisional_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_provisional()).count()
    }

    /// Replace all edges with a fresh discovery result
    ///
    /// An empty result leaves the existing edges untouched, so a failed run
    /// cannot wipe a previous one. Returns whether the edges were replaced.
    pub fn replace_edges(&mut self, edges: Vec<Relation>) -> bool {
        if edges.is_empty() {
            warn!("No connections found, preserving {} existing edges", self.edges.len());
            return false;
        }
        info!("Replacing {} edges with {}", self.edges.len(), edges.len());
        self.edges = edges;
        true
    }

    /// Append edges without deduplication
    pub fn append_edges(&mut self, edges: Vec<Relation>) {
        self.edges.extend(edges);
    }

    /// Add search results as provisional items with fresh ids
    ///
    /// Rows with neither a summary nor a link carry nothing to analyze and are
    /// skipped. Returns the ids assigned.
    pub fn ingest_rows(&mut self, rows: Vec<SearchRow>, source: &str) -> Vec<ItemId> {
        let mut next = self.next_id();
        let mut added = Vec::new();

        for row in rows {
            if row.summary.trim().is_empty() && row.link.trim().is_empty() {
                continue;
            }
            let item = Item::new(next, row.username.trim().trim_start_matches('@'), row.summary.trim())
                .with_date(row.date.trim())
                .with_link(row.link.trim())
                .with_status(ItemStatus::Provisional)
                .with_source(source);
            self.nodes.push(item);
            added.push(next);
            next += 1;
        }

        info!("Ingested {} provisional items from {}", added.len(), source);
        added
    }

    /// Mark every provisional item as committed; returns how many changed
    pub fn commit_provisional(&mut self) -> usize {
        let mut committed = 0;
        for node in self.nodes.iter_mut().filter(|n| n.is_provisional()) {
            node.status = ItemStatus::Committed;
            committed += 1;
        }
        committed
    }

    /// Remove every provisional item and any edge touching one
    ///
    /// Returns the number of items removed.
    pub fn discard_provisional(&mut self) -> usize {
        let removed: HashSet<ItemId> = self
            .nodes
            .iter()
            .filter(|n| n.is_provisional())
            .map(|n| n.id)
            .collect();
        if removed.is_empty() {
            return 0;
        }

        self.nodes.retain(|n| !removed.contains(&n.id));
        let before = self.edges.len();
        self.edges
            .retain(|e| !removed.contains(&e.source_id) && !removed.contains(&e.target_id));

        info!(
            "Discarded {} provisional items and {} edges",
            removed.len(),
            before - self.edges.len()
        );
        removed.len()
    }

    /// Clear the tags and topic list written by a previous clustering run
    pub fn clear_topics(&mut self) {
        for node in &mut self.nodes {
            node.clear_derived();
        }
        self.topics = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GraphDocument {
        let mut doc = GraphDocument::from_items(vec![
            Item::new(1, "alice", "wider sidewalks"),
            Item::new(2, "bob", "more buses"),
        ]);
        doc.edges.push(Relation::new(1, 2, "streets"));
        doc
    }

    #[test]
    fn test_next_id() {
        assert_eq!(GraphDocument::default().next_id(), 1);
        assert_eq!(sample().next_id(), 3);
    }

    #[test]
    fn test_replace_edges_preserves_on_empty() {
        let mut doc = sample();
        assert!(!doc.replace_edges(Vec::new()));
        assert_eq!(doc.edges.len(), 1);

        assert!(doc.replace_edges(vec![Relation::new(2, 1, "x"), Relation::new(1, 2, "y")]));
        assert_eq!(doc.edges.len(), 2);
    }

    #[test]
    fn test_append_keeps_duplicates() {
        let mut doc = sample();
        doc.append_edges(vec![Relation::new(1, 2, "streets")]);
        assert_eq!(doc.edges.len(), 2);
    }

    #[test]
    fn test_ingest_then_discard() {
        let mut doc = sample();
        let ids = doc.ingest_rows(
            vec![
                SearchRow {
                    date: "2025-01-02".into(),
                    username: "@carol".into(),
                    summary: "plant trees on Elm".into(),
                    link: "https://x.com/carol/status/1".into(),
                },
                SearchRow::default(),
            ],
            "search:Queens",
        );
        assert_eq!(ids, vec![3]);
        let item = doc.get(3).unwrap();
        assert_eq!(item.username, "carol");
        assert_eq!(item.source, "search:Queens");
        assert!(item.is_provisional());

        doc.edges.push(Relation::new(3, 1, "street improvements"));
        assert_eq!(doc.discard_provisional(), 1);
        assert!(!doc.contains(3));
        assert_eq!(doc.edges.len(), 1);
        assert_eq!(doc.discard_provisional(), 0);
    }

    #[test]
    fn test_commit_provisional() {
        let mut doc = sample();
        doc.ingest_rows(
            vec![SearchRow {
                summary: "fix potholes".into(),
                ..SearchRow::default()
            }],
            "search",
        );
        assert_eq!(doc.provisional_count(), 1);
        assert_eq!(doc.commit_provisional(), 1);
        assert_eq!(doc.provisional_count(), 0);
    }

    #[test]
    fn test_search_row_accepts_csv_headers() {
        let row: SearchRow = serde_json::from_str(
            r#"{"Date": "2025-03-01", "Username": "@dan", "Summary/Quote": "bus lanes", "Link": "https://x.com/1"}"#,
        )
        .unwrap();
        assert_eq!(row.username, "@dan");
        assert_eq!(row.summary, "bus lanes");
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let json = r#"{"nodes": [], "edges": [], "version": 2, "metadata": {"context": "civic", "city": "NYC"}}"#;
        let doc: GraphDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.context(), Some("civic"));
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["version"], 2);
        assert_eq!(value["metadata"]["city"], "NYC");
        assert!(value.get("topics").is_none());
    }
}
