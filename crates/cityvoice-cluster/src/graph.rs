//! Undirected relation graph over the current items

use cityvoice_domain::{Item, ItemId, Relation};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Adjacency view of the stored relations
///
/// Edges referencing unknown ids and self-loops are dropped; duplicate and
/// reverse-duplicate edges collapse into one undirected link. Neighbor lists
/// keep first-insertion order so that traversal is reproducible.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    adjacency: HashMap<ItemId, Vec<ItemId>>,
    edge_count: usize,
}

impl RelationGraph {
    /// Build the graph for `items` from `edges`
    pub fn build(items: &[Item], edges: &[Relation]) -> Self {
        let known: HashSet<ItemId> = items.iter().map(|i| i.id).collect();
        let mut adjacency: HashMap<ItemId, Vec<ItemId>> =
            items.iter().map(|i| (i.id, Vec::new())).collect();
        let mut seen: HashSet<(ItemId, ItemId)> = HashSet::new();
        let mut dropped = 0usize;

        for edge in edges {
            if edge.is_self_loop()
                || !known.contains(&edge.source_id)
                || !known.contains(&edge.target_id)
            {
                dropped += 1;
                continue;
            }
            let key = if edge.source_id < edge.target_id {
                (edge.source_id, edge.target_id)
            } else {
                (edge.target_id, edge.source_id)
            };
            if !seen.insert(key) {
                continue;
            }
            if let Some(list) = adjacency.get_mut(&edge.source_id) {
                list.push(edge.target_id);
            }
            if let Some(list) = adjacency.get_mut(&edge.target_id) {
                list.push(edge.source_id);
            }
        }

        if dropped > 0 {
            debug!("Ignored {} self-loop or dangling edges", dropped);
        }

        Self {
            adjacency,
            edge_count: seen.len(),
        }
    }

    /// Neighbors of `id` in insertion order
    pub fn neighbors(&self, id: ItemId) -> &[ItemId] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct undirected links
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Whether `a` and `b` are directly linked
    pub fn connected(&self, a: ItemId, b: ItemId) -> bool {
        self.neighbors(a).contains(&b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: u64) -> Vec<Item> {
        (1..=n).map(|id| Item::new(id, "user", "text")).collect()
    }

    #[test]
    fn test_undirected_and_deduplicated() {
        let edges = vec![
            Relation::new(1, 2, "a"),
            Relation::new(2, 1, "b"),
            Relation::new(1, 2, "c"),
            Relation::new(2, 3, "d"),
        ];
        let graph = RelationGraph::build(&items(3), &edges);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.neighbors(1), &[2]);
        assert_eq!(graph.neighbors(2), &[1, 3]);
        assert!(graph.connected(3, 2));
    }

    #[test]
    fn test_drops_self_loops_and_dangling_edges() {
        let edges = vec![
            Relation::new(1, 1, "self"),
            Relation::new(1, 99, "gone"),
            Relation::new(42, 2, "gone"),
        ];
        let graph = RelationGraph::build(&items(2), &edges);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.neighbors(1).is_empty());
        assert!(graph.neighbors(99).is_empty());
        assert_eq!(graph.node_count(), 2);
    }
}
