//! Two-level clustering: coarse topic, then intra-topic connectivity

use crate::classify::Classifier;
use crate::graph::RelationGraph;
use cityvoice_domain::{Cluster, Item, ItemId};
use std::collections::{HashMap, HashSet, VecDeque};

/// Topic groups at or below this size become one component without traversal
pub const TRAVERSAL_MIN_GROUP: usize = 3;

/// Connected components of one topic group
#[derive(Debug, Clone, PartialEq)]
pub struct TopicComponents {
    /// Coarse topic
    pub topic: String,
    /// Components in discovery order; each keeps traversal order
    pub components: Vec<Vec<Item>>,
}

/// Mapping from topic to its connected components
///
/// Components are computed per topic group, so no component can contain
/// items from two topics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicPartition {
    groups: Vec<TopicComponents>,
}

impl TopicPartition {
    /// Partition `items` by topic, then by connectivity in `graph`
    pub fn build(items: &[Item], graph: &RelationGraph, classifier: &Classifier) -> Self {
        let groups = classifier
            .group(items)
            .into_iter()
            .map(|(topic, members)| {
                let components = if members.len() < TRAVERSAL_MIN_GROUP {
                    vec![members.into_iter().cloned().collect()]
                } else {
                    components_within(&members, graph)
                };
                TopicComponents { topic, components }
            })
            .collect();
        Self { groups }
    }

    /// Topic groups in first-seen order
    pub fn groups(&self) -> &[TopicComponents] {
        &self.groups
    }

    /// Total number of components across all topics
    pub fn component_count(&self) -> usize {
        self.groups.iter().map(|g| g.components.len()).sum()
    }

    /// Flatten into unlabeled clusters with sequential ids
    ///
    /// Each item's `topic` is set to its group's topic.
    pub fn into_clusters(self) -> Vec<Cluster> {
        let mut clusters = Vec::with_capacity(self.component_count());
        for group in self.groups {
            for mut nodes in group.components {
                for node in &mut nodes {
                    node.topic = Some(group.topic.clone());
                }
                clusters.push(Cluster::new(clusters.len(), group.topic.clone(), nodes));
            }
        }
        clusters
    }
}

/// Breadth-first components restricted to `members`
fn components_within(members: &[&Item], graph: &RelationGraph) -> Vec<Vec<Item>> {
    let by_id: HashMap<ItemId, &Item> = members.iter().map(|item| (item.id, *item)).collect();
    let mut visited: HashSet<ItemId> = HashSet::new();
    let mut components = Vec::new();

    for start in members {
        if !visited.insert(start.id) {
            continue;
        }
        let mut component = vec![(*start).clone()];
        let mut queue = VecDeque::from([start.id]);

        while let Some(current) = queue.pop_front() {
            for &neighbor in graph.neighbors(current) {
                let Some(item) = by_id.get(&neighbor) else {
                    continue;
                };
                if visited.insert(neighbor) {
                    component.push((*item).clone());
                    queue.push_back(neighbor);
                }
            }
        }
        components.push(component);
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use cityvoice_domain::Relation;

    fn ids(nodes: &[Item]) -> Vec<ItemId> {
        nodes.iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_small_group_is_one_component() {
        let items = vec![
            Item::new(1, "a", "wider sidewalks"),
            Item::new(2, "b", "sidewalk repairs"),
        ];
        let graph = RelationGraph::build(&items, &[]);
        let partition = TopicPartition::build(&items, &graph, &Classifier::default());
        assert_eq!(partition.component_count(), 1);
        assert_eq!(ids(&partition.groups()[0].components[0]), vec![1, 2]);
    }

    #[test]
    fn test_large_group_splits_by_connectivity() {
        let items = vec![
            Item::new(1, "a", "bus lanes"),
            Item::new(2, "b", "subway stations"),
            Item::new(3, "c", "bus shelters"),
            Item::new(4, "d", "train frequency"),
        ];
        let edges = vec![Relation::new(1, 3, "bus"), Relation::new(2, 4, "rail")];
        let graph = RelationGraph::build(&items, &edges);
        let partition = TopicPartition::build(&items, &graph, &Classifier::default());

        let group = &partition.groups()[0];
        assert_eq!(group.topic, "Transit");
        assert_eq!(group.components.len(), 2);
        assert_eq!(ids(&group.components[0]), vec![1, 3]);
        assert_eq!(ids(&group.components[1]), vec![2, 4]);
    }

    #[test]
    fn test_cross_topic_edge_is_not_traversed() {
        let items = vec![
            Item::new(1, "a", "bus lanes"),
            Item::new(2, "b", "subway stations"),
            Item::new(3, "c", "train frequency"),
            Item::new(4, "d", "more police"),
        ];
        let edges = vec![Relation::new(1, 4, "late night")];
        let graph = RelationGraph::build(&items, &edges);
        let clusters = TopicPartition::build(&items, &graph, &Classifier::default()).into_clusters();

        for cluster in &clusters {
            let topics: HashSet<_> = cluster.nodes.iter().map(|n| n.topic.clone()).collect();
            assert_eq!(topics.len(), 1);
        }
        let transit: Vec<&Cluster> = clusters.iter().filter(|c| c.topic == "Transit").collect();
        assert_eq!(transit.len(), 3);
    }

    #[test]
    fn test_cluster_ids_are_sequential() {
        let items = vec![
            Item::new(1, "a", "wider sidewalks on 5th ave"),
            Item::new(2, "b", "make sidewalks bigger downtown"),
            Item::new(3, "c", "more police on buses"),
        ];
        let graph = RelationGraph::build(&items, &[Relation::new(1, 2, "sidewalks")]);
        let clusters = TopicPartition::build(&items, &graph, &Classifier::default()).into_clusters();

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].id, 0);
        assert_eq!(clusters[0].topic, "Sidewalks");
        assert_eq!(ids(&clusters[0].nodes), vec![1, 2]);
        assert_eq!(clusters[1].id, 1);
        assert_eq!(clusters[1].topic, "Safety");
        assert_eq!(clusters[1].nodes[0].topic.as_deref(), Some("Safety"));
    }
}
