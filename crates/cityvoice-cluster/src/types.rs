//! Cluster report types

use cityvoice_domain::{Cluster, Consensus, Demand, Item, ItemId, Proposal};
use serde::{Deserialize, Serialize};

/// Item projection carried in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Item id
    pub id: ItemId,
    /// Author handle
    pub username: String,
    /// Suggestion text
    #[serde(default)]
    pub summary: String,
    /// ISO date or empty
    #[serde(default)]
    pub date: String,
    /// Source URL or empty
    #[serde(default)]
    pub link: String,
}

impl From<&Item> for NodeRecord {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            username: item.username.clone(),
            summary: item.summary.clone(),
            date: item.date.clone(),
            link: item.link.clone(),
        }
    }
}

/// One labeled cluster in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Cluster id from this run
    pub id: usize,
    /// Coarse topic
    pub topic: String,
    /// `topic_<id>` or `misc`
    #[serde(default)]
    pub topic_id: String,
    /// Display name
    pub name: String,
    /// One-line summary
    pub summary: String,
    /// Recommended action
    pub action: String,
    /// Agreement estimate
    pub consensus: Consensus,
    /// Number of member items
    pub node_count: usize,
    /// Member items
    pub nodes: Vec<NodeRecord>,
    /// Deduplicated asks
    #[serde(default)]
    pub demands: Vec<Demand>,
    /// Proposals built from the demands
    #[serde(default)]
    pub synthesized_actions: Vec<Proposal>,
}

impl From<&Cluster> for ClusterRecord {
    fn from(cluster: &Cluster) -> Self {
        Self {
            id: cluster.id,
            topic: cluster.topic.clone(),
            topic_id: cluster.topic_id.clone(),
            name: cluster.name.clone(),
            summary: cluster.summary.clone(),
            action: cluster.action.clone(),
            consensus: cluster.consensus,
            node_count: cluster.len(),
            nodes: cluster.nodes.iter().map(NodeRecord::from).collect(),
            demands: cluster.demands.clone(),
            synthesized_actions: cluster.synthesized_actions.clone(),
        }
    }
}

/// Result of a clustering run, persisted as `enhanced_clusters.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    /// Items in the graph at the time of the run
    pub total_ideas: usize,
    /// Number of clusters
    pub total_clusters: usize,
    /// Clusters in id order
    pub clusters: Vec<ClusterRecord>,
}

impl ClusterReport {
    /// Report over `clusters` for a graph of `total_ideas` items
    pub fn new(total_ideas: usize, clusters: &[Cluster]) -> Self {
        Self {
            total_ideas,
            total_clusters: clusters.len(),
            clusters: clusters.iter().map(ClusterRecord::from).collect(),
        }
    }

    /// Clusters ordered by size, largest first; ties keep id order
    pub fn by_size(&self) -> Vec<&ClusterRecord> {
        let mut records: Vec<&ClusterRecord> = self.clusters.iter().collect();
        records.sort_by(|a, b| b.node_count.cmp(&a.node_count));
        records
    }
}
