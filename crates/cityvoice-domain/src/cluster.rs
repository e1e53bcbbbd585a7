//! Cluster module - labeled topic subgroups, demands and proposals

use crate::{Item, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Synthetic topic identifier for clusters too small to label
pub const MISC_TOPIC_ID: &str = "misc";

/// Display name for clusters too small to label
pub const MISC_LABEL: &str = "Miscellaneous";

/// How much the voices in a cluster agree with each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Consensus {
    /// People are saying the same thing
    High,
    /// Related but different asks
    Medium,
    /// Loosely connected ideas
    Low,
}

impl Default for Consensus {
    fn default() -> Self {
        Consensus::Medium
    }
}

impl fmt::Display for Consensus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consensus::High => write!(f, "High"),
            Consensus::Medium => write!(f, "Medium"),
            Consensus::Low => write!(f, "Low"),
        }
    }
}

impl FromStr for Consensus {
    type Err = String;

    /// Case-insensitive; tolerates trailing commentary such as `"High - all agree"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        if lowered.starts_with("high") {
            Ok(Consensus::High)
        } else if lowered.starts_with("medium") || lowered.starts_with("moderate") {
            Ok(Consensus::Medium)
        } else if lowered.starts_with("low") {
            Ok(Consensus::Low)
        } else {
            Err(format!("Unknown consensus level: {}", s))
        }
    }
}

/// The four descriptive fields a labeler produces for a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterLabel {
    /// Short display name (3-5 words)
    pub name: String,

    /// One-sentence summary of what the voices advocate
    pub summary: String,

    /// Recommended action for officials
    pub action: String,

    /// Agreement estimate
    pub consensus: Consensus,
}

/// A deduplicated actionable ask
///
/// Invariant: `count == item_ids.len()`. The fields are private so the
/// invariant can only be established through [`Demand::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DemandRecord")]
pub struct Demand {
    description: String,
    item_ids: BTreeSet<ItemId>,
    voices: BTreeSet<String>,
    count: usize,
}

#[derive(Deserialize)]
struct DemandRecord {
    description: String,
    #[serde(default)]
    item_ids: BTreeSet<ItemId>,
    #[serde(default)]
    voices: BTreeSet<String>,
}

impl From<DemandRecord> for Demand {
    fn from(record: DemandRecord) -> Self {
        Demand::new(record.description, record.item_ids, record.voices)
    }
}

impl Demand {
    /// Create a demand; `count` is derived from the contributing items
    ///
    /// # Examples
    ///
    /// ```
    /// use cityvoice_domain::Demand;
    ///
    /// let demand = Demand::new(
    ///     "Protected bike lanes on 5th Ave",
    ///     [1, 4, 9],
    ///     ["alice", "bob"],
    /// );
    /// assert_eq!(demand.count(), 3);
    /// ```
    pub fn new<I, V, S>(description: impl Into<String>, item_ids: I, voices: V) -> Self
    where
        I: IntoIterator<Item = ItemId>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let item_ids: BTreeSet<ItemId> = item_ids.into_iter().collect();
        let voices = voices
            .into_iter()
            .map(|v| {
                let v: String = v.into();
                v.trim_start_matches('@').to_string()
            })
            .filter(|v| !v.is_empty())
            .collect();
        let count = item_ids.len();
        Self {
            description: description.into(),
            item_ids,
            voices,
            count,
        }
    }

    /// What is being asked for
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Items that expressed this ask
    pub fn item_ids(&self) -> &BTreeSet<ItemId> {
        &self.item_ids
    }

    /// Distinct handles behind the ask
    pub fn voices(&self) -> &BTreeSet<String> {
        &self.voices
    }

    /// Number of contributing items
    pub fn count(&self) -> usize {
        self.count
    }
}

/// A concrete policy recommendation synthesized from demands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Short title
    pub title: String,

    /// Full proposal text
    pub proposal: String,

    /// Descriptions of the demands this proposal addresses
    #[serde(default)]
    pub supporting_demands: Vec<String>,

    /// How many voices stand behind it
    #[serde(default)]
    pub voices_represented: usize,
}

/// A topic-scoped group of items presented as one unit
///
/// Built fresh on every clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Sequential, process-local identifier
    pub id: usize,

    /// Coarse topic shared by all nodes
    pub topic: String,

    /// Identifier written back onto nodes (`topic_<id>` or `misc`)
    pub topic_id: String,

    /// Members in traversal order
    pub nodes: Vec<Item>,

    /// Display name
    pub name: String,

    /// One-line summary
    pub summary: String,

    /// Recommended action
    pub action: String,

    /// Agreement estimate
    pub consensus: Consensus,

    /// Deduplicated asks
    #[serde(default)]
    pub demands: Vec<Demand>,

    /// Proposals built from the demands
    #[serde(default)]
    pub synthesized_actions: Vec<Proposal>,
}

impl Cluster {
    /// Create an unlabeled cluster; the name defaults to the topic
    pub fn new(id: usize, topic: impl Into<String>, nodes: Vec<Item>) -> Self {
        let topic = topic.into();
        Self {
            id,
            topic_id: format!("topic_{}", id),
            name: topic.clone(),
            topic,
            nodes,
            summary: String::new(),
            action: String::new(),
            consensus: Consensus::default(),
            demands: Vec::new(),
            synthesized_actions: Vec::new(),
        }
    }

    /// Number of member items
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the cluster has no members
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Member ids in order
    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    /// Copy a labeler's output onto the cluster
    pub fn apply_label(&mut self, label: ClusterLabel) {
        self.name = label.name;
        self.summary = label.summary;
        self.action = label.action;
        self.consensus = label.consensus;
    }

    /// Current label fields
    pub fn label(&self) -> ClusterLabel {
        ClusterLabel {
            name: self.name.clone(),
            summary: self.summary.clone(),
            action: self.action.clone(),
            consensus: self.consensus,
        }
    }

    /// Hard-label the cluster as miscellaneous with the synthetic id
    pub fn mark_miscellaneous(&mut self) {
        self.topic_id = MISC_TOPIC_ID.to_string();
        self.apply_label(ClusterLabel {
            name: MISC_LABEL.to_string(),
            summary: format!("{} idea(s) without a related group", self.nodes.len()),
            action: "Review individually".to_string(),
            consensus: Consensus::Low,
        });
    }

    /// Whether the cluster carries the synthetic miscellaneous label
    pub fn is_miscellaneous(&self) -> bool {
        self.topic_id == MISC_TOPIC_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consensus_parsing() {
        assert_eq!("High".parse::<Consensus>().unwrap(), Consensus::High);
        assert_eq!("low".parse::<Consensus>().unwrap(), Consensus::Low);
        assert_eq!(
            "Medium - related but different".parse::<Consensus>().unwrap(),
            Consensus::Medium
        );
        assert!("unanimous".parse::<Consensus>().is_err());
    }

    #[test]
    fn test_demand_count_ignores_supplied_count() {
        let json = r#"{"description": "More trees", "item_ids": [1, 2, 2, 5], "voices": ["@a", "b"], "count": 9}"#;
        let demand: Demand = serde_json::from_str(json).unwrap();
        assert_eq!(demand.count(), 3);
        assert!(demand.voices().contains("a"));
    }

    #[test]
    fn test_new_cluster_defaults() {
        let cluster = Cluster::new(4, "Transit", vec![Item::new(1, "a", "bus")]);
        assert_eq!(cluster.topic_id, "topic_4");
        assert_eq!(cluster.name, "Transit");
        assert_eq!(cluster.len(), 1);
        assert!(!cluster.is_miscellaneous());
    }

    #[test]
    fn test_mark_miscellaneous() {
        let mut cluster = Cluster::new(0, "Other", vec![Item::new(1, "a", "hello")]);
        cluster.mark_miscellaneous();
        assert!(cluster.is_miscellaneous());
        assert_eq!(cluster.name, MISC_LABEL);
        assert_eq!(cluster.consensus, Consensus::Low);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn demand_count_matches_item_ids(
            ids in proptest::collection::vec(0u64..50, 0..30),
            voices in proptest::collection::vec("[a-z]{1,6}", 0..10),
        ) {
            let demand = Demand::new("ask", ids, voices);
            prop_assert_eq!(demand.count(), demand.item_ids().len());
        }
    }
}
