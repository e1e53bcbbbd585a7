//! Cluster labeling: LLM strategy, rule-based fallback, and the policy that
//! chooses between them

use crate::config::{PipelineConfig, OTHER_TOPIC};
use crate::error::ClusterError;
use crate::parser::parse_label;
use crate::prompt::label_prompt;
use cityvoice_domain::traits::{ClusterLabeler, LlmProvider};
use cityvoice_domain::{Cluster, ClusterLabel, Consensus};
use std::convert::Infallible;
use std::fmt::Display;
use tracing::{debug, warn};

/// Clusters this large or larger are rated High consensus by the rules
const HIGH_CONSENSUS_SIZE: usize = 3;

/// Deterministic labeler with no external dependency
///
/// Always produces a non-empty name: the topic's display name, replaced by a
/// more specific one when a characteristic phrase appears in the cluster text.
#[derive(Debug, Clone)]
pub struct RuleBasedLabeler {
    display_names: Vec<(String, String)>,
    other_display_name: String,
}

impl RuleBasedLabeler {
    /// Labeler using the display names of `config`'s topic table
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            display_names: config
                .topics
                .iter()
                .map(|r| (r.name.clone(), config.display_name(&r.name).to_string()))
                .collect(),
            other_display_name: config.other_display_name.clone(),
        }
    }

    fn display_name(&self, topic: &str) -> &str {
        if topic == OTHER_TOPIC {
            return &self.other_display_name;
        }
        self.display_names
            .iter()
            .find(|(name, _)| name == topic)
            .map(|(_, display)| display.as_str())
            .unwrap_or("Urban Ideas")
    }

    /// Name for a cluster of `topic` whose lowercased text is `text`
    fn name_for(&self, topic: &str, text: &str) -> String {
        if text.contains("staten island") {
            format!("Staten Island {}", topic)
        } else if text.contains("bus lane") {
            "Bus Lane Expansion".to_string()
        } else if text.contains("wider sidewalk") || text.contains("sidewalk width") {
            "Sidewalk Width Reform".to_string()
        } else if text.contains("dense") || text.contains("density") {
            "Dense Development Advocacy".to_string()
        } else {
            self.display_name(topic).to_string()
        }
    }
}

impl Default for RuleBasedLabeler {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl ClusterLabeler for RuleBasedLabeler {
    type Error = Infallible;

    fn label(&self, cluster: &Cluster) -> Result<ClusterLabel, Self::Error> {
        let text = cluster
            .nodes
            .iter()
            .map(|n| n.summary.as_str())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let topic_lower = cluster.topic.to_lowercase();

        Ok(ClusterLabel {
            name: self.name_for(&cluster.topic, &text),
            summary: format!(
                "{} citizens advocating for {} improvements",
                cluster.len(),
                topic_lower
            ),
            action: format!("Review and prioritize these {}-related suggestions", topic_lower),
            consensus: if cluster.len() >= HIGH_CONSENSUS_SIZE {
                Consensus::High
            } else {
                Consensus::Medium
            },
        })
    }
}

/// Labeler that asks the completion provider
pub struct LlmLabeler<'a, L: LlmProvider> {
    llm: &'a L,
    sample_limit: usize,
    max_tokens: u32,
}

impl<'a, L: LlmProvider> LlmLabeler<'a, L> {
    /// Labeler backed by `llm`, sampling at most `sample_limit` items
    pub fn new(llm: &'a L, sample_limit: usize, max_tokens: u32) -> Self {
        Self {
            llm,
            sample_limit,
            max_tokens,
        }
    }
}

impl<'a, L> ClusterLabeler for LlmLabeler<'a, L>
where
    L: LlmProvider,
    L::Error: Display,
{
    type Error = ClusterError;

    fn label(&self, cluster: &Cluster) -> Result<ClusterLabel, Self::Error> {
        let prompt = label_prompt(cluster, self.sample_limit);
        let response = self
            .llm
            .generate(&prompt, self.max_tokens)
            .map_err(|e| ClusterError::Llm(e.to_string()))?;
        parse_label(&response)
    }
}

/// Which path produced a cluster's label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    /// Hard-labeled as miscellaneous; no labeler ran
    Miscellaneous,
    /// Small cluster, or no LLM labeler configured
    Rules,
    /// LLM labeler succeeded
    Llm,
    /// LLM labeler failed; rules were used instead
    Fallback,
}

/// Size thresholds for routing clusters to labelers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelPolicy {
    /// Clusters this size or smaller skip the LLM labeler
    pub min_cluster_size: usize,
    /// Clusters smaller than this are hard-labeled miscellaneous; 0 disables
    pub miscellaneous_below: usize,
}

impl LabelPolicy {
    /// Thresholds from the pipeline configuration
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            min_cluster_size: config.min_cluster_size,
            miscellaneous_below: config.miscellaneous_below,
        }
    }

    /// Label `cluster` in place
    ///
    /// Never fails: an LLM error falls back to the rules.
    pub fn apply<C>(&self, cluster: &mut Cluster, primary: Option<&C>, rules: &RuleBasedLabeler) -> LabelSource
    where
        C: ClusterLabeler,
        C::Error: Display,
    {
        if cluster.len() < self.miscellaneous_below {
            cluster.mark_miscellaneous();
            return LabelSource::Miscellaneous;
        }

        let primary = primary.filter(|_| cluster.len() > self.min_cluster_size);
        let source = match primary {
            Some(labeler) => match labeler.label(cluster) {
                Ok(label) => {
                    cluster.apply_label(label);
                    LabelSource::Llm
                }
                Err(e) => {
                    warn!(
                        "Labeling failed for cluster {} ({}): {}; using rule-based label",
                        cluster.id, cluster.topic, e
                    );
                    apply_rules(cluster, rules);
                    LabelSource::Fallback
                }
            },
            None => {
                apply_rules(cluster, rules);
                LabelSource::Rules
            }
        };
        debug!("Cluster {} labeled '{}' via {:?}", cluster.id, cluster.name, source);
        source
    }
}

fn apply_rules(cluster: &mut Cluster, rules: &RuleBasedLabeler) {
    match rules.label(cluster) {
        Ok(label) => cluster.apply_label(label),
        Err(never) => match never {},
    }
}
