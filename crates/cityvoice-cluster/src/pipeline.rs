//! Pipeline orchestration: relations, clusters, labels, demands

use crate::classify::Classifier;
use crate::config::{PipelineConfig, RelationProvider};
use crate::connectivity::TopicPartition;
use crate::demands::{enrich_cluster, ActionSynthesizer, DemandExtractor};
use crate::error::ClusterError;
use crate::graph::RelationGraph;
use crate::labeler::{LabelPolicy, LabelSource, LlmLabeler, RuleBasedLabeler};
use crate::relations::{discover_relations, KeywordRelationFinder, LlmRelationFinder};
use crate::tokenize::Tokenizer;
use crate::types::ClusterReport;
use cityvoice_domain::traits::LlmProvider;
use cityvoice_domain::{Cluster, Item, ItemId, Relation};
use cityvoice_store::{GraphDocument, TopicSummary};
use std::collections::HashMap;
use std::fmt::Display;
use tracing::{info, warn};

/// Minimum number of items for relation discovery to be meaningful
pub const MIN_ITEMS_FOR_RELATIONS: usize = 2;

/// The relation-discovery and clustering pipeline
///
/// Strictly sequential. Only configuration problems are returned as errors;
/// per-item and per-cluster failures are logged and recovered.
pub struct ClusterPipeline<'a, L: LlmProvider> {
    config: PipelineConfig,
    llm: Option<&'a L>,
    classifier: Classifier,
    rules: RuleBasedLabeler,
}

impl<'a, L> ClusterPipeline<'a, L>
where
    L: LlmProvider,
    L::Error: Display,
{
    /// Create a pipeline; `llm` is `None` when no completion provider is
    /// available, in which case every LLM-backed step uses its fallback
    pub fn new(config: PipelineConfig, llm: Option<&'a L>) -> Result<Self, ClusterError> {
        config.validate()?;
        let classifier = Classifier::new(config.topics.clone());
        let rules = RuleBasedLabeler::from_config(&config);
        Ok(Self {
            config,
            llm,
            classifier,
            rules,
        })
    }

    /// The active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Whether LLM-backed steps are available
    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// Discover relations between `items` with the configured provider
    ///
    /// Fails only when the `llm` provider is configured without a completion
    /// provider; that check happens before any item is processed.
    pub fn discover_relations(&self, items: &[Item]) -> Result<Vec<Relation>, ClusterError> {
        if self.config.provider == RelationProvider::Llm && self.llm.is_none() {
            return Err(ClusterError::MissingCredential(
                "the llm relation provider needs a configured completion backend".to_string(),
            ));
        }
        if items.len() < MIN_ITEMS_FOR_RELATIONS {
            info!("Need at least {} items to find connections", MIN_ITEMS_FOR_RELATIONS);
            return Ok(Vec::new());
        }

        info!("Finding relations using {}...", self.config.provider);
        let relations = match (self.config.provider, self.llm) {
            (RelationProvider::Llm, Some(llm)) => {
                let finder = LlmRelationFinder::new(llm, self.config.relation_max_tokens, self.config.max_related);
                discover_relations(&finder, items, self.config.context_window_threshold)
            }
            _ => {
                let finder = KeywordRelationFinder::new(
                    Tokenizer::new(&self.config.stopwords),
                    self.config.max_related,
                );
                discover_relations(&finder, items, self.config.context_window_threshold)
            }
        };
        Ok(relations)
    }

    /// Partition `items` into unlabeled clusters
    pub fn build_clusters(&self, items: &[Item], edges: &[Relation]) -> Vec<Cluster> {
        let graph = RelationGraph::build(items, edges);
        let clusters = TopicPartition::build(items, &graph, &self.classifier).into_clusters();
        info!(
            "Found {} clusters from {} items and {} links",
            clusters.len(),
            items.len(),
            graph.edge_count()
        );
        clusters
    }

    /// Label every cluster, then run demand extraction and action synthesis
    pub fn enhance(&self, clusters: &mut [Cluster]) {
        let policy = LabelPolicy::from_config(&self.config);
        let labeler = self
            .llm
            .map(|llm| LlmLabeler::new(llm, self.config.label_sample_limit, self.config.label_max_tokens));
        let phases = self.llm.filter(|_| self.config.extract_demands).map(|llm| {
            (
                DemandExtractor::new(llm, self.config.demand_sample_limit, self.config.demand_max_tokens),
                ActionSynthesizer::new(llm, self.config.demand_max_tokens),
            )
        });

        let total = clusters.len();
        for (i, cluster) in clusters.iter_mut().enumerate() {
            info!(
                "Analyzing cluster {}/{}: {} ({} nodes)",
                i + 1,
                total,
                cluster.topic,
                cluster.len()
            );
            let source = policy.apply(cluster, labeler.as_ref(), &self.rules);
            if source == LabelSource::Miscellaneous {
                continue;
            }
            if let Some((extractor, synthesizer)) = &phases {
                enrich_cluster(cluster, extractor, synthesizer);
            }
        }
    }

    /// Full clustering run over a graph document
    ///
    /// Rebuilds every cluster from scratch, writes `topic`, `topic_id` and
    /// `topic_label` onto the nodes, replaces the `topics` list, and returns
    /// the report. Nodes, edges and unknown fields are otherwise untouched.
    pub fn run(&self, doc: &mut GraphDocument) -> ClusterReport {
        doc.clear_topics();
        let mut clusters = self.build_clusters(&doc.nodes, &doc.edges);
        self.enhance(&mut clusters);
        annotate(doc, &clusters);
        ClusterReport::new(doc.nodes.len(), &clusters)
    }
}

/// Copy cluster membership onto the document
fn annotate(doc: &mut GraphDocument, clusters: &[Cluster]) {
    let mut membership: HashMap<ItemId, &Cluster> = HashMap::new();
    let mut topics: Vec<TopicSummary> = Vec::new();

    for cluster in clusters {
        for id in cluster.item_ids() {
            membership.insert(id, cluster);
        }
        match topics.iter_mut().find(|t| t.id == cluster.topic_id) {
            Some(existing) => existing.count += cluster.len(),
            None => topics.push(TopicSummary {
                id: cluster.topic_id.clone(),
                label: cluster.name.clone(),
                count: cluster.len(),
                color: String::new(),
            }),
        }
    }

    for node in &mut doc.nodes {
        match membership.get(&node.id) {
            Some(cluster) => {
                node.topic = Some(cluster.topic.clone());
                node.topic_id = Some(cluster.topic_id.clone());
                node.topic_label = Some(cluster.name.clone());
            }
            None => warn!("Item {} was not assigned to any cluster", node.id),
        }
    }
    doc.topics = Some(topics);
}
