//! CityVoice Clustering Pipeline
//!
//! Turns a set of short civic suggestions into a relation graph and a
//! partition of that graph into labeled topic clusters.
//!
//! # Architecture
//!
//! ```text
//! Items → Relation Finder → Graph → Classifier → Connectivity → Labeler → Demands → Proposals → Report
//! ```
//!
//! # Key Features
//!
//! - **Pluggable relation discovery**: LLM context-window lookups or deterministic keyword overlap
//! - **Two-level clustering**: coarse keyword topic, then connected components within each topic
//! - **Labeling with fallback**: LLM labels for larger clusters, rule-based names otherwise
//! - **Demand extraction**: deduplicated asks with voice counts, then up to three proposals
//! - **Best-effort**: a failed item or cluster never aborts the run
//!
//! # Example Usage
//!
//! ```
//! use cityvoice_cluster::{ClusterPipeline, PipelineConfig};
//! use cityvoice_domain::Item;
//! use cityvoice_llm::MockProvider;
//! use cityvoice_store::GraphDocument;
//!
//! let mut doc = GraphDocument::from_items(vec![
//!     Item::new(1, "alice", "wider sidewalks on 5th ave"),
//!     Item::new(2, "bob", "make sidewalks bigger downtown"),
//!     Item::new(3, "carol", "more police on buses"),
//! ]);
//!
//! let pipeline = ClusterPipeline::<MockProvider>::new(PipelineConfig::default(), None).unwrap();
//! doc.edges = pipeline.discover_relations(&doc.nodes).unwrap();
//! let report = pipeline.run(&mut doc);
//!
//! assert_eq!(report.total_clusters, 2);
//! assert_eq!(report.clusters[0].name, "Sidewalk Width Reform");
//! assert_eq!(report.clusters[1].name, "Public Safety");
//! ```

#![warn(missing_docs)]

mod error;
mod config;
mod types;
mod tokenize;
mod prompt;
mod parser;
mod relations;
mod graph;
mod classify;
mod connectivity;
mod labeler;
mod demands;
mod insights;
mod pipeline;

#[cfg(test)]
mod tests;

pub use error::ClusterError;
pub use config::{default_topics, PipelineConfig, RelationProvider, TopicRule, OTHER_TOPIC};
pub use types::{ClusterRecord, ClusterReport, NodeRecord};
pub use tokenize::{overlap_score, Tokenizer, DEFAULT_STOPWORDS};
pub use parser::extract_json;
pub use relations::{discover_relations, KeywordRelationFinder, LlmRelationFinder, DEFAULT_MAX_RELATED};
pub use graph::RelationGraph;
pub use classify::Classifier;
pub use connectivity::{TopicComponents, TopicPartition};
pub use labeler::{LabelPolicy, LabelSource, LlmLabeler, RuleBasedLabeler};
pub use demands::{enrich_cluster, ActionSynthesizer, DemandExtractor, MAX_PROPOSALS};
pub use insights::{InsightWriter, NO_IDEAS_MESSAGE};
pub use pipeline::{ClusterPipeline, MIN_ITEMS_FOR_RELATIONS};
