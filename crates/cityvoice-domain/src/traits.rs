//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the clustering core and the
//! strategies or infrastructure it consumes.

use crate::{Cluster, ClusterLabel, Item, RelatedItem};

/// Text-completion capability
///
/// Implemented by the infrastructure layer (cityvoice-llm). Every LLM-backed
/// strategy in the pipeline talks to the model through this trait only.
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Complete `prompt`, producing at most `max_tokens` tokens of output
    fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, Self::Error>;

    /// Name of the model used, for logs and report metadata
    fn model_name(&self) -> &str;
}

/// Proposes items related to a target item
///
/// Implemented by the application layer (cityvoice-cluster)
pub trait RelationFinder {
    /// Error type for a single lookup
    type Error;

    /// Return up to five items from `items` related to `target`
    fn find_relations(&self, items: &[Item], target: &Item) -> Result<Vec<RelatedItem>, Self::Error>;
}

/// Produces the display label for a cluster
///
/// Implemented by the application layer (cityvoice-cluster)
pub trait ClusterLabeler {
    /// Error type for labeling
    type Error;

    /// Describe `cluster`
    fn label(&self, cluster: &Cluster) -> Result<ClusterLabel, Self::Error>;
}
