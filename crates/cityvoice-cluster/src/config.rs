//! Configuration for the clustering pipeline

use crate::error::ClusterError;
use crate::tokenize::DEFAULT_STOPWORDS;
use cityvoice_llm::ProviderSettings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the catch-all topic
pub const OTHER_TOPIC: &str = "Other";

/// Relation-discovery strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationProvider {
    /// Ask the language model for each item's related items
    Llm,
    /// Deterministic keyword overlap, no external dependency
    Keyword,
}

impl Default for RelationProvider {
    fn default() -> Self {
        RelationProvider::Keyword
    }
}

impl fmt::Display for RelationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationProvider::Llm => write!(f, "llm"),
            RelationProvider::Keyword => write!(f, "keyword"),
        }
    }
}

impl FromStr for RelationProvider {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "llm" => Ok(RelationProvider::Llm),
            "keyword" => Ok(RelationProvider::Keyword),
            other => Err(ClusterError::Config(format!(
                "Unsupported provider '{}'. Expected llm or keyword.",
                other
            ))),
        }
    }
}

/// One row of the ordered topic-keyword table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRule {
    /// Topic name, e.g. "Housing"
    pub name: String,

    /// Lowercase substrings that select this topic
    pub keywords: Vec<String>,

    /// Name used by the rule-based labeler
    #[serde(default)]
    pub display_name: String,
}

impl TopicRule {
    /// Create a rule
    pub fn new(name: &str, display_name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            display_name: display_name.to_string(),
        }
    }
}

/// The default topic table
///
/// Order is the tie-break. Safety precedes Transit so that enforcement asks
/// about transit ("more police on buses") land in Safety.
pub fn default_topics() -> Vec<TopicRule> {
    vec![
        TopicRule::new(
            "Housing",
            "Housing Development",
            &[
                "housing", "home", "apartment", "adu", "dwelling", "zoning", "residential",
                "units", "building", "dense", "homes",
            ],
        ),
        TopicRule::new(
            "Safety",
            "Public Safety",
            &["safety", "safe", "police", "officer", "crime", "security", "enforcement", "cops"],
        ),
        TopicRule::new(
            "Transit",
            "Transit Improvements",
            &["bus", "subway", "transit", "rail", "train", "metro", "transport", "commute", "lane"],
        ),
        TopicRule::new(
            "Sidewalks",
            "Pedestrian Infrastructure",
            &["sidewalk", "pedestrian", "street", "walk", "crosswalk", "curb", "wider"],
        ),
        TopicRule::new(
            "Green Space",
            "Green Infrastructure",
            &["green", "tree", "park", "garden", "nature", "permeable", "flood"],
        ),
        TopicRule::new("Schools", "School Safety", &["school", "student", "children", "kids"]),
    ]
}

/// Configuration for the clustering pipeline
///
/// Missing keys take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Relation-discovery strategy
    pub provider: RelationProvider,

    /// Completion backend used by every LLM strategy
    pub llm: ProviderSettings,

    /// Item count above which the context-window strategy is flagged as
    /// unreliable (documented limit, not enforced)
    pub context_window_threshold: usize,

    /// Maximum related items kept per target
    pub max_related: usize,

    /// Clusters this small or smaller never reach the LLM labeler
    pub min_cluster_size: usize,

    /// Clusters smaller than this are hard-labeled "Miscellaneous"; 0 disables
    pub miscellaneous_below: usize,

    /// Item summaries sampled into a labeling prompt
    pub label_sample_limit: usize,

    /// Item summaries sampled into a demand-extraction prompt
    pub demand_sample_limit: usize,

    /// Item summaries sampled into an insights prompt
    pub insight_sample_limit: usize,

    /// Run the demand extraction and action synthesis phases
    pub extract_demands: bool,

    /// Output budget for relation lookups
    pub relation_max_tokens: u32,

    /// Output budget for cluster labels
    pub label_max_tokens: u32,

    /// Output budget for demand extraction and synthesis
    pub demand_max_tokens: u32,

    /// Output budget for report insights
    pub insight_max_tokens: u32,

    /// Rule-based name for the catch-all topic
    pub other_display_name: String,

    /// Ordered topic-keyword table
    pub topics: Vec<TopicRule>,

    /// Words ignored by the keyword tokenizer
    pub stopwords: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            provider: RelationProvider::Keyword,
            llm: ProviderSettings::default(),
            context_window_threshold: 100,
            max_related: 5,
            min_cluster_size: 2,
            miscellaneous_below: 0,
            label_sample_limit: 15,
            demand_sample_limit: 40,
            insight_sample_limit: 40,
            extract_demands: true,
            relation_max_tokens: 1024,
            label_max_tokens: 500,
            demand_max_tokens: 2000,
            insight_max_tokens: 800,
            other_display_name: "Urban Improvements".to_string(),
            topics: default_topics(),
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ClusterError> {
        let positive = [
            ("context_window_threshold", self.context_window_threshold),
            ("max_related", self.max_related),
            ("label_sample_limit", self.label_sample_limit),
            ("demand_sample_limit", self.demand_sample_limit),
            ("insight_sample_limit", self.insight_sample_limit),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ClusterError::Config(format!("{} must be greater than 0", name)));
            }
        }
        if self.topics.is_empty() {
            return Err(ClusterError::Config("topic table cannot be empty".to_string()));
        }
        for rule in &self.topics {
            if rule.name.trim().is_empty() {
                return Err(ClusterError::Config("topic names cannot be blank".to_string()));
            }
            if rule.name == OTHER_TOPIC {
                return Err(ClusterError::Config(format!(
                    "'{}' is the catch-all topic and cannot have keywords",
                    OTHER_TOPIC
                )));
            }
        }
        Ok(())
    }

    /// Rule-based display name for a topic
    pub fn display_name(&self, topic: &str) -> &str {
        if topic == OTHER_TOPIC {
            return &self.other_display_name;
        }
        self.topics
            .iter()
            .find(|r| r.name == topic && !r.display_name.is_empty())
            .map(|r| r.display_name.as_str())
            .unwrap_or("Urban Ideas")
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ClusterError> {
        toml::from_str(toml_str)
            .map_err(|e| ClusterError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ClusterError> {
        toml::to_string_pretty(self)
            .map_err(|e| ClusterError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}
