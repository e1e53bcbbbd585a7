//! Markdown insights over the whole graph

use crate::error::ClusterError;
use crate::prompt::{insight_prompt, ConnectionSnippet};
use cityvoice_domain::traits::LlmProvider;
use cityvoice_domain::{Item, ItemId};
use cityvoice_store::GraphDocument;
use std::collections::HashMap;
use std::fmt::Display;
use tracing::info;

/// Returned for a graph with no items
pub const NO_IDEAS_MESSAGE: &str = "No ideas available yet to analyze.";

/// Context used when the document carries none
pub const DEFAULT_CONTEXT: &str = "civic";

/// Writes a short analyst report for the current graph
///
/// Unlike the clustering loop, provider failures are returned to the caller.
pub struct InsightWriter<'a, L: LlmProvider> {
    llm: &'a L,
    sample_limit: usize,
    max_tokens: u32,
}

impl<'a, L> InsightWriter<'a, L>
where
    L: LlmProvider,
    L::Error: Display,
{
    /// Writer sampling at most `sample_limit` items and half as many edges
    pub fn new(llm: &'a L, sample_limit: usize, max_tokens: u32) -> Self {
        Self {
            llm,
            sample_limit,
            max_tokens,
        }
    }

    /// Build the prompt for `doc`, or `None` when there is nothing to analyze
    pub fn prompt(&self, doc: &GraphDocument) -> Option<String> {
        if doc.nodes.is_empty() {
            return None;
        }

        // Newest first; undated items sort last
        let mut recent: Vec<&Item> = doc.nodes.iter().collect();
        recent.sort_by(|a, b| (&b.date, &b.username).cmp(&(&a.date, &a.username)));
        recent.truncate(self.sample_limit);

        let authors: HashMap<ItemId, &str> = doc
            .nodes
            .iter()
            .map(|n| (n.id, n.username.as_str()))
            .collect();
        let connections: Vec<ConnectionSnippet<'_>> = doc
            .edges
            .iter()
            .take(self.sample_limit / 2)
            .map(|e| ConnectionSnippet {
                source: authors.get(&e.source_id).copied().unwrap_or("unknown"),
                target: authors.get(&e.target_id).copied().unwrap_or("unknown"),
                reason: &e.reason,
            })
            .collect();

        let context = doc
            .context()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CONTEXT);
        Some(insight_prompt(context, doc.nodes.len(), &recent, &connections))
    }

    /// Generate the report
    pub fn write(&self, doc: &GraphDocument) -> Result<String, ClusterError> {
        let Some(prompt) = self.prompt(doc) else {
            return Ok(NO_IDEAS_MESSAGE.to_string());
        };
        info!("Generating insights for {} items", doc.nodes.len());
        let text = self
            .llm
            .generate(&prompt, self.max_tokens)
            .map_err(|e| ClusterError::Llm(e.to_string()))?;
        Ok(text.trim().to_string())
    }
}
