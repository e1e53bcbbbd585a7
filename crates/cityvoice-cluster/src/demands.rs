//! Two-phase cluster enhancement: demand extraction, then action synthesis

use crate::error::ClusterError;
use crate::parser::{parse_demands, parse_proposals};
use crate::prompt::{demand_prompt, synthesis_prompt};
use cityvoice_domain::traits::LlmProvider;
use cityvoice_domain::{Cluster, Demand, ItemId, Proposal};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use tracing::{debug, warn};

/// Maximum number of proposals kept per cluster
pub const MAX_PROPOSALS: usize = 3;

/// Phase 1: deduplicated demands for a cluster
///
/// The model does the semantic merge. The result is reconciled against the
/// cluster: ids outside it are dropped and voices are recomputed from the
/// remaining items, so `count` always matches the contributing items.
pub struct DemandExtractor<'a, L: LlmProvider> {
    llm: &'a L,
    sample_limit: usize,
    max_tokens: u32,
}

impl<'a, L> DemandExtractor<'a, L>
where
    L: LlmProvider,
    L::Error: Display,
{
    /// Extractor backed by `llm`
    pub fn new(llm: &'a L, sample_limit: usize, max_tokens: u32) -> Self {
        Self {
            llm,
            sample_limit,
            max_tokens,
        }
    }

    /// Extract the demands of `cluster`
    pub fn extract(&self, cluster: &Cluster) -> Result<Vec<Demand>, ClusterError> {
        let prompt = demand_prompt(cluster, self.sample_limit);
        let response = self
            .llm
            .generate(&prompt, self.max_tokens)
            .map_err(|e| ClusterError::Llm(e.to_string()))?;

        let members: HashMap<ItemId, &str> = cluster
            .nodes
            .iter()
            .map(|n| (n.id, n.username.as_str()))
            .collect();

        let demands = parse_demands(&response)?
            .into_iter()
            .filter_map(|demand| {
                let ids: BTreeSet<ItemId> = demand
                    .item_ids()
                    .iter()
                    .copied()
                    .filter(|id| members.contains_key(id))
                    .collect();
                if ids.is_empty() {
                    debug!("Dropping demand '{}' with no ids in the cluster", demand.description());
                    return None;
                }
                let voices: Vec<&str> = ids.iter().filter_map(|id| members.get(id).copied()).collect();
                Some(Demand::new(demand.description(), ids, voices))
            })
            .collect();
        Ok(demands)
    }
}

/// Phase 2: concrete proposals combining a cluster's demands
pub struct ActionSynthesizer<'a, L: LlmProvider> {
    llm: &'a L,
    max_tokens: u32,
}

impl<'a, L> ActionSynthesizer<'a, L>
where
    L: LlmProvider,
    L::Error: Display,
{
    /// Synthesizer backed by `llm`
    pub fn new(llm: &'a L, max_tokens: u32) -> Self {
        Self { llm, max_tokens }
    }

    /// Build at most three proposals from `demands`
    ///
    /// Returns no proposals, without calling the provider, when there are no
    /// demands. `voices_represented` is capped at the number of distinct
    /// voices behind the demands.
    pub fn synthesize(&self, cluster: &Cluster, demands: &[Demand]) -> Result<Vec<Proposal>, ClusterError> {
        if demands.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = synthesis_prompt(cluster, demands);
        let response = self
            .llm
            .generate(&prompt, self.max_tokens)
            .map_err(|e| ClusterError::Llm(e.to_string()))?;

        let voices: BTreeSet<&str> = demands
            .iter()
            .flat_map(|d| d.voices().iter().map(String::as_str))
            .collect();
        let items: BTreeSet<ItemId> = demands.iter().flat_map(|d| d.item_ids().iter().copied()).collect();
        let cap = if voices.is_empty() { items.len() } else { voices.len() };

        let mut proposals = parse_proposals(&response)?;
        proposals.truncate(MAX_PROPOSALS);
        for proposal in &mut proposals {
            proposal.voices_represented = proposal.voices_represented.min(cap);
        }
        Ok(proposals)
    }
}

/// Run both phases on `cluster`, recording the results on it
///
/// Either phase failing leaves that phase's result empty; phase 2 is skipped
/// when phase 1 yields nothing.
pub fn enrich_cluster<L>(
    cluster: &mut Cluster,
    extractor: &DemandExtractor<'_, L>,
    synthesizer: &ActionSynthesizer<'_, L>,
) where
    L: LlmProvider,
    L::Error: Display,
{
    cluster.demands = extractor.extract(cluster).unwrap_or_else(|e| {
        warn!("Demand extraction failed for cluster {}: {}", cluster.id, e);
        Vec::new()
    });

    if cluster.demands.is_empty() {
        cluster.synthesized_actions = Vec::new();
        return;
    }

    cluster.synthesized_actions = synthesizer
        .synthesize(cluster, &cluster.demands)
        .unwrap_or_else(|e| {
            warn!("Action synthesis failed for cluster {}: {}", cluster.id, e);
            Vec::new()
        });
}
