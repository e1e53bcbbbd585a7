//! Relation discovery strategies

use crate::error::ClusterError;
use crate::parser::parse_related;
use crate::prompt::relation_prompt;
use crate::tokenize::{overlap_score, Tokenizer};
use cityvoice_domain::traits::{LlmProvider, RelationFinder};
use cityvoice_domain::{Item, ItemId, RelatedItem, Relation};
use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Default number of related items kept per target
pub const DEFAULT_MAX_RELATED: usize = 5;

/// Keyword-overlap relation finder
///
/// Deterministic and offline. Candidates are ranked by overlap coefficient;
/// equal scores keep list order.
#[derive(Debug, Clone)]
pub struct KeywordRelationFinder {
    tokenizer: Tokenizer,
    max_related: usize,
}

impl KeywordRelationFinder {
    /// Finder with the given tokenizer
    pub fn new(tokenizer: Tokenizer, max_related: usize) -> Self {
        Self {
            tokenizer,
            max_related,
        }
    }
}

impl Default for KeywordRelationFinder {
    fn default() -> Self {
        Self::new(Tokenizer::default(), DEFAULT_MAX_RELATED)
    }
}

impl RelationFinder for KeywordRelationFinder {
    type Error = Infallible;

    fn find_relations(&self, items: &[Item], target: &Item) -> Result<Vec<RelatedItem>, Self::Error> {
        let target_tokens = self.tokenizer.tokenize(&target.summary);
        if target_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f64, Vec<&String>, ItemId)> = Vec::new();
        for candidate in items {
            if candidate.id == target.id {
                continue;
            }
            let tokens = self.tokenizer.tokenize(&candidate.summary);
            if tokens.is_empty() {
                continue;
            }
            let mut shared: Vec<&String> = target_tokens.iter().filter(|t| tokens.contains(*t)).collect();
            if shared.is_empty() {
                continue;
            }
            shared.sort();
            scored.push((overlap_score(&target_tokens, &tokens), shared, candidate.id));
        }

        // sort_by is stable, so ties keep item order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(self.max_related)
            .map(|(_, shared, id)| {
                let keywords: Vec<&str> = shared.iter().map(|s| s.as_str()).collect();
                RelatedItem::new(id, format!("Shares keywords: {}", keywords.join(", ")))
            })
            .collect())
    }
}

/// Context-window relation finder
///
/// Sends every item plus the target to the completion provider and parses
/// the returned ids. Unknown ids, the target itself and repeats are dropped.
pub struct LlmRelationFinder<'a, L: LlmProvider> {
    llm: &'a L,
    max_tokens: u32,
    max_related: usize,
}

impl<'a, L: LlmProvider> LlmRelationFinder<'a, L> {
    /// Finder backed by `llm`
    pub fn new(llm: &'a L, max_tokens: u32, max_related: usize) -> Self {
        Self {
            llm,
            max_tokens,
            max_related,
        }
    }
}

impl<'a, L> RelationFinder for LlmRelationFinder<'a, L>
where
    L: LlmProvider,
    L::Error: Display,
{
    type Error = ClusterError;

    fn find_relations(&self, items: &[Item], target: &Item) -> Result<Vec<RelatedItem>, Self::Error> {
        let prompt = relation_prompt(items, target);
        let response = self
            .llm
            .generate(&prompt, self.max_tokens)
            .map_err(|e| ClusterError::Llm(e.to_string()))?;

        let known: HashSet<ItemId> = items.iter().map(|i| i.id).collect();
        let mut seen = HashSet::new();
        let related: Vec<RelatedItem> = parse_related(&response)?
            .into_iter()
            .filter(|r| r.id != target.id && known.contains(&r.id) && seen.insert(r.id))
            .take(self.max_related)
            .collect();

        debug!("Item {} related to {} items", target.id, related.len());
        Ok(related)
    }
}

/// Run `finder` for every item and collect directed relations
///
/// Items are processed one at a time in order. A failed lookup is logged and
/// that item contributes no relations; the run always completes.
pub fn discover_relations<F>(finder: &F, items: &[Item], context_window_threshold: usize) -> Vec<Relation>
where
    F: RelationFinder,
    F::Error: Display,
{
    if items.len() > context_window_threshold {
        warn!(
            "{} items exceeds the context-window threshold of {}; relation quality may degrade",
            items.len(),
            context_window_threshold
        );
    }

    let total = items.len();
    let mut relations = Vec::new();
    let mut failures = 0usize;

    for (i, item) in items.iter().enumerate() {
        let pct = i * 100 / total;
        info!("[{:3}%] Processing item {}/{}: @{}", pct, i + 1, total, item.username);

        match finder.find_relations(items, item) {
            Ok(related) => {
                relations.extend(related.into_iter().map(|r| r.into_relation(item.id)));
            }
            Err(e) => {
                failures += 1;
                warn!("Relation lookup failed for item {}: {}", item.id, e);
            }
        }
    }

    info!(
        "Found {} relations across {} items ({} failed lookups)",
        relations.len(),
        total,
        failures
    );
    relations
}

#[cfg(test)]
mod tests {
    use super::*;
    use cityvoice_llm::MockProvider;

    fn scenario() -> Vec<Item> {
        vec![
            Item::new(1, "alice", "wider sidewalks on 5th ave"),
            Item::new(2, "bob", "make sidewalks bigger downtown"),
            Item::new(3, "carol", "more police on buses"),
        ]
    }

    #[test]
    fn test_keyword_finder_shares_keywords() {
        let items = scenario();
        let finder = KeywordRelationFinder::default();
        let related = finder.find_relations(&items, &items[0]).unwrap();
        assert_eq!(related, vec![RelatedItem::new(2, "Shares keywords: sidewalks")]);
        assert!(finder.find_relations(&items, &items[2]).unwrap().is_empty());
    }

    #[test]
    fn test_keyword_finder_empty_target() {
        let mut items = scenario();
        items.push(Item::new(4, "dan", ""));
        let finder = KeywordRelationFinder::default();
        assert!(finder.find_relations(&items, &items[3]).unwrap().is_empty());
    }

    #[test]
    fn test_keyword_finder_reasons_across_candidates() {
        let items = vec![
            Item::new(1, "a", "trees and benches in the park"),
            Item::new(2, "b", "park benches need repair"),
            Item::new(3, "c", "plant trees along the park"),
        ];
        let finder = KeywordRelationFinder::default();

        let related = finder.find_relations(&items, &items[0]).unwrap();

        assert_eq!(
            related,
            vec![
                RelatedItem::new(2, "Shares keywords: benches, park"),
                RelatedItem::new(3, "Shares keywords: park, trees"),
            ]
        );
    }

    #[test]
    fn test_keyword_finder_ranks_and_truncates() {
        let target = Item::new(1, "a", "protected bike lanes downtown");
        let mut items = vec![target.clone()];
        items.push(Item::new(2, "b", "bike racks"));
        items.push(Item::new(3, "c", "protected bike lanes"));
        for id in 4..=10 {
            items.push(Item::new(id, "x", "bike parking"));
        }
        let finder = KeywordRelationFinder::default();
        let related = finder.find_relations(&items, &target).unwrap();
        assert_eq!(related.len(), DEFAULT_MAX_RELATED);
        assert_eq!(related[0].id, 3);
        assert_eq!(related[0].reason, "Shares keywords: bike, lanes, protected");
        // Equal scores keep list order
        assert_eq!(related[1].id, 2);
        assert_eq!(related[2].id, 4);
    }

    #[test]
    fn test_llm_finder_filters_ids() {
        let llm = MockProvider::new(
            r#"{"related": [{"id": 1, "reason": "self"}, {"id": 2, "reason": "sidewalks"}, {"id": 2, "reason": "dup"}, {"id": 99, "reason": "unknown"}]}"#,
        );
        let items = scenario();
        let finder = LlmRelationFinder::new(&llm, 1024, DEFAULT_MAX_RELATED);
        let related = finder.find_relations(&items, &items[0]).unwrap();
        assert_eq!(related, vec![RelatedItem::new(2, "sidewalks")]);
        assert_eq!(llm.call_count(), 1);
    }

    #[test]
    fn test_discover_continues_after_failure() {
        let mut llm = MockProvider::new(r#"{"related": [{"id": 1, "reason": "both sidewalks"}]}"#);
        llm.add_error("For item [1]");
        let items = scenario();
        let finder = LlmRelationFinder::new(&llm, 1024, DEFAULT_MAX_RELATED);

        let relations = discover_relations(&finder, &items, 100);

        assert_eq!(llm.call_count(), 3);
        assert_eq!(
            relations,
            vec![
                Relation::new(2, 1, "both sidewalks"),
                Relation::new(3, 1, "both sidewalks"),
            ]
        );
    }

    #[test]
    fn test_discover_with_malformed_response() {
        let llm = MockProvider::new("I could not find anything useful.");
        let items = scenario();
        let finder = LlmRelationFinder::new(&llm, 1024, DEFAULT_MAX_RELATED);
        assert!(discover_relations(&finder, &items, 100).is_empty());
    }

    #[test]
    fn test_discover_keyword_scenario() {
        let items = scenario();
        let relations = discover_relations(&KeywordRelationFinder::default(), &items, 100);
        assert_eq!(
            relations,
            vec![
                Relation::new(1, 2, "Shares keywords: sidewalks"),
                Relation::new(2, 1, "Shares keywords: sidewalks"),
            ]
        );
    }
}
