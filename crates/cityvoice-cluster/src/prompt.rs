//! Prompt construction for the LLM-backed strategies

use cityvoice_domain::{Cluster, Demand, Item};

const RELATION_INSTRUCTIONS: &str = r#"Find the TOP 3-5 most related items from the list. Items are related if they:
- Address the same topic (housing, transit, sidewalks, safety, etc.)
- Propose complementary or conflicting solutions
- Could be combined into a larger initiative
- Share geographic focus

Respond in JSON format only:
{
  "related": [
    {"id": <number>, "reason": "<brief reason for relation>"}
  ]
}

Only include items that have meaningful connections. If fewer than 3 items are related, that's fine."#;

const LABEL_INSTRUCTIONS: &str = r#"Please provide:
1. A concise cluster name (3-5 words) that captures the core theme
2. A one-sentence summary of what these people are advocating for
3. The key actionable recommendation for city officials (1-2 sentences)
4. The level of consensus (High/Medium/Low) - are people saying the same thing or related but different things?

Format your response as JSON:
{
    "name": "...",
    "summary": "...",
    "action": "...",
    "consensus": "..."
}"#;

const DEMAND_INSTRUCTIONS: &str = r#"Extract the distinct, actionable demands expressed above.
- Merge ideas that ask for the same thing in different words into ONE demand.
- Each demand lists every idea id that expresses it and the handles of the people behind it.
- Skip venting or commentary that does not ask for anything.

Respond in JSON format only:
{
  "demands": [
    {"description": "<the ask, one sentence>", "item_ids": [<number>, ...], "voices": ["<handle>", ...]}
  ]
}"#;

const SYNTHESIS_INSTRUCTIONS: &str = r#"Write 1-3 concrete policy proposals a city council could vote on.
- Combine related demands where it makes sense.
- Be specific: what changes, where, and who is responsible.
- Count the distinct voices each proposal represents.

Respond in JSON format only:
{
  "proposals": [
    {"title": "<short title>", "proposal": "<full proposal text>", "supporting_demands": ["<demand description>", ...], "voices_represented": <number>}
  ]
}"#;

const INSIGHT_INSTRUCTIONS: &str = r#"Write a short markdown report (at most 250 words) with three sections:
## Themes
The main themes and how many people raise them.
## Tensions
Ideas that conflict or compete for the same resources.
## Next actions
Concrete next steps for city staff."#;

/// One item as a prompt line: `[id] @user: summary`
pub fn format_item(item: &Item) -> String {
    format!("[{}] @{}: {}", item.id, item.username, item.summary)
}

/// Prompt asking which of `items` relate to `target`
pub fn relation_prompt(items: &[Item], target: &Item) -> String {
    let listing: Vec<String> = items.iter().map(format_item).collect();
    format!(
        "You are analyzing urban planning suggestions/issues from social media.\n\n\
         Here are all the items:\n{}\n\n\
         For item [{}] \"@{}: {}\"\n\n{}",
        listing.join("\n"),
        target.id,
        target.username,
        target.summary,
        RELATION_INSTRUCTIONS
    )
}

/// Prompt asking for a cluster's name, summary, action and consensus
pub fn label_prompt(cluster: &Cluster, sample_limit: usize) -> String {
    let ideas: Vec<String> = cluster
        .nodes
        .iter()
        .take(sample_limit)
        .map(|n| format!("- @{}: {}", n.username, summary_or_placeholder(n)))
        .collect();
    format!(
        "Analyze this cluster of urban improvement ideas from residents.\n\n\
         Topic Category: {}\n\n\
         Ideas in this cluster:\n{}\n\n{}",
        cluster.topic,
        ideas.join("\n"),
        LABEL_INSTRUCTIONS
    )
}

/// Prompt asking for the deduplicated demands of a cluster
pub fn demand_prompt(cluster: &Cluster, sample_limit: usize) -> String {
    let ideas: Vec<String> = cluster
        .nodes
        .iter()
        .take(sample_limit)
        .map(|n| format!("[{}] @{}: {}", n.id, n.username, summary_or_placeholder(n)))
        .collect();
    format!(
        "These ideas were grouped under \"{}\" ({}).\n\n{}\n\n{}",
        cluster.name,
        cluster.topic,
        ideas.join("\n"),
        DEMAND_INSTRUCTIONS
    )
}

/// Prompt asking for proposals that combine `demands`
pub fn synthesis_prompt(cluster: &Cluster, demands: &[Demand]) -> String {
    let listing: Vec<String> = demands
        .iter()
        .map(|d| format!("- {} ({} voices)", d.description(), d.count()))
        .collect();
    format!(
        "Residents in the \"{}\" group made these demands:\n{}\n\n{}",
        cluster.name,
        listing.join("\n"),
        SYNTHESIS_INSTRUCTIONS
    )
}

/// One sampled connection for the insights prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSnippet<'a> {
    /// Handle of the source item's author
    pub source: &'a str,
    /// Handle of the target item's author
    pub target: &'a str,
    /// Why they are related
    pub reason: &'a str,
}

/// Prompt asking for a markdown analysis of sampled items and connections
pub fn insight_prompt(
    context: &str,
    total_items: usize,
    items: &[&Item],
    connections: &[ConnectionSnippet<'_>],
) -> String {
    let mut prompt = format!(
        "You are an urban planning analyst reviewing {} public suggestions ({} context).\n\n",
        total_items, context
    );
    prompt.push_str("Here are representative posts:\n");
    for item in items {
        prompt.push_str(&format!(
            "- [{}] @{}: {}\n",
            item.date,
            item.username,
            summary_or_placeholder(item)
        ));
    }
    if !connections.is_empty() {
        prompt.push_str("\nKey connections found between ideas:\n");
        for c in connections {
            prompt.push_str(&format!("- @{} <-> @{}: {}\n", c.source, c.target, c.reason));
        }
    }
    prompt.push('\n');
    prompt.push_str(INSIGHT_INSTRUCTIONS);
    prompt
}

fn summary_or_placeholder(item: &Item) -> &str {
    if item.summary.trim().is_empty() {
        "No summary"
    } else {
        &item.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_prompt_lists_items_and_target() {
        let items = vec![Item::new(1, "alice", "wider sidewalks"), Item::new(2, "bob", "bus lanes")];
        let prompt = relation_prompt(&items, &items[1]);
        assert!(prompt.contains("[1] @alice: wider sidewalks"));
        assert!(prompt.contains("For item [2] \"@bob: bus lanes\""));
        assert!(prompt.contains("\"related\""));
    }

    #[test]
    fn test_label_prompt_respects_sample_limit() {
        let nodes: Vec<Item> = (1..=5).map(|i| Item::new(i, format!("u{}", i), "idea")).collect();
        let cluster = Cluster::new(0, "Transit", nodes);
        let prompt = label_prompt(&cluster, 2);
        assert!(prompt.contains("@u1"));
        assert!(prompt.contains("@u2"));
        assert!(!prompt.contains("@u3"));
        assert!(prompt.contains("Topic Category: Transit"));
    }

    #[test]
    fn test_empty_summary_placeholder() {
        let cluster = Cluster::new(0, "Other", vec![Item::new(7, "zed", "")]);
        assert!(demand_prompt(&cluster, 10).contains("[7] @zed: No summary"));
    }

    #[test]
    fn test_synthesis_prompt_lists_demands() {
        let cluster = Cluster::new(0, "Sidewalks", vec![]);
        let demands = vec![Demand::new("Widen sidewalks", [1u64, 2], ["a", "b"])];
        let prompt = synthesis_prompt(&cluster, &demands);
        assert!(prompt.contains("- Widen sidewalks (2 voices)"));
    }
}
