//! Keyword topic classification

use crate::config::{default_topics, TopicRule, OTHER_TOPIC};
use cityvoice_domain::Item;

/// Assigns each item exactly one coarse topic
///
/// The first rule (in table order) with a keyword occurring as a substring of
/// the lowercased summary wins; items matching nothing fall into `Other`.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<TopicRule>,
}

impl Classifier {
    /// Classifier over an ordered rule table
    pub fn new(rules: Vec<TopicRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|mut rule| {
                rule.keywords = rule.keywords.iter().map(|k| k.to_lowercase()).collect();
                rule
            })
            .collect();
        Self { rules }
    }

    /// Topic for a summary
    pub fn classify(&self, summary: &str) -> &str {
        let lowered = summary.to_lowercase();
        self.rules
            .iter()
            .find(|rule| {
                rule.keywords
                    .iter()
                    .any(|k| !k.is_empty() && lowered.contains(k.as_str()))
            })
            .map(|rule| rule.name.as_str())
            .unwrap_or(OTHER_TOPIC)
    }

    /// Group items by topic
    ///
    /// Groups appear in the order their topic is first seen and keep the
    /// items' relative order.
    pub fn group<'a>(&self, items: &'a [Item]) -> Vec<(String, Vec<&'a Item>)> {
        let mut groups: Vec<(String, Vec<&'a Item>)> = Vec::new();
        for item in items {
            let topic = self.classify(&item.summary);
            match groups.iter_mut().find(|(t, _)| t == topic) {
                Some((_, members)) => members.push(item),
                None => groups.push((topic.to_string(), vec![item])),
            }
        }
        groups
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(default_topics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_classify_examples() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("We need wider sidewalks downtown"), "Sidewalks");
        assert_eq!(classifier.classify("More police on buses"), "Safety");
        assert_eq!(classifier.classify("Dedicated bus lanes on 14th st"), "Transit");
        assert_eq!(classifier.classify("Allow ADUs citywide"), "Housing");
        assert_eq!(classifier.classify("Plant a community garden"), "Green Space");
        assert_eq!(classifier.classify(""), "Other");
        assert_eq!(classifier.classify("Fix the potholes"), "Other");
    }

    #[test]
    fn test_group_keeps_first_seen_order() {
        let items = vec![
            Item::new(1, "a", "wider sidewalks"),
            Item::new(2, "b", "more police"),
            Item::new(3, "c", "pedestrian crossings"),
            Item::new(4, "d", "potholes"),
        ];
        let groups = Classifier::default().group(&items);
        let topics: Vec<&str> = groups.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(topics, vec!["Sidewalks", "Safety", "Other"]);
        let ids: Vec<u64> = groups[0].1.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_custom_table_order_is_tie_break() {
        let rules = vec![
            TopicRule::new("Transit", "", &["bus"]),
            TopicRule::new("Safety", "", &["police"]),
        ];
        let classifier = Classifier::new(rules);
        assert_eq!(classifier.classify("More police on buses"), "Transit");
    }

    proptest! {
        #[test]
        fn prop_groups_partition_items(summaries in proptest::collection::vec("[a-z ]{0,30}", 0..20)) {
            let items: Vec<Item> = summaries
                .iter()
                .enumerate()
                .map(|(i, s)| Item::new(i as u64 + 1, "u", s.clone()))
                .collect();
            let classifier = Classifier::default();
            let groups = classifier.group(&items);

            let total: usize = groups.iter().map(|(_, m)| m.len()).sum();
            prop_assert_eq!(total, items.len());
            for (topic, members) in &groups {
                for item in members {
                    prop_assert_eq!(classifier.classify(&item.summary), topic.as_str());
                }
            }
        }
    }
}
