//! End-to-end tests for the pipeline

#[cfg(test)]
mod tests {
    use crate::{ClusterError, ClusterPipeline, PipelineConfig, RelationProvider};
    use cityvoice_domain::{Consensus, Item, Relation, MISC_TOPIC_ID};
    use cityvoice_llm::MockProvider;
    use cityvoice_store::GraphDocument;

    fn scenario() -> GraphDocument {
        let mut doc = GraphDocument::from_items(vec![
            Item::new(1, "alice", "wider sidewalks on 5th ave"),
            Item::new(2, "bob", "make sidewalks bigger downtown"),
            Item::new(3, "carol", "more police on buses"),
        ]);
        doc.edges = vec![Relation::new(1, 2, "shares keywords: sidewalks")];
        doc
    }

    fn transit_doc() -> GraphDocument {
        let mut doc = GraphDocument::from_items(vec![
            Item::new(1, "alice", "bus lanes on 14th"),
            Item::new(2, "bob", "more frequent subway"),
            Item::new(3, "carol", "bus shelters with heat"),
            Item::new(4, "dan", "plant more trees"),
        ]);
        doc.edges = vec![Relation::new(1, 2, "transit"), Relation::new(2, 3, "transit")];
        doc
    }

    #[test]
    fn test_scenario_without_llm() {
        let pipeline = ClusterPipeline::<MockProvider>::new(PipelineConfig::default(), None).unwrap();
        let mut doc = scenario();
        let report = pipeline.run(&mut doc);

        assert_eq!(report.total_ideas, 3);
        assert_eq!(report.total_clusters, 2);
        assert_eq!(report.clusters[0].topic, "Sidewalks");
        assert_eq!(report.clusters[0].name, "Sidewalk Width Reform");
        assert_eq!(report.clusters[0].node_count, 2);
        assert_eq!(report.clusters[1].topic, "Safety");
        assert_eq!(report.clusters[1].name, "Public Safety");

        assert_eq!(doc.nodes[0].topic.as_deref(), Some("Sidewalks"));
        assert_eq!(doc.nodes[1].topic_id.as_deref(), Some("topic_0"));
        assert_eq!(doc.nodes[2].topic_label.as_deref(), Some("Public Safety"));
        let topics = doc.topics.as_ref().unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].count, 2);
    }

    #[test]
    fn test_scenario_small_clusters_skip_llm_labels() {
        let llm = MockProvider::new(r#"{"name": "LLM Name", "summary": "s", "action": "a", "consensus": "Low"}"#);
        let mut config = PipelineConfig::default();
        config.extract_demands = false;
        let pipeline = ClusterPipeline::new(config, Some(&llm)).unwrap();

        let report = pipeline.run(&mut scenario());

        assert_eq!(report.clusters[0].name, "Sidewalk Width Reform");
        assert_eq!(report.clusters[1].name, "Public Safety");
        assert_eq!(llm.call_count(), 0);
    }

    #[test]
    fn test_miscellaneous_enabled() {
        let llm = MockProvider::default();
        let mut config = PipelineConfig::default();
        config.miscellaneous_below = 2;
        let pipeline = ClusterPipeline::new(config, Some(&llm)).unwrap();

        let mut doc = scenario();
        let report = pipeline.run(&mut doc);

        assert_eq!(report.clusters[1].name, "Miscellaneous");
        assert_eq!(report.clusters[1].topic_id, MISC_TOPIC_ID);
        assert_eq!(doc.nodes[2].topic_id.as_deref(), Some(MISC_TOPIC_ID));
        // The pair still gets demand extraction; the singleton does not
        assert_eq!(llm.call_count(), 1);
    }

    #[test]
    fn test_llm_labels_and_demands() {
        let mut llm = MockProvider::default();
        llm.add_response(
            "Topic Category",
            r#"{"name": "Transit Upgrades", "summary": "Riders want service", "action": "Fund it", "consensus": "High"}"#,
        );
        llm.add_response(
            "Extract the distinct",
            r#"{"demands": [{"description": "More buses", "item_ids": [1, 3], "voices": ["alice", "carol"]}]}"#,
        );
        llm.add_response(
            "policy proposals",
            r#"{"proposals": [{"title": "Bus Plan", "proposal": "Add bus lanes and shelters", "supporting_demands": ["More buses"], "voices_represented": 2}]}"#,
        );
        let pipeline = ClusterPipeline::new(PipelineConfig::default(), Some(&llm)).unwrap();

        let report = pipeline.run(&mut transit_doc());

        let transit = &report.clusters[0];
        assert_eq!(transit.topic, "Transit");
        assert_eq!(transit.node_count, 3);
        assert_eq!(transit.name, "Transit Upgrades");
        assert_eq!(transit.consensus, Consensus::High);
        assert_eq!(transit.demands.len(), 1);
        assert_eq!(transit.demands[0].count(), 2);
        assert_eq!(transit.synthesized_actions[0].title, "Bus Plan");
    }

    #[test]
    fn test_llm_failures_never_abort() {
        let llm = MockProvider::new("this is not json");
        let pipeline = ClusterPipeline::new(PipelineConfig::default(), Some(&llm)).unwrap();

        let report = pipeline.run(&mut transit_doc());

        assert_eq!(report.total_clusters, 2);
        assert_eq!(report.clusters[0].name, "Bus Lane Expansion");
        assert!(report.clusters[0].demands.is_empty());
        assert!(report.clusters[0].synthesized_actions.is_empty());
    }

    #[test]
    fn test_llm_provider_requires_backend() {
        let mut config = PipelineConfig::default();
        config.provider = RelationProvider::Llm;
        let pipeline = ClusterPipeline::<MockProvider>::new(config, None).unwrap();
        let doc = scenario();
        assert!(matches!(
            pipeline.discover_relations(&doc.nodes),
            Err(ClusterError::MissingCredential(_))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = PipelineConfig::default();
        config.label_sample_limit = 0;
        assert!(matches!(
            ClusterPipeline::<MockProvider>::new(config, None),
            Err(ClusterError::Config(_))
        ));
    }

    #[test]
    fn test_single_item_finds_no_relations() {
        let pipeline = ClusterPipeline::<MockProvider>::new(PipelineConfig::default(), None).unwrap();
        let items = vec![Item::new(1, "alice", "wider sidewalks")];
        assert!(pipeline.discover_relations(&items).unwrap().is_empty());
    }

    #[test]
    fn test_rerun_overwrites_previous_tags() {
        let pipeline = ClusterPipeline::<MockProvider>::new(PipelineConfig::default(), None).unwrap();
        let mut doc = scenario();
        pipeline.run(&mut doc);
        doc.nodes[2].summary = "plant trees in the park".to_string();
        pipeline.run(&mut doc);
        assert_eq!(doc.nodes[2].topic.as_deref(), Some("Green Space"));
        assert_eq!(doc.nodes[2].topic_label.as_deref(), Some("Green Infrastructure"));
    }
}
