//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use cityvoice_cluster::ClusterReport;
use cityvoice_domain::Item;
use cityvoice_domain::Relation;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Summaries longer than this are truncated in tables
const SUMMARY_WIDTH: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a cluster report.
    pub fn format_report(&self, report: &ClusterReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Table => Ok(self.format_report_table(report)),
            OutputFormat::Quiet => Ok(report
                .by_size()
                .iter()
                .map(|c| c.name.clone())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format the report as a table, largest clusters first.
    fn format_report_table(&self, report: &ClusterReport) -> String {
        if report.clusters.is_empty() {
            return self.colorize("No clusters found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Name", "Topic", "Ideas", "Consensus", "Demands", "Proposals"]);

        for cluster in report.by_size() {
            builder.push_record([
                cluster.id.to_string(),
                cluster.name.clone(),
                cluster.topic.clone(),
                cluster.node_count.to_string(),
                cluster.consensus.to_string(),
                cluster.demands.len().to_string(),
                cluster.synthesized_actions.len().to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        format!(
            "{}\n{}",
            table,
            self.info(&format!(
                "{} ideas in {} clusters",
                report.total_ideas, report.total_clusters
            ))
        )
    }

    /// Format items.
    pub fn format_items(&self, items: &[&Item]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(items)?),
            OutputFormat::Table => Ok(self.format_items_table(items)),
            OutputFormat::Quiet => Ok(items
                .iter()
                .map(|i| i.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format items as a table.
    fn format_items_table(&self, items: &[&Item]) -> String {
        if items.is_empty() {
            return self.colorize("No items found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Status", "User", "Topic", "Summary"]);

        for item in items {
            builder.push_record([
                item.id.to_string(),
                item.status.to_string(),
                format!("@{}", item.username),
                item.topic.clone().unwrap_or_default(),
                truncate(&item.summary, SUMMARY_WIDTH),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format discovered relations.
    pub fn format_relations(&self, relations: &[Relation]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(relations)?),
            OutputFormat::Table | OutputFormat::Quiet => Ok(self.success(&format!(
                "Found {} connections",
                relations.len()
            ))),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cityvoice_domain::Cluster;

    fn report() -> ClusterReport {
        let small = Cluster::new(0, "Safety", vec![Item::new(3, "carol", "more police")]);
        let mut large = Cluster::new(
            1,
            "Sidewalks",
            vec![
                Item::new(1, "alice", "wider sidewalks"),
                Item::new(2, "bob", "sidewalk width"),
            ],
        );
        large.name = "Sidewalk Width Reform".to_string();
        ClusterReport::new(3, &[small, large])
    }

    #[test]
    fn test_report_table_sorted_by_size() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_report(&report()).unwrap();
        assert!(output.contains("Consensus"));
        let large = output.find("Sidewalk Width Reform").unwrap();
        let small = output.find("Safety").unwrap();
        assert!(large < small);
        assert!(output.contains("3 ideas in 2 clusters"));
    }

    #[test]
    fn test_report_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_report(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["total_clusters"], 2);
        assert_eq!(value["clusters"][1]["node_count"], 2);
    }

    #[test]
    fn test_quiet_items() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let a = Item::new(1, "alice", "x");
        let b = Item::new(2, "bob", "y");
        assert_eq!(formatter.format_items(&[&a, &b]).unwrap(), "1\n2");
    }

    #[test]
    fn test_empty_items() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_items(&[]).unwrap();
        assert!(output.contains("No items found"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}
