//! Insights command implementation.

use super::connect_llm;
use crate::config::Config;
use crate::error::Result;
use cityvoice_cluster::{InsightWriter, NO_IDEAS_MESSAGE};
use cityvoice_store::ProjectStore;

/// Execute the insights command.
pub fn execute_insights(store: &ProjectStore, config: &Config) -> Result<()> {
    let doc = store.load_graph()?;
    if doc.nodes.is_empty() {
        println!("{}", NO_IDEAS_MESSAGE);
        return Ok(());
    }
    let Some(llm) = connect_llm(&config.pipeline.llm, true)? else {
        return Ok(());
    };
    let writer = InsightWriter::new(
        &llm,
        config.pipeline.insight_sample_limit,
        config.pipeline.insight_max_tokens,
    );
    println!("{}", writer.write(&doc)?);
    Ok(())
}
