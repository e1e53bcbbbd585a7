//! Cluster command implementation.

use super::connect_llm;
use crate::cli::ClusterArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use cityvoice_cluster::{ClusterPipeline, ClusterReport};
use cityvoice_llm::AnyProvider;
use cityvoice_store::ProjectStore;

/// Execute the cluster command.
pub fn execute_cluster(
    args: ClusterArgs,
    store: &ProjectStore,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let llm = if args.no_llm {
        None
    } else {
        connect_llm(&config.pipeline.llm, false)?
    };
    let report = cluster_project(store, config, llm.as_ref())?;
    println!("{}", formatter.format_report(&report)?);
    println!(
        "{}",
        formatter.info(&format!("Report saved to {}", store.report_path().display()))
    );
    Ok(())
}

/// Run the pipeline over the project graph and persist graph and report.
pub fn cluster_project(
    store: &ProjectStore,
    config: &Config,
    llm: Option<&AnyProvider>,
) -> Result<ClusterReport> {
    let pipeline = ClusterPipeline::new(config.pipeline.clone(), llm)?;
    let mut doc = store.load_graph()?;
    let report = pipeline.run(&mut doc);
    store.save_graph(&doc)?;
    store.save_report(&report)?;
    Ok(report)
}
