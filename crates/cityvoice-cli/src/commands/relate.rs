//! Relate command implementation.

use super::connect_llm;
use crate::cli::RelateArgs;
use crate::config::{provider_from_env, resolve_provider, Config};
use crate::error::Result;
use crate::output::Formatter;
use cityvoice_cluster::{ClusterPipeline, RelationProvider};
use cityvoice_store::ProjectStore;

/// Execute the relate command.
pub fn execute_relate(
    args: RelateArgs,
    store: &ProjectStore,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    // Configuration problems surface before any item is processed
    let env_provider = provider_from_env();
    let provider = resolve_provider(
        args.provider.as_deref(),
        env_provider.as_deref(),
        config.pipeline.provider,
    )?;
    let mut pipeline_config = config.pipeline.clone();
    pipeline_config.provider = provider;

    let llm = match provider {
        RelationProvider::Llm => connect_llm(&pipeline_config.llm, true)?,
        RelationProvider::Keyword => None,
    };
    let pipeline = ClusterPipeline::new(pipeline_config, llm.as_ref())?;

    let mut doc = store.load_graph()?;
    let relations = pipeline.discover_relations(&doc.nodes)?;
    println!("{}", formatter.format_relations(&relations)?);

    if args.append {
        doc.append_edges(relations);
    } else if !doc.replace_edges(relations) {
        println!(
            "{}",
            formatter.warning("No connections found, preserving existing edges")
        );
    }
    store.save_graph(&doc)?;

    if args.export_csv {
        let path = store.export_connections_csv(&doc.edges)?;
        println!("{}", formatter.info(&format!("Wrote {}", path.display())));
    }

    Ok(())
}
