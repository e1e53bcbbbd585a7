//! Items command implementation.

use crate::cli::{ItemsAction, ItemsArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use cityvoice_domain::Item;
use cityvoice_store::{ProjectStore, SearchRow};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Execute the items command.
pub fn execute_items(args: ItemsArgs, store: &ProjectStore, formatter: &Formatter) -> Result<()> {
    match args.action {
        ItemsAction::List { provisional } => list_items(store, provisional, formatter),
        ItemsAction::Ingest { file, source } => ingest_items(store, &file, &source, formatter),
        ItemsAction::Commit => commit_items(store, formatter),
        ItemsAction::Discard { yes } => discard_items(store, yes, formatter),
    }
}

/// List items, optionally only the provisional ones.
fn list_items(store: &ProjectStore, provisional: bool, formatter: &Formatter) -> Result<()> {
    let doc = store.load_graph()?;
    let items: Vec<&Item> = doc
        .nodes
        .iter()
        .filter(|item| !provisional || item.is_provisional())
        .collect();
    println!("{}", formatter.format_items(&items)?);
    Ok(())
}

/// Add search rows from a JSON file as provisional items.
fn ingest_items(store: &ProjectStore, file: &Path, source: &str, formatter: &Formatter) -> Result<()> {
    let rows: Vec<SearchRow> = serde_json::from_str(&fs::read_to_string(file)?)?;
    if rows.is_empty() {
        return Err(CliError::InvalidInput(format!("No rows in {}", file.display())));
    }

    let mut doc = store.load_graph_or_default()?;
    let ids = doc.ingest_rows(rows, source);
    store.save_graph(&doc)?;

    println!(
        "{}",
        formatter.success(&format!(
            "Added {} provisional item(s); commit or discard them after review",
            ids.len()
        ))
    );
    Ok(())
}

/// Commit every provisional item.
fn commit_items(store: &ProjectStore, formatter: &Formatter) -> Result<()> {
    let mut doc = store.load_graph()?;
    let count = doc.commit_provisional();
    if count == 0 {
        println!("{}", formatter.info("No provisional items to commit"));
        return Ok(());
    }
    store.save_graph(&doc)?;
    println!("{}", formatter.success(&format!("Committed {} item(s)", count)));
    Ok(())
}

/// Discard every provisional item and the edges touching them.
fn discard_items(store: &ProjectStore, yes: bool, formatter: &Formatter) -> Result<()> {
    let mut doc = store.load_graph()?;
    let pending = doc.provisional_count();
    if pending == 0 {
        println!("{}", formatter.info("No provisional items to discard"));
        return Ok(());
    }

    // Confirm deletion unless --yes is specified
    if !yes {
        print!("About to discard {} provisional item(s). Continue? [y/N] ", pending);
        io::stdout().flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;

        if !response.trim().eq_ignore_ascii_case("y") {
            println!("{}", formatter.info("Operation cancelled"));
            return Ok(());
        }
    }

    let removed = doc.discard_provisional();
    store.save_graph(&doc)?;
    println!("{}", formatter.success(&format!("Discarded {} item(s)", removed)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use cityvoice_domain::Relation;
    use cityvoice_store::GraphDocument;
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> ProjectStore {
        let store = ProjectStore::open(dir.path()).unwrap();
        store
            .save_graph(&GraphDocument::from_items(vec![Item::new(1, "alice", "wider sidewalks")]))
            .unwrap();
        let rows = r#"[
            {"date": "2025-02-01", "username": "bob", "summary": "sidewalk width", "link": "https://x.com/bob/status/9"},
            {"Date": "2025-02-02", "Username": "carol", "Summary/Quote": "more trees", "Link": ""}
        ]"#;
        fs::write(dir.path().join("rows.json"), rows).unwrap();
        store
    }

    #[test]
    fn test_ingest_then_commit() {
        let dir = TempDir::new().unwrap();
        let store = setup(&dir);
        let formatter = Formatter::new(OutputFormat::Table, false);

        ingest_items(&store, &dir.path().join("rows.json"), "search:nyc", &formatter).unwrap();
        let doc = store.load_graph().unwrap();
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.provisional_count(), 2);
        assert_eq!(doc.nodes[2].username, "carol");

        commit_items(&store, &formatter).unwrap();
        assert_eq!(store.load_graph().unwrap().provisional_count(), 0);
    }

    #[test]
    fn test_ingest_then_discard() {
        let dir = TempDir::new().unwrap();
        let store = setup(&dir);
        let formatter = Formatter::new(OutputFormat::Table, false);

        ingest_items(&store, &dir.path().join("rows.json"), "search:nyc", &formatter).unwrap();
        let mut doc = store.load_graph().unwrap();
        doc.edges.push(Relation::new(1, 2, "sidewalks"));
        store.save_graph(&doc).unwrap();

        discard_items(&store, true, &formatter).unwrap();
        let doc = store.load_graph().unwrap();
        assert_eq!(doc.nodes.len(), 1);
        assert!(doc.edges.is_empty());
    }
}
