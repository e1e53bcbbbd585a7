//! Import command implementation.

use crate::cli::ImportArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use cityvoice_store::{load_csv, ProjectStore};

/// Execute the import command.
pub fn execute_import(args: ImportArgs, store: &ProjectStore, formatter: &Formatter) -> Result<()> {
    if store.has_graph() && !args.force {
        return Err(CliError::NotPermitted(format!(
            "{} already exists; use --force to overwrite",
            store.graph_path().display()
        )));
    }

    let doc = load_csv(&args.file)?;
    if doc.nodes.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "No items found in {}",
            args.file.display()
        )));
    }

    store.save_graph(&doc)?;
    println!(
        "{}",
        formatter.success(&format!(
            "Imported {} items into {}",
            doc.nodes.len(),
            store.graph_path().display()
        ))
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("input.csv");
        fs::write(
            &path,
            "Date,Username,Summary/Quote,Link\n\
             2025-01-02,alice,Wider sidewalks, please,https://x.com/alice/status/1\n\
             2025-01-03,bob,More police on buses,https://x.com/bob/status/2\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_import_and_refuse_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = ProjectStore::open(dir.path().join("project")).unwrap();
        let formatter = Formatter::new(OutputFormat::Table, false);
        let file = write_csv(&dir);

        execute_import(ImportArgs { file: file.clone(), force: false }, &store, &formatter).unwrap();
        let doc = store.load_graph().unwrap();
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[0].summary, "Wider sidewalks, please");

        let again = execute_import(ImportArgs { file: file.clone(), force: false }, &store, &formatter);
        assert!(matches!(again, Err(CliError::NotPermitted(_))));
        assert!(execute_import(ImportArgs { file, force: true }, &store, &formatter).is_ok());
    }
}
