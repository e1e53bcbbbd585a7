//! CityVoice Storage Layer
//!
//! Flat-file persistence for a project directory:
//!
//! - `connections.json`: the graph document (items, edges, topics, metadata)
//! - `connections.csv`: edge export (`source_id,target_id,reason`)
//! - `enhanced_clusters.json`: the latest cluster report
//!
//! Every save is a full overwrite; there is no incremental persistence.
//!
//! # Examples
//!
//! ```no_run
//! use cityvoice_store::ProjectStore;
//!
//! let store = ProjectStore::open("data/nyc").unwrap();
//! let doc = store.load_graph().unwrap();
//! println!("{} items, {} edges", doc.nodes.len(), doc.edges.len());
//! ```

#![warn(missing_docs)]

pub mod csv;
pub mod document;

use cityvoice_domain::Relation;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub use csv::{connections_to_csv, parse_legacy_csv};
pub use document::{GraphDocument, GraphMetadata, SearchRow, TopicSummary};

/// File name of the graph document inside a project directory
pub const GRAPH_FILE: &str = "connections.json";

/// File name of the edge CSV export
pub const CONNECTIONS_CSV_FILE: &str = "connections.csv";

/// File name of the cluster report
pub const REPORT_FILE: &str = "enhanced_clusters.json";

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected file does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// A project directory holding one dataset
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    /// Open (and create if needed) a project directory
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Project directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the graph document
    pub fn graph_path(&self) -> PathBuf {
        self.root.join(GRAPH_FILE)
    }

    /// Path of the cluster report
    pub fn report_path(&self) -> PathBuf {
        self.root.join(REPORT_FILE)
    }

    /// Path of the edge CSV export
    pub fn connections_csv_path(&self) -> PathBuf {
        self.root.join(CONNECTIONS_CSV_FILE)
    }

    /// Whether a graph document exists yet
    pub fn has_graph(&self) -> bool {
        self.graph_path().exists()
    }

    /// Load the graph document
    pub fn load_graph(&self) -> Result<GraphDocument, StoreError> {
        read_json(&self.graph_path())
    }

    /// Load the graph document, or an empty one if the project is new
    pub fn load_graph_or_default(&self) -> Result<GraphDocument, StoreError> {
        if self.has_graph() {
            self.load_graph()
        } else {
            Ok(GraphDocument::default())
        }
    }

    /// Overwrite the graph document
    pub fn save_graph(&self, doc: &GraphDocument) -> Result<(), StoreError> {
        write_json(&self.graph_path(), doc)?;
        info!(
            "Saved graph to {} ({} nodes, {} edges)",
            self.graph_path().display(),
            doc.nodes.len(),
            doc.edges.len()
        );
        Ok(())
    }

    /// Overwrite the cluster report
    pub fn save_report<T: Serialize>(&self, report: &T) -> Result<(), StoreError> {
        write_json(&self.report_path(), report)?;
        info!("Saved cluster report to {}", self.report_path().display());
        Ok(())
    }

    /// Load the cluster report
    pub fn load_report<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        read_json(&self.report_path())
    }

    /// Write the edges as CSV
    pub fn export_connections_csv(&self, edges: &[Relation]) -> Result<PathBuf, StoreError> {
        let path = self.connections_csv_path();
        fs::write(&path, connections_to_csv(edges))?;
        info!("Saved {} connections to {}", edges.len(), path.display());
        Ok(path)
    }
}

/// Read any JSON document from disk
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.display().to_string()));
    }
    let contents = fs::read_to_string(path)?;
    debug!("Read {} bytes from {}", contents.len(), path.display());
    Ok(serde_json::from_str(&contents)?)
}

/// Write any JSON document to disk, pretty-printed
///
/// The document goes to a sibling temp file first and is renamed into place.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load items from a legacy CSV export
pub fn load_csv(path: &Path) -> Result<GraphDocument, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.display().to_string()));
    }
    let contents = fs::read_to_string(path)?;
    let items = parse_legacy_csv(&contents);
    info!("Loaded {} items from {}", items.len(), path.display());
    Ok(GraphDocument::from_items(items))
}
