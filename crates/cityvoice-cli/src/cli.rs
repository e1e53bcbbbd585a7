//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Environment variable holding the project data directory
pub const DATA_PATH_ENV: &str = "CITYVOICE_DATA_PATH";

/// Environment variable overriding the relation provider
pub const PROVIDER_ENV: &str = "CITYVOICE_RELATION_PROVIDER";

/// CityVoice CLI - Discover and cluster civic suggestions.
#[derive(Debug, Parser)]
#[command(name = "cityvoice")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Project data directory
    #[arg(short, long, global = true, env = DATA_PATH_ENV, default_value = "data")]
    pub data: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import a legacy CSV export into the project
    Import(ImportArgs),

    /// Discover relations between items
    Relate(RelateArgs),

    /// Cluster items and label the clusters
    Cluster(ClusterArgs),

    /// Inspect and review items
    Items(ItemsArgs),

    /// Write a short markdown analysis of the graph
    Insights,

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the import command.
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// CSV file with Date,Username,Summary/Quote,Link columns
    pub file: PathBuf,

    /// Overwrite an existing graph
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the relate command.
#[derive(Debug, Parser)]
pub struct RelateArgs {
    /// Relation provider (llm or keyword)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Append to the existing edges instead of replacing them
    #[arg(long)]
    pub append: bool,

    /// Also write connections.csv
    #[arg(long)]
    pub export_csv: bool,
}

/// Arguments for the cluster command.
#[derive(Debug, Parser)]
pub struct ClusterArgs {
    /// Use rule-based labels only and skip demand extraction
    #[arg(long)]
    pub no_llm: bool,
}

/// Arguments for item review.
#[derive(Debug, Parser)]
pub struct ItemsArgs {
    #[command(subcommand)]
    pub action: ItemsAction,
}

/// Item review actions.
#[derive(Debug, Subcommand)]
pub enum ItemsAction {
    /// List items
    List {
        /// Only provisional items
        #[arg(long)]
        provisional: bool,
    },

    /// Add search results as provisional items
    Ingest {
        /// JSON array of {date, username, summary, link} rows
        file: PathBuf,
        /// Source tag recorded on each item
        #[arg(short, long, default_value = "search")]
        source: String,
    },

    /// Commit all provisional items
    Commit,

    /// Discard all provisional items and their edges
    Discard {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
