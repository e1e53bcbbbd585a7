//! CityVoice CLI - Relation discovery and clustering for civic suggestions.

use cityvoice_cli::commands;
use cityvoice_cli::{Cli, Command, Config, Formatter};
use cityvoice_store::ProjectStore;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize tracing (log to stderr, stdout carries command output)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> cityvoice_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load config; a broken file is an error, a missing one means defaults
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)?;

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    // Handle commands
    let open_store = || ProjectStore::open(&cli.data);
    match cli.command {
        Command::Config(args) => commands::execute_config(args, &config_path, &config, &formatter),
        Command::Import(args) => commands::execute_import(args, &open_store()?, &formatter),
        Command::Relate(args) => commands::execute_relate(args, &open_store()?, &config, &formatter),
        Command::Cluster(args) => commands::execute_cluster(args, &open_store()?, &config, &formatter),
        Command::Items(args) => commands::execute_items(args, &open_store()?, &formatter),
        Command::Insights => commands::execute_insights(&open_store()?, &config),
    }
}
