//! nestset CLI
//!
//! Command-line interface over a SQLite-backed nested-set tree

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nestset_core::errors::{ExError, Result};
use nestset_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "nestset")]
#[command(about = "nestset - nested-set tree indexing over a document store", long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = ".nestset/store.db")]
    db: PathBuf,

    /// Tree configuration (TOML); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a node
    Add(commands::mutate::AddArgs),
    /// Change fields of an existing node
    Update(commands::mutate::UpdateArgs),
    /// Remove nodes by field value
    Remove(commands::mutate::RemoveArgs),
    /// Recompute every node's coordinates
    Rebuild,
    /// Print the nested tree (JSON or HTML)
    Tree(commands::query::TreeArgs),
    /// List the ancestors of a node
    Parents(commands::query::ParentsArgs),
    /// List indented parent-picker options
    Options(commands::query::OptionsArgs),
    /// Verify the nested-set invariants
    Check,
}

/// Stack for the thread running the command
const COMMAND_STACK_SIZE: usize = 256 * 1024 * 1024;

fn run(context: &commands::Context, command: Commands) -> Result<()> {
    match command {
        Commands::Add(args) => commands::mutate::execute_add(context, args),
        Commands::Update(args) => commands::mutate::execute_update(context, args),
        Commands::Remove(args) => commands::mutate::execute_remove(context, args),
        Commands::Rebuild => commands::mutate::execute_rebuild(context),
        Commands::Tree(args) => commands::query::execute_tree(context, args),
        Commands::Parents(args) => commands::query::execute_parents(context, args),
        Commands::Options(args) => commands::query::execute_options(context, args),
        Commands::Check => commands::query::execute_check(context),
    }
}

fn main() {
    let cli = Cli::parse();
    init(if cli.log_json {
        Profile::Production
    } else {
        Profile::Development
    });

    let context = commands::Context {
        db: cli.db,
        config: cli.config,
    };

    // JSON output of `tree` nests one serializer frame per level
    let worker = std::thread::Builder::new()
        .name("nestset".to_string())
        .stack_size(COMMAND_STACK_SIZE)
        .spawn(move || run(&context, cli.command));
    let result = match worker.map(|handle| handle.join()) {
        Ok(Ok(result)) => result,
        _ => {
            eprintln!("Error: command thread failed");
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", ExError::from(e));
        std::process::exit(1);
    }
}
