use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

/// schema-migrations: Development tool for migration definitions.
///
/// Validate, inspect, and dry-run schema migration files from the command line.
#[derive(Parser)]
#[command(name = "schema-migrations", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a definitions file and summarize it.
    Check {
        /// Path to the definitions file (.toml or .json).
        file: PathBuf,
    },

    /// Print the validated spec as JSON.
    Show {
        /// Path to the definitions file (.toml or .json).
        file: PathBuf,
    },

    /// Print the steps that migrate between two versions.
    Plan {
        /// Path to the definitions file (.toml or .json).
        file: PathBuf,

        /// Version the store is currently at.
        #[arg(long)]
        from: u32,

        /// Version to migrate to. Defaults to the newest version in the file.
        #[arg(long)]
        to: Option<u32>,
    },

    /// Rebuild an in-memory schema at `--from`, apply the plan and print the resulting tables.
    Simulate {
        /// Path to the definitions file (.toml or .json).
        file: PathBuf,

        /// Version the simulated store starts at.
        #[arg(long, default_value = "1")]
        from: u32,

        /// Version to migrate to. Defaults to the newest version in the file.
        #[arg(long)]
        to: Option<u32>,
    },
}

fn main() {
    colog::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { file } => commands::check(&file),
        Commands::Show { file } => commands::show(&file),
        Commands::Plan { file, from, to } => commands::plan(&file, from, to),
        Commands::Simulate { file, from, to } => commands::simulate(&file, from, to),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        let code = if e.is::<commands::Unsupported>() { 2 } else { 1 };
        process::exit(code);
    }
}
