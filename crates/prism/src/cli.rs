//! CLI argument parsing

use clap::{Parser, Subcommand};
use prism::config::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prism")]
#[command(about = "Generate serialization and language bindings from an annotated C++ header", long_about = None)]
#[command(after_help = "Use 'prism <command> --help' for more information about a command.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file (defaults to ./prism.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// The configuration path, and whether it was asked for explicitly
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate every artifact and patch the hand-maintained files
    #[command(visible_alias = "gen")]
    Generate {
        /// Header to read (overrides the configuration)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory for generated artifacts (overrides the configuration)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Show what would be written without writing anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Fail if any generated file is out of date
        #[arg(long, conflicts_with = "dry_run")]
        check: bool,

        /// Run the scanner on its own thread
        #[arg(long)]
        threaded: bool,
    },

    /// Print the token stream or the resolved header as JSON
    Dump {
        /// Header to read (overrides the configuration)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print tokens instead of the resolved header
        #[arg(short, long)]
        tokens: bool,
    },
}
