//! Binding generator CLI

use clap::Parser;
use prism::config::Config;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::*;

fn setup_logging(verbose: bool) {
    let opts = twyg::LoggerOpts {
        colored: true,
        file: "stderr".to_string(),
        level: if verbose { "debug" } else { "info" }.to_string(),
        report_caller: verbose,
    };
    if let Err(error) = twyg::setup_logger(&opts) {
        eprintln!("Could not set up logger: {:?}", error);
    }
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let (config_path, explicit) = cli.config_path();
    let config = match Config::load(&config_path, explicit) {
        Ok(config) => config,
        Err(e) => {
            prism::errors::print_error_with_suggestion(
                "Failed to load configuration",
                &e,
                &format!("Check '{}' or pass another file with --config", config_path.display()),
            );
            std::process::exit(1);
        }
    };

    // Execute the command
    let result = match cli.command {
        Commands::Generate { input, output_dir, dry_run, check, threaded } => generate(
            config,
            GenerateOptions { input, output_dir, dry_run, check, threaded },
        ),
        Commands::Dump { input, tokens } => dump(config, input, tokens),
    };

    if let Err(e) = result {
        prism::errors::print_error("Command failed", &e);
        std::process::exit(1);
    }
}
