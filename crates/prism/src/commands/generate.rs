//! Generate command implementation

use anyhow::{bail, Result};
use colored::*;
use prism::config::Config;
use prism::errors::print_warning;
use prism::pipeline::{self, ScanMode};
use std::path::PathBuf;

/// Command line overrides and modes for `generate`
#[derive(Debug, Default)]
pub struct GenerateOptions {
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub dry_run: bool,
    pub check: bool,
    pub threaded: bool,
}

pub fn generate(mut config: Config, options: GenerateOptions) -> Result<()> {
    if let Some(input) = options.input {
        config.input = input;
    }
    if let Some(output_dir) = options.output_dir {
        config.output_dir = output_dir;
    }
    if config.patches.typescript.is_none() {
        print_warning("No TypeScript declaration file configured; its generated region is left alone");
    }
    if config.patches.java.is_none() {
        print_warning("No Java file configured; its generated region is left alone");
    }

    let mode = if options.threaded { ScanMode::Threaded } else { ScanMode::Inline };
    let staged = pipeline::run(&config, mode)?;
    let prepared = staged.prepare(&config.patches, &config.markers)?;

    if options.check {
        let stale = prepared.stale();
        if stale.is_empty() {
            println!("{} All generated files are up to date", "✓".green());
            return Ok(());
        }
        for path in &stale {
            println!("  {} {}", "stale".yellow(), path.display());
        }
        bail!("{} generated file(s) are out of date; run 'prism generate'", stale.len());
    }

    if options.dry_run {
        println!("\n{}\n", "Dry run, nothing is written".bold());
        let stale = prepared.stale();
        for write in prepared.writes() {
            let status = if stale.contains(&write.path.as_path()) {
                "would write".cyan()
            } else {
                "unchanged".dimmed()
            };
            println!("  {} {} ({} bytes)", status, write.path.display(), write.contents.len());
        }
        return Ok(());
    }

    let summary = prepared.commit()?;
    for path in &summary.written {
        println!("  {} {}", "wrote".green(), path.display());
    }
    println!(
        "\n{} {} written, {} unchanged",
        "✓".green().bold(),
        summary.written.len(),
        summary.unchanged.len()
    );
    Ok(())
}
