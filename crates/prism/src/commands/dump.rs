//! Dump command implementation

use anyhow::{Context, Result};
use prism::config::Config;
use prism::pipeline::{self, ScanMode};
use prism_ast::Lexer;
use std::fs;
use std::path::PathBuf;

/// Print the scanner's tokens or the resolved header as pretty JSON
pub fn dump(mut config: Config, input: Option<PathBuf>, tokens: bool) -> Result<()> {
    if let Some(input) = input {
        config.input = input;
    }

    let json = if tokens {
        let text = fs::read_to_string(&config.input)
            .with_context(|| format!("Failed to read input {}", config.input.display()))?;
        let tokens = Lexer::with_options(&text, pipeline::lexer_options(&config))
            .tokenize()
            .with_context(|| format!("Failed to scan {}", config.input.display()))?;
        serde_json::to_string_pretty(&tokens)?
    } else {
        let resolved = pipeline::load(&config, ScanMode::Inline)?;
        serde_json::to_string_pretty(&resolved)?
    };

    println!("{}", json);
    Ok(())
}
