//! Header to staged output
//!
//! Reads the input, parses and resolves it, then runs every backend in turn.
//! The first failing backend stops the run.

use crate::config::Config;
use crate::emit::{backends, EmitContext};
use crate::output::StagedOutput;
use anyhow::{Context, Result};
use prism_ast::{parse_str_threaded, parse_str_with, resolve, LexerOptions, Resolved};
use std::fs;

/// How the scanner feeds the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Pull tokens on the calling thread
    #[default]
    Inline,
    /// Run the scanner on its own thread behind a bounded queue
    Threaded,
}

pub fn lexer_options(config: &Config) -> LexerOptions {
    LexerOptions::with_extra_macros(config.ignored_macros.iter().cloned())
}

/// Parse and resolve header text
pub fn load_str(input: &str, config: &Config, mode: ScanMode) -> Result<Resolved> {
    let options = lexer_options(config);
    let parsed = match mode {
        ScanMode::Inline => parse_str_with(input, options),
        ScanMode::Threaded => parse_str_threaded(input, options, config.channel_capacity),
    }
    .with_context(|| format!("Failed to parse {}", config.input.display()))?;

    let resolved = resolve(parsed).with_context(|| format!("Invalid directive in {}", config.input.display()))?;
    log::debug!("resolved {} directives", resolved.directives.iter().count());
    Ok(resolved)
}

/// Read, parse and resolve the configured input
pub fn load(config: &Config, mode: ScanMode) -> Result<Resolved> {
    let input = fs::read_to_string(&config.input)
        .with_context(|| format!("Failed to read input {}", config.input.display()))?;
    log::debug!("read {} bytes from {}", input.len(), config.input.display());
    load_str(&input, config, mode)
}

/// Run every backend over a resolved header
pub fn emit(resolved: &Resolved, config: &Config) -> Result<StagedOutput> {
    let ctx = EmitContext::new(config, resolved);
    let mut staged = StagedOutput::new(&config.output_dir);
    for backend in backends() {
        log::debug!("running {} backend", backend.name());
        let output = backend.emit(resolved, &ctx)?;
        staged.add(output);
    }
    Ok(staged)
}

/// Read the configured input and produce every artifact and patch in memory
pub fn run(config: &Config, mode: ScanMode) -> Result<StagedOutput> {
    let resolved = load(config, mode)?;
    emit(&resolved, config)
}
