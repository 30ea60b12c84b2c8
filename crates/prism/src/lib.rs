//! Code generator for annotated C++ option headers
//!
//! This library reads a header with [`prism_ast`], runs the serialization,
//! JavaScript and Java backends over it and writes the results, patching the
//! generated regions of hand-maintained TypeScript and Java files.

pub mod config;
pub mod emit;
pub mod errors;
pub mod output;
pub mod patch;
pub mod pipeline;

pub use config::Config;
pub use emit::{Backend, EmitError, Output};
pub use output::{CommitSummary, PreparedOutput, StagedOutput};
pub use pipeline::ScanMode;

/// Re-export common error types
pub use anyhow::{Error, Result};
