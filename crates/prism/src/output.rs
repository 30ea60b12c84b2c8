//! Staging and committing generated files
//!
//! Backends produce everything in memory first. [`StagedOutput::prepare`]
//! reads every patch target and computes its new contents, so a missing
//! marker or unreadable file aborts the run before anything is written.
//! [`PreparedOutput::commit`] then writes generated artifacts before patched
//! files, each one through a temp file in the target's directory.

use crate::config::Patches;
use crate::emit::{Output, PatchTarget};
use crate::patch::Markers;
use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Backend output not yet checked against the file system
#[derive(Debug, Default)]
pub struct StagedOutput {
    output_dir: PathBuf,
    outputs: Vec<Output>,
}

impl StagedOutput {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into(), outputs: Vec::new() }
    }

    pub fn add(&mut self, output: Output) {
        self.outputs.push(output);
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Compute final contents for every file.
    ///
    /// Patch requests whose target is not configured are skipped.
    pub fn prepare(self, patches: &Patches, markers: &Markers) -> Result<PreparedOutput> {
        let mut names = BTreeSet::new();
        let mut artifacts = Vec::new();
        let mut patched = Vec::new();

        for output in self.outputs {
            for artifact in output.artifacts {
                if !names.insert(artifact.name.clone()) {
                    bail!("Two backends produced an artifact named '{}'", artifact.name);
                }
                artifacts.push(PendingWrite {
                    path: self.output_dir.join(&artifact.name),
                    contents: artifact.contents,
                });
            }

            for request in output.patches {
                let target = match request.target {
                    PatchTarget::TypeScript => patches.typescript.as_ref(),
                    PatchTarget::Java => patches.java.as_ref(),
                };
                let Some(path) = target else {
                    log::debug!("no {} file configured, skipping its patch", request.target);
                    continue;
                };
                let original = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {} file {}", request.target, path.display()))?;
                let contents = markers
                    .replace_region(&original, &request.contents)
                    .with_context(|| format!("Failed to patch {}", path.display()))?;
                patched.push(PendingWrite { path: path.clone(), contents });
            }
        }

        Ok(PreparedOutput { output_dir: self.output_dir, artifacts, patched })
    }
}

/// A file and the contents it should have
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub path: PathBuf,
    pub contents: String,
}

impl PendingWrite {
    /// Whether the file on disk already has these contents
    fn is_current(&self) -> bool {
        fs::read_to_string(&self.path).is_ok_and(|existing| existing == self.contents)
    }
}

/// Outcome of a commit
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct PreparedOutput {
    output_dir: PathBuf,
    artifacts: Vec<PendingWrite>,
    patched: Vec<PendingWrite>,
}

impl PreparedOutput {
    /// Every write in commit order: artifacts, then patched files
    pub fn writes(&self) -> impl Iterator<Item = &PendingWrite> {
        self.artifacts.iter().chain(self.patched.iter())
    }

    /// Files whose contents on disk differ from the prepared contents
    pub fn stale(&self) -> Vec<&Path> {
        self.writes().filter(|w| !w.is_current()).map(|w| w.path.as_path()).collect()
    }

    pub fn commit(self) -> Result<CommitSummary> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create output directory {}", self.output_dir.display()))?;

        let mut summary = CommitSummary::default();
        for write in self.writes() {
            if write.is_current() {
                log::debug!("{} is up to date", write.path.display());
                summary.unchanged.push(write.path.clone());
                continue;
            }
            write_atomic(&write.path, &write.contents)?;
            log::info!("wrote {}", write.path.display());
            summary.written.push(write.path.clone());
        }
        Ok(summary)
    }
}

/// Write through a temp file in the same directory, then rename over the target
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    temp.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write temp file for {}", path.display()))?;
    temp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
