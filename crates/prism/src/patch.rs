//! Marker-delimited region replacement
//!
//! Hand-maintained files carry a generated region between two marker lines.
//! Only the lines strictly between the markers are replaced; the marker lines
//! themselves and every byte outside them are kept as they are.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Text identifying the marker lines. A line is a marker when it contains the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers {
    pub begin: String,
    pub end: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self { begin: "GENERATED CODE BEGIN".to_string(), end: "GENERATED CODE END".to_string() }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("Begin marker '{marker}' not found")]
    MissingBegin { marker: String },

    #[error("End marker '{marker}' not found after the begin marker")]
    MissingEnd { marker: String },

    #[error("Marker '{marker}' appears more than once (again at line {line})")]
    DuplicateMarker { marker: String, line: usize },

    #[error("End marker at line {line} comes before the begin marker")]
    EndBeforeBegin { line: usize },
}

impl Markers {
    /// Replace the region between the markers with `generated`.
    ///
    /// `generated` is inserted as-is, with a newline appended when it lacks
    /// one so the end marker stays on its own line.
    pub fn replace_region(&self, original: &str, generated: &str) -> Result<String, PatchError> {
        let lines: Vec<&str> = original.split_inclusive('\n').collect();

        let mut begin = None;
        let mut end = None;
        for (index, line) in lines.iter().enumerate() {
            let number = index + 1;
            if line.contains(&self.begin) {
                if begin.is_some() {
                    return Err(PatchError::DuplicateMarker { marker: self.begin.clone(), line: number });
                }
                begin = Some(index);
            } else if line.contains(&self.end) {
                if end.is_some() {
                    return Err(PatchError::DuplicateMarker { marker: self.end.clone(), line: number });
                }
                if begin.is_none() {
                    return Err(PatchError::EndBeforeBegin { line: number });
                }
                end = Some(index);
            }
        }

        let begin = begin.ok_or_else(|| PatchError::MissingBegin { marker: self.begin.clone() })?;
        let end = end.ok_or_else(|| PatchError::MissingEnd { marker: self.end.clone() })?;

        let mut patched = String::with_capacity(original.len() + generated.len());
        for line in &lines[..=begin] {
            patched.push_str(line);
        }
        if !patched.ends_with('\n') {
            patched.push('\n');
        }
        patched.push_str(generated);
        if !generated.is_empty() && !generated.ends_with('\n') {
            patched.push('\n');
        }
        for line in &lines[end..] {
            patched.push_str(line);
        }
        Ok(patched)
    }
}
