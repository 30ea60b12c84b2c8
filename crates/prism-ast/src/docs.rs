//! Docstring index
//!
//! Comments never reach the parser as tokens. The lexer records them here,
//! keyed by the line they start on, so that later passes can look up the
//! documentation attached to a declaration by its line number.

use serde::Serialize;
use std::collections::BTreeMap;

/// A comment captured by the lexer, with its delimiters stripped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub line: usize,
    pub end_line: usize,
    pub text: String,
    /// Whether the comment follows code on its starting line
    pub trailing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocIndex {
    comments: BTreeMap<usize, Comment>,
}

impl DocIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a comment. Two comments starting on the same line are merged.
    pub fn insert(&mut self, comment: Comment) {
        match self.comments.get_mut(&comment.line) {
            Some(existing) => {
                if !comment.text.is_empty() {
                    if !existing.text.is_empty() {
                        existing.text.push('\n');
                    }
                    existing.text.push_str(&comment.text);
                }
                existing.end_line = existing.end_line.max(comment.end_line);
            }
            None => {
                self.comments.insert(comment.line, comment);
            }
        }
    }

    pub fn get(&self, line: usize) -> Option<&Comment> {
        self.comments.get(&line)
    }

    pub(crate) fn set_text(&mut self, line: usize, text: String) {
        if let Some(comment) = self.comments.get_mut(&line) {
            comment.text = text;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.comments.values()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Comments documenting a declaration that starts on `line`.
    ///
    /// That is the unbroken run of leading comments ending on the line above,
    /// followed by any comment starting on the declaration's own line. A
    /// comment trailing the previous declaration ends the run.
    pub fn for_declaration(&self, line: usize) -> Vec<&Comment> {
        let mut found = Vec::new();
        let mut expected_end = line.saturating_sub(1);
        for comment in self.comments.range(..line).rev().map(|(_, c)| c) {
            if comment.trailing || comment.end_line != expected_end {
                break;
            }
            found.push(comment);
            expected_end = comment.line.saturating_sub(1);
        }
        found.reverse();
        if let Some(own) = self.comments.get(&line) {
            found.push(own);
        }
        found
    }

    /// Joined documentation text for a declaration, if it has any
    pub fn doc_text(&self, line: usize) -> Option<String> {
        let text = self
            .for_declaration(line)
            .iter()
            .map(|c| c.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Strip comment delimiters and doxygen decorations from raw comment text
pub fn clean_comment(raw: &str) -> String {
    let body = if let Some(rest) = raw.strip_prefix("//") {
        rest.to_string()
    } else {
        let rest = raw.strip_prefix("/*").unwrap_or(raw);
        rest.strip_suffix("*/").unwrap_or(rest).to_string()
    };

    let lines: Vec<String> = body
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line.trim_start_matches(['/', '*', '!']);
            let line = line.strip_prefix('<').unwrap_or(line);
            line.trim().to_string()
        })
        .collect();

    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].join("\n"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(line: usize, end_line: usize, text: &str, trailing: bool) -> Comment {
        Comment { line, end_line, text: text.to_string(), trailing }
    }

    #[test]
    fn test_clean_line_comment() {
        assert_eq!(clean_comment("// hello"), "hello");
        assert_eq!(clean_comment("//!< intensity"), "intensity");
        assert_eq!(clean_comment("///< radius"), "radius");
    }

    #[test]
    fn test_clean_block_comment() {
        let raw = "/**\n     * First line\n     * Second line\n     */";
        assert_eq!(clean_comment(raw), "First line\nSecond line");
        assert_eq!(clean_comment("/* 0 == automatic */"), "0 == automatic");
    }

    #[test]
    fn test_leading_run_and_trailing() {
        let mut docs = DocIndex::new();
        docs.insert(comment(1, 1, "first", false));
        docs.insert(comment(2, 2, "second", false));
        docs.insert(comment(3, 3, "own", true));
        let found: Vec<&str> = docs.for_declaration(3).iter().map(|c| c.text.as_str()).collect();
        assert_eq!(found, vec!["first", "second", "own"]);
    }

    #[test]
    fn test_trailing_comment_of_previous_line_is_not_leading() {
        let mut docs = DocIndex::new();
        docs.insert(comment(4, 4, "belongs to line 4", true));
        assert!(docs.for_declaration(5).is_empty());
        assert_eq!(docs.doc_text(4).as_deref(), Some("belongs to line 4"));
    }

    #[test]
    fn test_blank_line_breaks_run() {
        let mut docs = DocIndex::new();
        docs.insert(comment(1, 2, "detached", false));
        assert!(docs.for_declaration(4).is_empty());
        assert_eq!(docs.doc_text(3).as_deref(), Some("detached"));
    }

    #[test]
    fn test_merge_same_line() {
        let mut docs = DocIndex::new();
        docs.insert(comment(7, 7, "a", true));
        docs.insert(comment(7, 7, "b", true));
        assert_eq!(docs.len(), 1);
        assert_eq!(docs.get(7).unwrap().text, "a\nb");
    }
}
