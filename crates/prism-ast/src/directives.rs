//! Emitter directives
//!
//! A directive is a `%name%` marker inside a comment. The resolver reads the
//! comments attached to each declaration, records the recognized flags in a
//! table keyed by the declaration's line and name, and removes the markers
//! from the comment text so they never show up in generated documentation.

use crate::ast::*;
use crate::docs::DocIndex;
use crate::error::DirectiveError;
use crate::parser::ParseOutput;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(u8);

impl Flags {
    pub const NONE: Flags = Flags(0);
    /// `%codegen_skip_json%`
    pub const SKIP_SERIALIZATION: Flags = Flags(1);
    /// `%codegen_skip_javascript%`
    pub const SKIP_DYNAMIC_BINDING: Flags = Flags(1 << 1);
    /// `%codegen_java_flatten%`, recognized but not acted on
    pub const FLATTEN: Flags = Flags(1 << 2);
    /// `%codegen_java_float%`
    pub const NARROW_FLOAT: Flags = Flags(1 << 3);

    const VOCABULARY: [(&'static str, Flags); 4] = [
        ("codegen_skip_json", Flags::SKIP_SERIALIZATION),
        ("codegen_skip_javascript", Flags::SKIP_DYNAMIC_BINDING),
        ("codegen_java_flatten", Flags::FLATTEN),
        ("codegen_java_float", Flags::NARROW_FLOAT),
    ];

    /// Every recognized directive name, in flag order
    pub fn directive_names() -> impl Iterator<Item = &'static str> {
        Self::VOCABULARY.iter().map(|(name, _)| *name)
    }

    pub fn from_directive(name: &str) -> Option<Flags> {
        Self::VOCABULARY.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
    }

    pub fn contains(self, other: Flags) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Directive names of the set flags
    pub fn names(self) -> Vec<&'static str> {
        Self::VOCABULARY.iter().filter(|(_, f)| self.contains(*f)).map(|(n, _)| *n).collect()
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join("|"))
    }
}

impl serde::Serialize for Flags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

/// Flags per annotated declaration, keyed by `(line, name)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    entries: BTreeMap<(Line, String), Flags>,
}

impl Directives {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, line: Line, name: &str, flags: Flags) {
        if flags.is_empty() {
            return;
        }
        *self.entries.entry((line, name.to_string())).or_default() |= flags;
    }

    /// Flags of one declaration; empty when it has none
    pub fn get(&self, line: Line, name: &str) -> Flags {
        self.entries.get(&(line, name.to_string())).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Line, &str, Flags)> {
        self.entries.iter().map(|((line, name), flags)| (*line, name.as_str(), *flags))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl serde::Serialize for Directives {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct Entry<'a> {
            line: Line,
            name: &'a str,
            flags: Flags,
        }
        serializer.collect_seq(self.iter().map(|(line, name, flags)| Entry { line, name, flags }))
    }
}

/// A parsed header with directives applied
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Resolved {
    pub root: Root,
    pub docs: DocIndex,
    pub directives: Directives,
}

impl Resolved {
    /// Documentation for the declaration on `line`, markers removed
    pub fn doc(&self, line: Line) -> Option<String> {
        self.docs.doc_text(line)
    }
}

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"%([A-Za-z_][A-Za-z0-9_]*)%").unwrap())
}

/// Attach directives to declarations and strip them from comments.
///
/// Every marker in every comment must be recognized, including comments that
/// document nothing. Group comments are the only part of the AST rewritten.
pub fn resolve(parsed: ParseOutput) -> Result<Resolved, DirectiveError> {
    let ParseOutput { mut root, mut docs } = parsed;

    let mut cleaned = Vec::new();
    for comment in docs.iter() {
        if !comment.text.contains('%') {
            continue;
        }
        check_markers(&comment.text, comment.line)?;
        cleaned.push((comment.line, strip_markers(&comment.text)));
    }
    clean_namespace_groups(&mut root.namespace)?;

    let mut collector = Collector { docs: &docs, directives: Directives::new() };
    collector.namespace(&root.namespace);
    let directives = collector.directives;

    for (line, text) in cleaned {
        docs.set_text(line, text);
    }
    log::debug!("resolved {} annotated declarations", directives.len());

    Ok(Resolved { root, docs, directives })
}

/// Fail on the first marker that names no known directive
fn check_markers(text: &str, line: Line) -> Result<(), DirectiveError> {
    for captures in marker_regex().captures_iter(text) {
        let name = &captures[1];
        if Flags::from_directive(name).is_none() {
            return Err(DirectiveError::Unknown { name: name.to_string(), line });
        }
    }
    Ok(())
}

// Group comments (`/** @{ */`) become tokens rather than docs, so their
// markers are checked and stripped in the tree itself.
fn clean_namespace_groups(namespace: &mut Namespace) -> Result<(), DirectiveError> {
    for child in &mut namespace.children {
        match child {
            Decl::Namespace(n) => clean_namespace_groups(n)?,
            Decl::Class(c) => clean_groups(&mut c.members)?,
            Decl::Struct(s) => clean_groups(&mut s.members)?,
            Decl::Enum(_) => {}
        }
    }
    Ok(())
}

fn clean_groups(members: &mut [Member]) -> Result<(), DirectiveError> {
    for member in members {
        match member {
            Member::Group(group) if group.doc.contains('%') => {
                check_markers(&group.doc, group.line)?;
                group.doc = strip_markers(&group.doc);
            }
            Member::Class(c) => clean_groups(&mut c.members)?,
            Member::Struct(s) => clean_groups(&mut s.members)?,
            _ => {}
        }
    }
    Ok(())
}

/// Remove markers, collapse runs of spaces and drop lines left empty
pub fn strip_markers(text: &str) -> String {
    let stripped = marker_regex().replace_all(text, "");
    stripped
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

struct Collector<'a> {
    docs: &'a DocIndex,
    directives: Directives,
}

impl Collector<'_> {
    /// Type declarations only take directives from the comments above them;
    /// a comment on their opening line belongs to the first member.
    fn declaration(&mut self, line: Line, name: &str, is_type: bool) {
        let mut flags = Flags::NONE;
        let comments = self.docs.for_declaration(line);
        for comment in comments.iter().filter(|c| !is_type || c.line < line) {
            for captures in marker_regex().captures_iter(&comment.text) {
                flags |= Flags::from_directive(&captures[1]).unwrap_or_default();
            }
        }
        if flags.contains(Flags::FLATTEN) {
            log::warn!(
                "'%codegen_java_flatten%' on '{}' at line {} is reserved and has no effect",
                name,
                line
            );
        }
        self.directives.insert(line, name, flags);
    }

    fn namespace(&mut self, namespace: &Namespace) {
        self.declaration(namespace.line, &namespace.name, true);
        for child in &namespace.children {
            match child {
                Decl::Namespace(n) => self.namespace(n),
                Decl::Class(c) => self.class(c),
                Decl::Struct(s) => self.record(s),
                Decl::Enum(e) => self.declaration(e.line, &e.name, true),
            }
        }
    }

    fn class(&mut self, class: &Class) {
        self.declaration(class.line, &class.name, true);
        self.members(&class.members);
    }

    fn record(&mut self, record: &Struct) {
        self.declaration(record.line, struct_key(record), true);
        self.members(&record.members);
    }

    fn members(&mut self, members: &[Member]) {
        for member in members {
            match member {
                Member::Field(f) => self.declaration(f.line, &f.name, false),
                Member::Class(c) => self.class(c),
                Member::Struct(s) => self.record(s),
                Member::Enum(e) => self.declaration(e.line, &e.name, true),
                Member::Access(_) | Member::Group(_) | Member::Using(_) | Member::Method(_) => {}
            }
        }
    }
}

/// Name a struct is recorded under: its type name, else its instance name
pub fn struct_key(record: &Struct) -> &str {
    record.name.as_deref().or(record.instance_name.as_deref()).unwrap_or("")
}
