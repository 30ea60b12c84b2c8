//! Code emission
//!
//! Every backend consumes the same [`Resolved`] header and produces generated
//! artifacts plus requests to patch hand-maintained files. Backends are pure:
//! they never touch the file system, so a failure in any of them leaves
//! nothing half written.

pub mod fields;
pub mod java;
pub mod javascript;
pub mod literal;
pub mod naming;
pub mod serialization;
pub mod types;
pub mod writer;

use crate::config::{Config, Outputs};
use naming::TypePath;
use prism_ast::ast::*;
use prism_ast::{Flags, Resolved};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use types::TypeTable;

/// A generated file, named relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub contents: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PatchTarget {
    TypeScript,
    Java,
}

impl fmt::Display for PatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchTarget::TypeScript => write!(f, "typescript"),
            PatchTarget::Java => write!(f, "java"),
        }
    }
}

/// New contents for the generated region of a hand-maintained file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    pub target: PatchTarget,
    pub contents: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub artifacts: Vec<Artifact>,
    pub patches: Vec<PatchRequest>,
}

impl Output {
    pub fn artifact(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }

    pub fn patch(&self, target: PatchTarget) -> Option<&PatchRequest> {
        self.patches.iter().find(|p| p.target == target)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmitError {
    #[error("{backend} backend cannot map type '{type_text}' of field '{field}' at line {line}")]
    UnmappableType { backend: &'static str, type_text: String, field: String, line: Line },

    #[error("{backend} backend cannot translate default '{value}' of field '{field}' at line {line}")]
    UnmappableDefault { backend: &'static str, value: String, field: String, line: Line },
}

/// Settings shared by every backend
pub struct EmitContext {
    /// File name of the input header, as included by generated C++
    pub header_name: String,
    pub outputs: Outputs,
    pub js_module: String,
    pub java_host_class: Option<String>,
    pub types: TypeTable,
}

impl EmitContext {
    pub fn new(config: &Config, resolved: &Resolved) -> Self {
        let header_name = config
            .input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            header_name,
            outputs: config.outputs.clone(),
            js_module: config.js_module.clone(),
            java_host_class: config.patches.java_host_class.clone(),
            types: TypeTable::build(&resolved.root, &config.aliases),
        }
    }
}

pub trait Backend {
    fn name(&self) -> &'static str;

    fn emit(&self, resolved: &Resolved, ctx: &EmitContext) -> Result<Output, EmitError>;
}

/// All backends, in the order they run
pub fn backends() -> Vec<Box<dyn Backend>> {
    vec![
        Box::new(serialization::SerializationBackend),
        Box::new(javascript::JavaScriptBackend),
        Box::new(java::JavaBackend),
    ]
}

/// A struct or class with a name
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    pub line: Line,
    pub name: &'a str,
    pub members: &'a [Member],
    pub is_class: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum TypeDecl<'a> {
    Record(RecordView<'a>),
    Enum(&'a Enum),
}

#[derive(Debug, Clone)]
pub struct Visit<'a> {
    pub path: TypePath,
    pub decl: TypeDecl<'a>,
    /// Own flags plus those of every enclosing namespace and type
    pub flags: Flags,
    /// Number of enclosing records
    pub depth: usize,
}

impl<'a> Visit<'a> {
    pub fn line(&self) -> Line {
        match &self.decl {
            TypeDecl::Record(r) => r.line,
            TypeDecl::Enum(e) => e.line,
        }
    }

    pub fn record(&self) -> Option<&RecordView<'a>> {
        match &self.decl {
            TypeDecl::Record(r) => Some(r),
            TypeDecl::Enum(_) => None,
        }
    }

    pub fn as_enum(&self) -> Option<&'a Enum> {
        match self.decl {
            TypeDecl::Enum(e) => Some(e),
            TypeDecl::Record(_) => None,
        }
    }
}

/// Every named type in declaration order, enclosing types before nested ones
pub fn walk(resolved: &Resolved) -> Vec<Visit<'_>> {
    let namespace = &resolved.root.namespace;
    let mut walker = Walker { resolved, visits: Vec::new() };
    let flags = resolved.directives.get(namespace.line, &namespace.name);
    walker.namespace(namespace, &TypePath::new(&namespace.name), flags);
    walker.visits
}

struct Walker<'a> {
    resolved: &'a Resolved,
    visits: Vec<Visit<'a>>,
}

impl<'a> Walker<'a> {
    fn namespace(&mut self, namespace: &'a Namespace, path: &TypePath, flags: Flags) {
        for child in &namespace.children {
            match child {
                Decl::Namespace(n) => {
                    let flags = flags | self.resolved.directives.get(n.line, &n.name);
                    let path = if n.is_anonymous() { path.clone() } else { path.child_namespace(&n.name) };
                    self.namespace(n, &path, flags);
                }
                Decl::Class(c) => self.record(c.line, &c.name, &c.members, true, path, flags, 0),
                Decl::Struct(s) => {
                    if let Some(name) = &s.name {
                        self.record(s.line, name, &s.members, false, path, flags, 0);
                    }
                }
                Decl::Enum(e) => self.enumeration(e, path, flags, 0),
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &mut self,
        line: Line,
        name: &'a str,
        members: &'a [Member],
        is_class: bool,
        scope: &TypePath,
        flags: Flags,
        depth: usize,
    ) {
        let path = scope.child_type(name);
        let flags = flags | self.resolved.directives.get(line, name);
        self.visits.push(Visit {
            path: path.clone(),
            decl: TypeDecl::Record(RecordView { line, name, members, is_class }),
            flags,
            depth,
        });
        self.members(members, &path, flags, depth + 1);
    }

    fn members(&mut self, members: &'a [Member], scope: &TypePath, flags: Flags, depth: usize) {
        for member in members {
            match member {
                Member::Class(c) => self.record(c.line, &c.name, &c.members, true, scope, flags, depth),
                Member::Struct(s) => match &s.name {
                    Some(name) => self.record(s.line, name, &s.members, false, scope, flags, depth),
                    None => self.members(&s.members, scope, flags, depth),
                },
                Member::Enum(e) => self.enumeration(e, scope, flags, depth),
                Member::Access(_) | Member::Group(_) | Member::Using(_) | Member::Method(_) | Member::Field(_) => {}
            }
        }
    }

    fn enumeration(&mut self, e: &'a Enum, scope: &TypePath, flags: Flags, depth: usize) {
        let flags = flags | self.resolved.directives.get(e.line, &e.name);
        self.visits.push(Visit { path: scope.child_type(&e.name), decl: TypeDecl::Enum(e), flags, depth });
    }
}

/// Whether a record has any data members a backend would emit
pub(crate) fn has_fields(items: &[fields::RecordItem]) -> bool {
    fields::fields_of(items).next().is_some()
}

/// Paths of the records a backend emits, given every record it visited.
///
/// A record without fields is left out unless some field is typed as it;
/// then it is emitted empty so the field still maps.
pub(crate) fn emitted_records<'a, I>(records: I) -> BTreeSet<TypePath>
where
    I: IntoIterator<Item = (&'a TypePath, &'a [fields::RecordItem])> + Clone,
{
    let mut referenced = BTreeSet::new();
    for (_, items) in records.clone() {
        fields::referenced_records(items, &mut referenced);
    }
    records
        .into_iter()
        .filter(|(path, items)| has_fields(items) || referenced.contains(path))
        .map(|(path, _)| path.clone())
        .collect()
}

/// First line of every generated source file
pub(crate) fn notice(comment: &str, ctx: &EmitContext) -> String {
    format!("{} This file was generated by prism from {}. Do not edit.", comment, ctx.header_name)
}
