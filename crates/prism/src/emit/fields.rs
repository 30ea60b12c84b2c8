//! Flattened view of a record's data members
//!
//! Backends never look at raw members. They ask for the record's items, which
//! come back in declaration order with statics, non-public members and
//! filtered fields already removed and every field's type classified.

use super::literal::Literal;
use super::naming::TypePath;
use super::types::{Primitive, TypeKind, TypeTable};
use super::{EmitError, RecordView};
use prism_ast::ast::*;
use prism_ast::directives::struct_key;
use prism_ast::{DefaultValue, Flags, Resolved};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldShape {
    Plain(TypeKind),
    /// `struct { ... } name;` emitted as a nested object
    Inline(Vec<RecordItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldView {
    pub name: String,
    pub line: Line,
    pub type_text: String,
    pub default: Option<DefaultValue>,
    pub shape: FieldShape,
    /// Own flags plus those of every enclosing type
    pub flags: Flags,
    pub doc: Option<String>,
}

/// A field default interpreted against the field's type
#[derive(Debug, Clone, PartialEq)]
pub enum TypedDefault {
    Scalar(Literal),
    /// One literal per component
    Vector(Vec<Literal>),
    Enum { path: TypePath, value: String },
}

impl FieldView {
    pub fn kind(&self) -> Option<&TypeKind> {
        match &self.shape {
            FieldShape::Plain(kind) => Some(kind),
            FieldShape::Inline(_) => None,
        }
    }

    /// Fail unless the field's type is one the backend can map
    pub fn require_mappable(&self, backend: &'static str) -> Result<(), EmitError> {
        match self.kind() {
            Some(kind) if !kind.is_mappable() => Err(EmitError::UnmappableType {
                backend,
                type_text: self.type_text.clone(),
                field: self.name.clone(),
                line: self.line,
            }),
            _ => Ok(()),
        }
    }

    /// The default as a value of the field's type.
    ///
    /// Expressions, and literals that do not fit the type, are an error.
    /// Fields of unmappable type never have a typed default.
    pub fn typed_default(&self, backend: &'static str) -> Result<Option<TypedDefault>, EmitError> {
        let (Some(default), Some(kind)) = (&self.default, self.kind()) else {
            return Ok(None);
        };
        let fail = || EmitError::UnmappableDefault {
            backend,
            value: default.to_string(),
            field: self.name.clone(),
            line: self.line,
        };
        // Integer fields take only integers in range; float fields take either
        let numeric = |primitive: Primitive, text: &str| Literal::parse(text).filter(|l| primitive.accepts(l));

        let typed = match (kind, default) {
            (TypeKind::Primitive(Primitive::Bool), DefaultValue::Scalar(text)) => {
                match Literal::parse(text) {
                    Some(literal @ Literal::Bool(_)) => TypedDefault::Scalar(literal),
                    _ => return Err(fail()),
                }
            }
            (TypeKind::Primitive(primitive), DefaultValue::Scalar(text)) => {
                TypedDefault::Scalar(numeric(*primitive, text).ok_or_else(fail)?)
            }
            (TypeKind::Vector(element, size), DefaultValue::Scalar(text)) => {
                TypedDefault::Vector(vec![numeric(*element, text).ok_or_else(fail)?; *size])
            }
            (TypeKind::Vector(element, size), DefaultValue::List(items)) if items.len() == *size => {
                let literals: Option<Vec<Literal>> = items.iter().map(|i| numeric(*element, i)).collect();
                TypedDefault::Vector(literals.ok_or_else(fail)?)
            }
            (TypeKind::Enum(path), DefaultValue::Scalar(text)) => {
                let literal = Literal::parse(text).ok_or_else(fail)?;
                let value = literal.simple_name().ok_or_else(fail)?;
                TypedDefault::Enum { path: path.clone(), value: value.to_string() }
            }
            (TypeKind::String, DefaultValue::Scalar(text)) => match Literal::parse(text) {
                Some(literal @ (Literal::Str(_) | Literal::Null)) => TypedDefault::Scalar(literal),
                _ => return Err(fail()),
            },
            // `= {}` keeps the record's own defaults
            (TypeKind::Record(_), DefaultValue::List(items)) if items.is_empty() => return Ok(None),
            (TypeKind::Alias(_) | TypeKind::Pointer(_) | TypeKind::Unknown(_), _) => return Ok(None),
            _ => return Err(fail()),
        };
        Ok(Some(typed))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordItem {
    Field(FieldView),
    Group(GroupingDelimiter),
}

impl RecordItem {
    pub fn as_field(&self) -> Option<&FieldView> {
        match self {
            RecordItem::Field(f) => Some(f),
            RecordItem::Group(_) => None,
        }
    }
}

/// Fields visible to a backend, in declaration order
pub fn fields_of<'a>(items: &'a [RecordItem]) -> impl Iterator<Item = &'a FieldView> {
    items.iter().filter_map(RecordItem::as_field)
}

/// Record types named by fields, including fields of anonymous structs
pub fn referenced_records<'a>(items: &'a [RecordItem], found: &mut BTreeSet<&'a TypePath>) {
    for field in fields_of(items) {
        match &field.shape {
            FieldShape::Inline(nested) => referenced_records(nested, found),
            FieldShape::Plain(TypeKind::Record(path)) => {
                found.insert(path);
            }
            FieldShape::Plain(_) => {}
        }
    }
}

/// Fail unless every field maps to a primitive, vector or string, or to a
/// type in `known`: the types the backend emits code for
pub fn check_fields(items: &[RecordItem], known: &BTreeSet<&TypePath>, backend: &'static str) -> Result<(), EmitError> {
    for field in fields_of(items) {
        field.require_mappable(backend)?;
        match &field.shape {
            FieldShape::Inline(nested) => check_fields(nested, known, backend)?,
            FieldShape::Plain(TypeKind::Enum(path) | TypeKind::Record(path)) if !known.contains(path) => {
                return Err(EmitError::UnmappableType {
                    backend,
                    type_text: field.type_text.clone(),
                    field: field.name.clone(),
                    line: field.line,
                });
            }
            FieldShape::Plain(_) => {}
        }
    }
    Ok(())
}

pub struct FieldFilter<'a> {
    pub resolved: &'a Resolved,
    pub types: &'a TypeTable,
    /// Fields carrying this flag are dropped
    pub exclude: Flags,
}

impl FieldFilter<'_> {
    /// Items of `record`, declared at `path` with the given type-level flags
    pub fn items(&self, record: &RecordView<'_>, path: &TypePath, flags: Flags) -> Vec<RecordItem> {
        let default_access = if record.is_class { Access::Private } else { Access::Public };
        self.collect(record.members, path, flags, default_access)
    }

    fn collect(&self, members: &[Member], scope: &TypePath, inherited: Flags, access: Access) -> Vec<RecordItem> {
        let mut access = access;
        let mut items = Vec::new();
        for member in members {
            match member {
                Member::Access(a) => access = a.access,
                Member::Group(g) if access == Access::Public => items.push(RecordItem::Group(g.clone())),
                Member::Field(f) if access == Access::Public && !f.is_static() => {
                    let flags = inherited | self.resolved.directives.get(f.line, &f.name);
                    if flags.contains(self.exclude) {
                        continue;
                    }
                    items.push(RecordItem::Field(FieldView {
                        name: f.name.clone(),
                        line: f.line,
                        type_text: f.field_type.clone(),
                        default: f.default_value(),
                        shape: FieldShape::Plain(self.types.classify(&f.field_type, scope)),
                        flags,
                        doc: self.resolved.doc(f.line),
                    }));
                }
                Member::Struct(s) if s.name.is_none() && access == Access::Public => {
                    let flags = inherited | self.resolved.directives.get(s.line, struct_key(s));
                    if flags.contains(self.exclude) {
                        continue;
                    }
                    let nested = self.collect(&s.members, scope, flags, Access::Public);
                    match &s.instance_name {
                        Some(name) => {
                            if nested.iter().any(|i| i.as_field().is_some()) {
                                items.push(RecordItem::Field(FieldView {
                                    name: name.clone(),
                                    line: s.line,
                                    type_text: String::new(),
                                    default: None,
                                    shape: FieldShape::Inline(nested),
                                    flags,
                                    doc: self.resolved.doc(s.line),
                                }));
                            }
                        }
                        None => items.extend(nested),
                    }
                }
                _ => {}
            }
        }
        items
    }
}
