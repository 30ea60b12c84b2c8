//! Managed-runtime binding backend
//!
//! Produces the generated region of the hand-maintained Java class: a
//! `public static class` per record with nested types nested, a `public enum`
//! per enum, and fields initialized to their C++ defaults. Types declared in
//! the configured host class are written straight into the host's body.

use super::fields::{fields_of, referenced_records, FieldFilter, FieldShape, FieldView, RecordItem, TypedDefault};
use super::literal::Literal;
use super::naming::{java_name, pascal_case, TypePath};
use super::types::{Primitive, TypeKind};
use super::writer::{escape_string, CodeWriter};
use super::{walk, Backend, EmitContext, EmitError, Output, PatchRequest, PatchTarget, Visit};
use prism_ast::{Flags, Resolved};
use std::collections::BTreeSet;
use std::iter::Peekable;

const BACKEND: &str = "java";

pub struct JavaBackend;

struct Node<'a> {
    visit: Visit<'a>,
    children: Vec<Node<'a>>,
}

/// Rebuild nesting from the pre-order walk
fn tree<'a>(visits: &mut Peekable<impl Iterator<Item = Visit<'a>>>, depth: usize) -> Vec<Node<'a>> {
    let mut nodes = Vec::new();
    while let Some(visit) = visits.next_if(|v| v.depth == depth) {
        let children = tree(visits, depth + 1);
        nodes.push(Node { visit, children });
    }
    nodes
}

struct Emitter<'a> {
    filter: FieldFilter<'a>,
    resolved: &'a Resolved,
    host: Option<&'a str>,
    /// Records some field is typed as; these are emitted even without fields
    referenced: BTreeSet<TypePath>,
}

impl Backend for JavaBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn emit(&self, resolved: &Resolved, ctx: &EmitContext) -> Result<Output, EmitError> {
        let filter = FieldFilter { resolved, types: &ctx.types, exclude: Flags::NONE };
        let visits = walk(resolved);
        let mut referenced = BTreeSet::new();
        for visit in &visits {
            if let Some(record) = visit.record() {
                let items = filter.items(record, &visit.path, visit.flags);
                let mut found = BTreeSet::new();
                referenced_records(&items, &mut found);
                referenced.extend(found.into_iter().cloned());
            }
        }

        let emitter = Emitter { filter, resolved, host: ctx.java_host_class.as_deref(), referenced };
        let nodes = tree(&mut visits.into_iter().peekable(), 0);

        let mut w = CodeWriter::new().at_depth(1);
        let mut first = true;
        for node in &nodes {
            if emitter.is_empty(node) {
                continue;
            }
            if !first {
                w.blank();
            }
            first = false;
            if emitter.host.is_some_and(|host| node.visit.path.types == [host]) {
                emitter.body(&mut w, node)?;
            } else {
                emitter.node(&mut w, node)?;
            }
        }
        log::debug!("{}: {} top-level types", BACKEND, nodes.len());

        Ok(Output {
            artifacts: Vec::new(),
            patches: vec![PatchRequest { target: PatchTarget::Java, contents: w.finish() }],
        })
    }
}

impl Emitter<'_> {
    fn items(&self, node: &Node<'_>) -> Vec<RecordItem> {
        match node.visit.record() {
            Some(record) => self.filter.items(record, &node.visit.path, node.visit.flags),
            None => Vec::new(),
        }
    }

    fn is_empty(&self, node: &Node<'_>) -> bool {
        node.visit.as_enum().is_none()
            && !self.referenced.contains(&node.visit.path)
            && fields_of(&self.items(node)).next().is_none()
            && node.children.iter().all(|child| self.is_empty(child))
    }

    fn node(&self, w: &mut CodeWriter, node: &Node<'_>) -> Result<(), EmitError> {
        if let Some(doc) = self.resolved.doc(node.visit.line()) {
            w.doc_comment(&doc);
        }
        let name = node.visit.path.name();
        if let Some(decl) = node.visit.as_enum() {
            w.block(format!("public enum {} {{", name), "}", |w| {
                for value in &decl.values {
                    w.line(format!("{},", value));
                }
            });
            return Ok(());
        }
        w.line(format!("public static class {} {{", name));
        w.indent();
        self.body(w, node)?;
        w.dedent();
        w.line("}");
        Ok(())
    }

    /// Nested types in declaration order, then the fields
    fn body(&self, w: &mut CodeWriter, node: &Node<'_>) -> Result<(), EmitError> {
        let mut first = true;
        for child in &node.children {
            if self.is_empty(child) {
                continue;
            }
            if !first {
                w.blank();
            }
            first = false;
            self.node(w, child)?;
        }
        let items = self.items(node);
        if fields_of(&items).next().is_some() {
            if !first {
                w.blank();
            }
            self.fields(w, &items)?;
        }
        Ok(())
    }

    fn fields(&self, w: &mut CodeWriter, items: &[RecordItem]) -> Result<(), EmitError> {
        for field in fields_of(items) {
            if field.flags.contains(Flags::FLATTEN) {
                log::warn!("%codegen_java_flatten% on '{}' at line {} is reserved and has no effect", field.name, field.line);
            }
            if let Some(doc) = &field.doc {
                w.doc_comment(doc);
            }
            match &field.shape {
                FieldShape::Inline(nested) => {
                    let class = pascal_case(&field.name);
                    w.line(format!("public static class {} {{", class));
                    w.indent();
                    self.fields(w, nested)?;
                    w.dedent();
                    w.line("}");
                    w.line("@NonNull");
                    w.line(format!("public {0} {1} = new {0}();", class, field.name));
                }
                FieldShape::Plain(kind) => {
                    let declaration = self.declaration(field, kind)?;
                    if let Some(annotation) = declaration.annotation {
                        w.line(annotation);
                    }
                    match declaration.initializer {
                        Some(init) => w.line(format!("public {} {} = {};", declaration.java_type, field.name, init)),
                        None => w.line(format!("public {} {};", declaration.java_type, field.name)),
                    };
                }
            }
        }
        Ok(())
    }

    fn declaration(&self, field: &FieldView, kind: &TypeKind) -> Result<Declaration, EmitError> {
        let narrow = field.flags.contains(Flags::NARROW_FLOAT);
        let unmappable = || EmitError::UnmappableType {
            backend: BACKEND,
            type_text: field.type_text.clone(),
            field: field.name.clone(),
            line: field.line,
        };
        let default = field.typed_default(BACKEND)?;

        let declaration = match kind {
            TypeKind::Primitive(p) => {
                let p = narrowed(*p, narrow);
                let initializer = match &default {
                    Some(TypedDefault::Scalar(literal)) => Some(java_literal(literal, p)),
                    _ => None,
                };
                Declaration { annotation: None, java_type: primitive_type(p).to_string(), initializer }
            }
            TypeKind::Vector(p, size) => {
                let p = narrowed(*p, narrow);
                let initializer = match &default {
                    Some(TypedDefault::Vector(literals)) => {
                        let values: Vec<String> = literals.iter().map(|l| java_literal(l, p)).collect();
                        format!("{{ {} }}", values.join(", "))
                    }
                    _ => format!("new {}[{}]", primitive_type(p), size),
                };
                Declaration {
                    annotation: Some("@NonNull"),
                    java_type: format!("{}[]", primitive_type(p)),
                    initializer: Some(initializer),
                }
            }
            TypeKind::Enum(path) => {
                let java_type = java_name(path, self.host);
                let initializer = match &default {
                    Some(TypedDefault::Enum { value, .. }) => Some(format!("{}.{}", java_type, value)),
                    _ => None,
                };
                Declaration { annotation: initializer.as_ref().map(|_| "@NonNull"), java_type, initializer }
            }
            TypeKind::Record(path) => {
                let java_type = java_name(path, self.host);
                let initializer = Some(format!("new {}()", java_type));
                Declaration { annotation: Some("@NonNull"), java_type, initializer }
            }
            TypeKind::String => {
                let initializer = match &default {
                    Some(TypedDefault::Scalar(Literal::Str(s))) => Some(format!("\"{}\"", escape_string(s))),
                    _ => None,
                };
                let annotation = if initializer.is_some() { "@NonNull" } else { "@Nullable" };
                Declaration { annotation: Some(annotation), java_type: "String".to_string(), initializer }
            }
            TypeKind::Pointer(pointee) => {
                let name = pointee.rsplit("::").next().unwrap_or(pointee);
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(unmappable());
                }
                Declaration { annotation: Some("@Nullable"), java_type: name.to_string(), initializer: None }
            }
            TypeKind::Alias(_) | TypeKind::Unknown(_) => return Err(unmappable()),
        };
        Ok(declaration)
    }
}

struct Declaration {
    annotation: Option<&'static str>,
    java_type: String,
    initializer: Option<String>,
}

fn narrowed(p: Primitive, narrow: bool) -> Primitive {
    if narrow && p == Primitive::Double {
        Primitive::Float
    } else {
        p
    }
}

fn primitive_type(p: Primitive) -> &'static str {
    match p {
        Primitive::Bool => "boolean",
        Primitive::Float => "float",
        Primitive::Double => "double",
        Primitive::Int8 | Primitive::UInt8 | Primitive::Int16 | Primitive::UInt16 => "int",
        // No unsigned types in Java
        Primitive::Int32 | Primitive::UInt32 => "int",
        Primitive::Int64 | Primitive::UInt64 => "long",
    }
}

fn java_literal(literal: &Literal, p: Primitive) -> String {
    match (literal, p) {
        (Literal::Bool(b), _) => b.to_string(),
        (Literal::Int(_) | Literal::Float { .. }, Primitive::Float) => {
            format!("{}f", literal.float_text().unwrap_or_default())
        }
        (Literal::Int(_) | Literal::Float { .. }, Primitive::Double) => literal.float_text().unwrap_or_default(),
        // Unsigned values past the signed maximum keep their bits as hex
        (Literal::Int(i), Primitive::UInt32) if *i > i128::from(i32::MAX) => format!("0x{:X}", i),
        (Literal::Int(i), Primitive::UInt64) if *i > i128::from(i64::MAX) => format!("0x{:X}L", i),
        (Literal::Int(i), Primitive::Int64 | Primitive::UInt64) => format!("{}L", i),
        (Literal::Int(_) | Literal::Float { .. }, _) => literal.number_text().unwrap_or_default(),
        (Literal::Str(s), _) => format!("\"{}\"", escape_string(s)),
        (Literal::Null, _) => "null".to_string(),
        (Literal::Name(segments), _) => segments.join("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_java_literal() {
        let strength = Literal::parse("0.10f").unwrap();
        assert_eq!(java_literal(&strength, Primitive::Float), "0.10f");
        assert_eq!(java_literal(&strength, Primitive::Double), "0.10");
        assert_eq!(java_literal(&Literal::Int(1), Primitive::Float), "1.0f");
        assert_eq!(java_literal(&Literal::Int(384), Primitive::UInt32), "384");
        assert_eq!(java_literal(&Literal::Int(7), Primitive::Int64), "7L");
        assert_eq!(java_literal(&Literal::Int(-16), Primitive::Int64), "-16L");
    }

    #[test]
    fn test_java_literal_unsigned_overflow() {
        let all_ones = Literal::Int(u64::MAX.into());
        assert_eq!(java_literal(&all_ones, Primitive::UInt64), "0xFFFFFFFFFFFFFFFFL");
        assert_eq!(java_literal(&Literal::Int(u32::MAX.into()), Primitive::UInt32), "0xFFFFFFFF");
        assert_eq!(java_literal(&Literal::Int(i32::MAX.into()), Primitive::UInt32), "2147483647");
    }

    #[test]
    fn test_narrowing() {
        assert_eq!(narrowed(Primitive::Double, true), Primitive::Float);
        assert_eq!(narrowed(Primitive::Double, false), Primitive::Double);
        assert_eq!(narrowed(Primitive::Int32, true), Primitive::Int32);
    }
}
