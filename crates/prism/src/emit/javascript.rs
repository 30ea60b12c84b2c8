//! Dynamic-runtime binding backend
//!
//! Registers every record as an embind `value_object` and every enum as an
//! `enum_`, adds a defaults factory per record to the JavaScript extensions,
//! and produces the TypeScript declarations for the hand-maintained `.d.ts`.

use super::fields::{check_fields, fields_of, FieldFilter, FieldShape, FieldView, RecordItem, TypedDefault};
use super::literal::Literal;
use super::naming::{cpp_relative, js_factory, js_name, pascal_case, TypePath};
use super::types::{Primitive, TypeKind};
use super::writer::{escape_string, CodeWriter};
use super::{
    emitted_records, notice, walk, Artifact, Backend, EmitContext, EmitError, Output, PatchRequest, PatchTarget,
};
use prism_ast::ast::Enum;
use prism_ast::{Flags, Resolved};
use std::collections::BTreeSet;

const BACKEND: &str = "javascript";

pub struct JavaScriptBackend;

enum Entry<'a> {
    Enum { path: TypePath, decl: &'a Enum, doc: Option<String> },
    Record { path: TypePath, items: Vec<RecordItem>, doc: Option<String> },
}

impl Entry<'_> {
    fn path(&self) -> &TypePath {
        match self {
            Entry::Enum { path, .. } | Entry::Record { path, .. } => path,
        }
    }
}

impl Backend for JavaScriptBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn emit(&self, resolved: &Resolved, ctx: &EmitContext) -> Result<Output, EmitError> {
        let filter = FieldFilter { resolved, types: &ctx.types, exclude: Flags::SKIP_DYNAMIC_BINDING };

        let mut entries = Vec::new();
        for visit in walk(resolved) {
            if visit.flags.contains(Flags::SKIP_DYNAMIC_BINDING) {
                continue;
            }
            let doc = resolved.doc(visit.line());
            if let Some(decl) = visit.as_enum() {
                entries.push(Entry::Enum { path: visit.path, decl, doc });
            } else if let Some(record) = visit.record() {
                let items = filter.items(record, &visit.path, visit.flags);
                entries.push(Entry::Record { path: visit.path, items, doc });
            }
        }
        let emitted = emitted_records(entries.iter().filter_map(|e| match e {
            Entry::Record { path, items, .. } => Some((path, items.as_slice())),
            Entry::Enum { .. } => None,
        }));
        entries.retain(|e| !matches!(e, Entry::Record { path, .. } if !emitted.contains(path)));

        let known: BTreeSet<&TypePath> = entries.iter().map(Entry::path).collect();
        for entry in &entries {
            if let Entry::Record { items, .. } = entry {
                check_fields(items, &known, BACKEND)?;
            }
        }

        let root = &resolved.root.namespace.name;
        let artifacts = vec![
            Artifact { name: ctx.outputs.js_bindings.clone(), contents: bindings(&entries, root, ctx) },
            Artifact { name: ctx.outputs.js_enums.clone(), contents: enums(&entries, root, ctx) },
            Artifact { name: ctx.outputs.js_extensions.clone(), contents: extensions(&entries, ctx)? },
        ];
        let patches = vec![PatchRequest { target: PatchTarget::TypeScript, contents: typescript(&entries) }];
        log::debug!("{}: {} types", BACKEND, entries.len());
        Ok(Output { artifacts, patches })
    }
}

fn module_name(file_name: &str) -> String {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    stem.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect()
}

fn preamble(w: &mut CodeWriter, root: &str, ctx: &EmitContext) {
    w.line(notice("//", ctx));
    w.blank();
    w.line("#include <emscripten/bind.h>");
    w.blank();
    w.line(format!("#include \"{}\"", ctx.header_name));
    w.blank();
    w.line("using namespace emscripten;");
    if !root.is_empty() {
        w.line(format!("using namespace {};", root));
    }
    w.blank();
}

fn bindings(entries: &[Entry<'_>], root: &str, ctx: &EmitContext) -> String {
    let mut w = CodeWriter::new();
    preamble(&mut w, root, ctx);
    w.block(format!("EMSCRIPTEN_BINDINGS({}) {{", module_name(&ctx.outputs.js_bindings)), "}", |w| {
        for entry in entries {
            if let Entry::Record { path, items, .. } = entry {
                value_object(w, &cpp_relative(path), &js_name(path), items);
            }
        }
    });
    w.finish()
}

/// Register an object type; inline objects are registered first under a local alias
fn value_object(w: &mut CodeWriter, cpp_type: &str, js_type: &str, items: &[RecordItem]) {
    for field in fields_of(items) {
        if let FieldShape::Inline(nested) = &field.shape {
            let alias = format!("{}_{}", cpp_type.replace("::", "_"), field.name);
            w.line(format!("using {} = decltype({}::{});", alias, cpp_type, field.name));
            value_object(w, &alias, &format!("{}${}", js_type, pascal_case(&field.name)), nested);
        }
    }
    let fields: Vec<&FieldView> = fields_of(items).collect();
    let terminator = if fields.is_empty() { ";" } else { "" };
    w.line(format!("value_object<{}>(\"{}\"){}", cpp_type, js_type, terminator));
    w.indent();
    for (i, field) in fields.iter().enumerate() {
        let terminator = if i + 1 == fields.len() { ";" } else { "" };
        w.line(format!(".field(\"{0}\", &{1}::{0}){2}", field.name, cpp_type, terminator));
    }
    w.dedent();
    w.blank();
}

fn enums(entries: &[Entry<'_>], root: &str, ctx: &EmitContext) -> String {
    let mut w = CodeWriter::new();
    preamble(&mut w, root, ctx);
    w.block(format!("EMSCRIPTEN_BINDINGS({}) {{", module_name(&ctx.outputs.js_enums)), "}", |w| {
        for entry in entries {
            if let Entry::Enum { path, decl, .. } = entry {
                let name = cpp_relative(path);
                w.line(format!("enum_<{}>(\"{}\")", name, js_name(path)));
                w.indent();
                for (value, ordinal) in decl.ordinals() {
                    w.line(format!(".value(\"{0}\", {1}::{0}) // {2}", value, name, ordinal));
                }
                w.line(";");
                w.dedent();
                w.blank();
            }
        }
    });
    w.finish()
}

fn extensions(entries: &[Entry<'_>], ctx: &EmitContext) -> Result<String, EmitError> {
    let module = &ctx.js_module;
    let mut w = CodeWriter::new();
    w.line(notice("//", ctx));
    w.blank();
    w.line(format!("{}.loadGeneratedExtensions = function() {{", module));
    w.indent();
    for entry in entries {
        if let Entry::Record { path, items, .. } = entry {
            w.blank();
            w.line(format!("{}.{} = function(overrides) {{", module, js_factory(path)));
            w.indent();
            w.line("const options = {");
            w.indent();
            defaults_literal(&mut w, items, module)?;
            w.dedent();
            w.line("};");
            w.line("return Object.assign(options, overrides);");
            w.dedent();
            w.line("};");
        }
    }
    w.dedent();
    w.line("};");
    Ok(w.finish())
}

fn defaults_literal(w: &mut CodeWriter, items: &[RecordItem], module: &str) -> Result<(), EmitError> {
    for field in fields_of(items) {
        match &field.shape {
            FieldShape::Inline(nested) => {
                w.line(format!("{}: {{", field.name));
                w.indent();
                defaults_literal(w, nested, module)?;
                w.dedent();
                w.line("},");
            }
            FieldShape::Plain(_) => {
                if let Some(value) = field.typed_default(BACKEND)? {
                    w.line(format!("{}: {},", field.name, js_value(&value, module)));
                }
            }
        }
    }
    Ok(())
}

fn js_literal(literal: &Literal) -> String {
    match literal {
        Literal::Bool(b) => b.to_string(),
        Literal::Int(i) => i.to_string(),
        Literal::Float { text, .. } => text.clone(),
        Literal::Str(s) => format!("\"{}\"", escape_string(s)),
        Literal::Null => "null".to_string(),
        Literal::Name(segments) => segments.join("."),
    }
}

fn js_value(value: &TypedDefault, module: &str) -> String {
    match value {
        TypedDefault::Scalar(literal) => js_literal(literal),
        TypedDefault::Vector(literals) => {
            format!("[{}]", literals.iter().map(js_literal).collect::<Vec<_>>().join(", "))
        }
        TypedDefault::Enum { path, value } => format!("{}.{}.{}", module, js_name(path), value),
    }
}

fn ts_type(field: &FieldView) -> String {
    match field.kind() {
        Some(TypeKind::Primitive(Primitive::Bool)) => "boolean".to_string(),
        Some(TypeKind::Primitive(_)) => "number".to_string(),
        Some(TypeKind::Vector(p, size)) => {
            let element = if *p == Primitive::Bool { "boolean" } else { "number" };
            format!("[{}]", vec![element; *size].join(", "))
        }
        Some(TypeKind::Enum(path) | TypeKind::Record(path)) => js_name(path),
        Some(TypeKind::String) => "string".to_string(),
        // Unmappable kinds were rejected before emission
        Some(TypeKind::Alias(_) | TypeKind::Pointer(_) | TypeKind::Unknown(_)) | None => "any".to_string(),
    }
}

fn typescript(entries: &[Entry<'_>]) -> String {
    let mut w = CodeWriter::new();
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            w.blank();
        }
        match entry {
            Entry::Enum { path, decl, doc } => {
                if let Some(doc) = doc {
                    w.doc_comment(doc);
                }
                w.block(format!("export enum {} {{", js_name(path)), "}", |w| {
                    for (value, ordinal) in decl.ordinals() {
                        w.line(format!("{} = {},", value, ordinal));
                    }
                });
            }
            Entry::Record { path, items, doc } => {
                if let Some(doc) = doc {
                    w.doc_comment(doc);
                }
                w.block(format!("export interface {} {{", js_name(path)), "}", |w| {
                    interface_members(w, items);
                });
            }
        }
    }
    w.finish()
}

fn interface_members(w: &mut CodeWriter, items: &[RecordItem]) {
    for item in items {
        match item {
            RecordItem::Group(group) => {
                w.line(&group.doc);
            }
            RecordItem::Field(field) => {
                if let Some(doc) = &field.doc {
                    w.doc_comment(doc);
                }
                match &field.shape {
                    FieldShape::Inline(nested) => {
                        w.block(format!("{}?: {{", field.name), "};", |w| interface_members(w, nested));
                    }
                    FieldShape::Plain(_) => {
                        w.line(format!("{}?: {};", field.name, ts_type(field)));
                    }
                }
            }
        }
    }
}
