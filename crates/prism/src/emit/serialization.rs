//! JSON serialization backend
//!
//! Emits a C++ header declaring `serialize`/`deserialize` overloads for every
//! record and enum, the matching definitions, and a JSON document holding the
//! default value of every field. Enums are written by value name, using a name
//! table in declaration order, so the table index is the enum's ordinal.

use super::fields::{check_fields, fields_of, FieldFilter, FieldShape, FieldView, RecordItem, TypedDefault};
use super::literal::Literal;
use super::naming::{cpp_name, cpp_relative, js_name, TypePath};
use super::types::{Primitive, TypeKind};
use super::writer::{escape_string, CodeWriter};
use super::{emitted_records, has_fields, notice, walk, Artifact, Backend, EmitContext, EmitError, Output};
use prism_ast::ast::Enum;
use prism_ast::{Flags, Resolved};
use serde_json::{Map, Number, Value};
use std::collections::BTreeSet;

const BACKEND: &str = "serialization";

pub struct SerializationBackend;

enum Entry<'a> {
    Enum { path: TypePath, decl: &'a Enum },
    Record { path: TypePath, items: Vec<RecordItem> },
}

impl Backend for SerializationBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn emit(&self, resolved: &Resolved, ctx: &EmitContext) -> Result<Output, EmitError> {
        let filter = FieldFilter { resolved, types: &ctx.types, exclude: Flags::SKIP_SERIALIZATION };

        let mut entries = Vec::new();
        for visit in walk(resolved) {
            if visit.flags.contains(Flags::SKIP_SERIALIZATION) {
                continue;
            }
            if let Some(decl) = visit.as_enum() {
                entries.push(Entry::Enum { path: visit.path, decl });
            } else if let Some(record) = visit.record() {
                let items = filter.items(record, &visit.path, visit.flags);
                entries.push(Entry::Record { path: visit.path, items });
            }
        }
        let emitted = emitted_records(entries.iter().filter_map(|e| match e {
            Entry::Record { path, items } => Some((path, items.as_slice())),
            Entry::Enum { .. } => None,
        }));
        entries.retain(|e| match e {
            Entry::Record { path, .. } if !emitted.contains(path) => {
                log::debug!("{}: no serializable fields", cpp_name(path));
                false
            }
            _ => true,
        });

        let known: BTreeSet<&TypePath> = entries
            .iter()
            .map(|e| match e {
                Entry::Enum { path, .. } | Entry::Record { path, .. } => path,
            })
            .collect();
        for entry in &entries {
            if let Entry::Record { items, .. } = entry {
                check_fields(items, &known, BACKEND)?;
            }
        }

        let root = &resolved.root.namespace.name;
        let artifacts = vec![
            Artifact { name: ctx.outputs.serialization_header.clone(), contents: header(&entries, root, ctx) },
            Artifact { name: ctx.outputs.serialization_source.clone(), contents: source(&entries, root, ctx)? },
            Artifact { name: ctx.outputs.defaults_json.clone(), contents: defaults_json(&entries)? },
        ];
        log::debug!("{}: {} types", BACKEND, entries.len());
        Ok(Output { artifacts, patches: Vec::new() })
    }
}

fn include_guard(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

fn open_namespace(w: &mut CodeWriter, root: &str) {
    if !root.is_empty() {
        w.line(format!("namespace {} {{", root));
        w.blank();
    }
}

fn close_namespace(w: &mut CodeWriter, root: &str) {
    if !root.is_empty() {
        w.line(format!("}} // namespace {}", root));
    }
}

fn header(entries: &[Entry<'_>], root: &str, ctx: &EmitContext) -> String {
    let guard = include_guard(&ctx.outputs.serialization_header);
    let mut w = CodeWriter::new();
    w.line(notice("//", ctx));
    w.blank();
    w.line(format!("#ifndef {}", guard));
    w.line(format!("#define {}", guard));
    w.blank();
    w.line(format!("#include \"{}\"", ctx.header_name));
    w.blank();
    open_namespace(&mut w, root);
    w.line("class JsonWriter;");
    w.line("class JsonValue;");
    w.blank();
    for entry in entries {
        match entry {
            Entry::Enum { path, .. } => {
                let name = cpp_relative(path);
                w.line(format!("const char* toString({} in);", name));
                w.line(format!("void serialize(JsonWriter& out, {} in);", name));
                w.line(format!("void deserialize(const JsonValue& in, {}* out);", name));
            }
            Entry::Record { path, .. } => {
                let name = cpp_relative(path);
                w.line(format!("void serialize(JsonWriter& out, const {}& in);", name));
                w.line(format!("void deserialize(const JsonValue& in, {}* out);", name));
            }
        }
        w.blank();
    }
    close_namespace(&mut w, root);
    w.blank();
    w.line(format!("#endif // {}", guard));
    w.finish()
}

fn source(entries: &[Entry<'_>], root: &str, ctx: &EmitContext) -> Result<String, EmitError> {
    let mut w = CodeWriter::new();
    w.line(notice("//", ctx));
    w.blank();
    w.line(format!("#include \"{}\"", ctx.outputs.serialization_header));
    w.blank();
    w.line("#include <cstring>");
    w.blank();
    open_namespace(&mut w, root);
    for entry in entries {
        match entry {
            Entry::Enum { path, decl } => enum_functions(&mut w, path, decl),
            Entry::Record { path, items } => {
                let name = cpp_relative(path);
                w.block(format!("void serialize(JsonWriter& out, const {}& in) {{", name), "}", |w| {
                    w.line("out.beginObject();");
                    write_fields(w, items, "in.");
                    w.line("out.endObject();");
                });
                w.blank();
                w.line(format!("void deserialize(const JsonValue& in, {}* out) {{", name));
                w.indent();
                if !has_fields(items) {
                    w.line("(void)in;");
                    w.line("(void)out;");
                }
                read_fields(&mut w, items, &Source::Document, "out->")?;
                w.dedent();
                w.line("}");
            }
        }
        w.blank();
    }
    close_namespace(&mut w, root);
    Ok(w.finish())
}

fn enum_functions(w: &mut CodeWriter, path: &TypePath, decl: &Enum) {
    let name = cpp_relative(path);
    let table = format!("{}_names", js_name(path).replace('$', "_"));

    w.block(format!("static const char* const {}[] = {{", table), "};", |w| {
        for (value, _) in decl.ordinals() {
            w.line(format!("\"{}\",", escape_string(value)));
        }
    });
    w.blank();
    w.block(format!("const char* toString({} in) {{", name), "}", |w| {
        w.line(format!("return {}[static_cast<size_t>(in)];", table));
    });
    w.blank();
    w.block(format!("void serialize(JsonWriter& out, {} in) {{", name), "}", |w| {
        w.line("out.value(toString(in));");
    });
    w.blank();
    w.block(format!("void deserialize(const JsonValue& in, {}* out) {{", name), "}", |w| {
        w.line("const char* name = in.asString();");
        w.block(format!("for (size_t i = 0; name && i < {}; i++) {{", decl.values.len()), "}", |w| {
            w.block(format!("if (strcmp(name, {}[i]) == 0) {{", table), "}", |w| {
                w.line(format!("*out = static_cast<{}>(i);", name));
                w.line("return;");
            });
        });
    });
}

fn write_fields(w: &mut CodeWriter, items: &[RecordItem], object: &str) {
    for field in fields_of(items) {
        w.line(format!("out.key(\"{}\");", field.name));
        match &field.shape {
            FieldShape::Plain(_) => {
                w.line(format!("serialize(out, {}{});", object, field.name));
            }
            FieldShape::Inline(nested) => {
                w.line("out.beginObject();");
                write_fields(w, nested, &format!("{}{}.", object, field.name));
                w.line("out.endObject();");
            }
        }
    }
}

/// Where the fields being read live
enum Source {
    Document,
    /// A possibly null `const JsonValue*` variable
    Object(String),
}

impl Source {
    fn find(&self, key: &str) -> String {
        match self {
            Source::Document => format!("in.find(\"{}\")", key),
            Source::Object(var) => format!("{0} ? {0}->find(\"{1}\") : nullptr", var, key),
        }
    }

    fn nested(&self, key: &str) -> String {
        match self {
            Source::Document => format!("object_{}", key),
            Source::Object(var) => format!("{}_{}", var, key),
        }
    }
}

fn read_fields(w: &mut CodeWriter, items: &[RecordItem], source: &Source, target: &str) -> Result<(), EmitError> {
    for field in fields_of(items) {
        match &field.shape {
            FieldShape::Plain(_) => {
                let defaults = default_assignments(field, target)?;
                w.line(format!("if (const JsonValue* value = {}) {{", source.find(&field.name)));
                w.indent();
                w.line(format!("deserialize(*value, &{}{});", target, field.name));
                w.dedent();
                if defaults.is_empty() {
                    w.line("}");
                } else {
                    w.line("} else {");
                    w.indent();
                    for line in defaults {
                        w.line(line);
                    }
                    w.dedent();
                    w.line("}");
                }
            }
            FieldShape::Inline(nested) => {
                let var = source.nested(&field.name);
                w.line(format!("const JsonValue* {} = {};", var, source.find(&field.name)));
                read_fields(w, nested, &Source::Object(var), &format!("{}{}.", target, field.name))?;
            }
        }
    }
    Ok(())
}

/// Statements restoring a field's default when its key is absent
fn default_assignments(field: &FieldView, target: &str) -> Result<Vec<String>, EmitError> {
    let element = match field.kind() {
        Some(TypeKind::Primitive(p) | TypeKind::Vector(p, _)) => Some(*p),
        _ => None,
    };
    let lines = match field.typed_default(BACKEND)? {
        None => Vec::new(),
        Some(TypedDefault::Scalar(literal)) => {
            vec![format!("{}{} = {};", target, field.name, cpp_literal(&literal, element))]
        }
        Some(TypedDefault::Vector(literals)) => literals
            .iter()
            .enumerate()
            .map(|(i, l)| format!("{}{}[{}] = {};", target, field.name, i, cpp_literal(l, element)))
            .collect(),
        Some(TypedDefault::Enum { path, value }) => {
            vec![format!("{}{} = {}::{};", target, field.name, cpp_relative(&path), value)]
        }
    };
    Ok(lines)
}

fn cpp_literal(literal: &Literal, element: Option<Primitive>) -> String {
    match literal {
        Literal::Bool(b) => b.to_string(),
        Literal::Int(i) if *i > i128::from(i64::MAX) => format!("{}u", i),
        Literal::Int(i) => i.to_string(),
        Literal::Float { text, .. } if element == Some(Primitive::Float) => format!("{}f", text),
        Literal::Float { text, .. } => text.clone(),
        Literal::Str(s) => format!("\"{}\"", escape_string(s)),
        Literal::Null => "nullptr".to_string(),
        Literal::Name(segments) => segments.join("::"),
    }
}

fn json_literal(literal: &Literal) -> Value {
    match literal {
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => match (u64::try_from(*i), i64::try_from(*i)) {
            (Ok(unsigned), _) => Value::from(unsigned),
            (_, Ok(signed)) => Value::from(signed),
            _ => Value::Null,
        },
        Literal::Float { value, .. } => Number::from_f64(*value).map(Value::Number).unwrap_or(Value::Null),
        Literal::Str(s) => Value::String(s.clone()),
        Literal::Null => Value::Null,
        Literal::Name(segments) => Value::String(segments.join("::")),
    }
}

fn defaults_json(entries: &[Entry<'_>]) -> Result<String, EmitError> {
    let mut document = Map::new();
    for entry in entries {
        if let Entry::Record { path, items } = entry {
            document.insert(cpp_name(path), Value::Object(defaults_object(items)?));
        }
    }
    Ok(format!("{:#}\n", Value::Object(document)))
}

fn defaults_object(items: &[RecordItem]) -> Result<Map<String, Value>, EmitError> {
    let mut object = Map::new();
    for field in fields_of(items) {
        let value = match &field.shape {
            FieldShape::Inline(nested) => Some(Value::Object(defaults_object(nested)?)),
            FieldShape::Plain(_) => match field.typed_default(BACKEND)? {
                None => None,
                Some(TypedDefault::Scalar(literal)) => Some(json_literal(&literal)),
                Some(TypedDefault::Vector(literals)) => {
                    Some(Value::Array(literals.iter().map(json_literal).collect()))
                }
                Some(TypedDefault::Enum { value, .. }) => Some(Value::String(value)),
            },
        };
        if let Some(value) = value {
            object.insert(field.name.clone(), value);
        }
    }
    Ok(object)
}
