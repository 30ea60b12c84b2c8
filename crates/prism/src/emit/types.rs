//! Classification of field type text
//!
//! Fields carry their type as unparsed text. The table built here knows every
//! enum, record and alias declared in the header so that a name can be looked
//! up the way C++ would: from the innermost enclosing scope outwards.

use super::literal::Literal;
use super::naming::TypePath;
use prism_ast::ast::*;
use std::collections::BTreeMap;

const MAX_ALIAS_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    Float,
    Double,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
}

impl Primitive {
    fn from_name(name: &str) -> Option<Primitive> {
        let primitive = match name {
            "bool" => Primitive::Bool,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "char" | "int8_t" => Primitive::Int8,
            "uint8_t" => Primitive::UInt8,
            "short" | "int16_t" => Primitive::Int16,
            "uint16_t" => Primitive::UInt16,
            "int" | "int32_t" => Primitive::Int32,
            "unsigned" | "unsigned int" | "uint32_t" => Primitive::UInt32,
            "int64_t" => Primitive::Int64,
            "uint64_t" | "size_t" => Primitive::UInt64,
            _ => return None,
        };
        Some(primitive)
    }

    pub fn is_floating(self) -> bool {
        matches!(self, Primitive::Float | Primitive::Double)
    }

    pub fn is_integer(self) -> bool {
        !self.is_floating() && self != Primitive::Bool
    }

    /// Smallest and largest value of an integer type
    pub fn int_range(self) -> Option<(i128, i128)> {
        let range = match self {
            Primitive::Int8 => (i8::MIN.into(), i8::MAX.into()),
            Primitive::UInt8 => (0, u8::MAX.into()),
            Primitive::Int16 => (i16::MIN.into(), i16::MAX.into()),
            Primitive::UInt16 => (0, u16::MAX.into()),
            Primitive::Int32 => (i32::MIN.into(), i32::MAX.into()),
            Primitive::UInt32 => (0, u32::MAX.into()),
            Primitive::Int64 => (i64::MIN.into(), i64::MAX.into()),
            Primitive::UInt64 => (0, u64::MAX.into()),
            Primitive::Bool | Primitive::Float | Primitive::Double => return None,
        };
        Some(range)
    }

    /// Whether a numeric literal can initialize this type without narrowing
    pub fn accepts(self, literal: &Literal) -> bool {
        match (literal, self.int_range()) {
            (Literal::Int(value), Some((min, max))) => (min..=max).contains(value),
            (Literal::Int(_) | Literal::Float { .. }, None) => self.is_floating(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Primitive(Primitive),
    /// `float3` and friends: an element type and a fixed length
    Vector(Primitive, usize),
    Enum(TypePath),
    Record(TypePath),
    /// A `using` alias that does not name a mappable type, such as a callback
    Alias(String),
    Pointer(String),
    String,
    Unknown(String),
}

impl TypeKind {
    pub fn is_mappable(&self) -> bool {
        !matches!(self, TypeKind::Alias(_) | TypeKind::Pointer(_) | TypeKind::Unknown(_))
    }
}

fn vector_from_name(name: &str) -> Option<TypeKind> {
    let size = name.chars().last()?.to_digit(10)? as usize;
    if !(2..=4).contains(&size) {
        return None;
    }
    let element = match &name[..name.len() - 1] {
        "float" => Primitive::Float,
        "double" => Primitive::Double,
        "int" => Primitive::Int32,
        "uint" => Primitive::UInt32,
        "bool" => Primitive::Bool,
        _ => return None,
    };
    Some(TypeKind::Vector(element, size))
}

#[derive(Debug, Clone)]
enum Entry {
    Enum(TypePath),
    Record(TypePath),
    Alias { scope: TypePath, name: String, rhs: String },
}

/// Every named type declared in a header, keyed by its qualified segments
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    entries: BTreeMap<Vec<String>, Entry>,
    vector_aliases: BTreeMap<String, String>,
}

impl TypeTable {
    pub fn build(root: &Root, vector_aliases: &BTreeMap<String, String>) -> Self {
        let mut table = TypeTable { entries: BTreeMap::new(), vector_aliases: vector_aliases.clone() };
        let scope = TypePath::new(&root.namespace.name);
        table.namespace(&root.namespace, &scope);
        log::debug!("type table holds {} named types", table.entries.len());
        table
    }

    fn namespace(&mut self, namespace: &Namespace, scope: &TypePath) {
        for child in &namespace.children {
            match child {
                Decl::Namespace(n) if n.is_anonymous() => self.namespace(n, scope),
                Decl::Namespace(n) => self.namespace(n, &scope.child_namespace(&n.name)),
                Decl::Class(c) => self.record(&c.name, &c.members, scope),
                Decl::Struct(s) => {
                    if let Some(name) = &s.name {
                        self.record(name, &s.members, scope);
                    }
                }
                Decl::Enum(e) => self.insert(Entry::Enum(scope.child_type(&e.name))),
            }
        }
    }

    fn record(&mut self, name: &str, members: &[Member], scope: &TypePath) {
        let path = scope.child_type(name);
        self.insert(Entry::Record(path.clone()));
        self.members(members, &path);
    }

    fn members(&mut self, members: &[Member], scope: &TypePath) {
        for member in members {
            match member {
                Member::Class(c) => self.record(&c.name, &c.members, scope),
                Member::Struct(s) => match &s.name {
                    Some(name) => self.record(name, &s.members, scope),
                    // Anonymous structs declare their nested types in the enclosing scope
                    None => self.members(&s.members, scope),
                },
                Member::Enum(e) => self.insert(Entry::Enum(scope.child_type(&e.name))),
                Member::Using(u) => self.insert(Entry::Alias {
                    scope: scope.clone(),
                    name: u.name.clone(),
                    rhs: u.rhs.clone(),
                }),
                Member::Access(_) | Member::Group(_) | Member::Method(_) | Member::Field(_) => {}
            }
        }
    }

    fn insert(&mut self, entry: Entry) {
        let key = match &entry {
            Entry::Enum(path) | Entry::Record(path) => segments(path),
            Entry::Alias { scope, name, .. } => {
                let mut key = segments(scope);
                key.push(name.clone());
                key
            }
        };
        self.entries.insert(key, entry);
    }

    /// Classify `text` as written inside `scope`
    pub fn classify(&self, text: &str, scope: &TypePath) -> TypeKind {
        self.classify_depth(text, scope, 0)
    }

    fn classify_depth(&self, text: &str, scope: &TypePath, depth: usize) -> TypeKind {
        let text = text.trim();
        let text = text.strip_prefix("const ").unwrap_or(text).trim();

        if let Some(pointee) = text.strip_suffix('*').or_else(|| text.strip_suffix('&')) {
            let pointee = pointee.trim();
            if pointee == "char" || pointee == "const char" {
                return TypeKind::String;
            }
            return TypeKind::Pointer(pointee.strip_prefix("const ").unwrap_or(pointee).to_string());
        }

        if text == "std::string" {
            return TypeKind::String;
        }

        let unqualified = text
            .strip_prefix("filament::math::")
            .or_else(|| text.strip_prefix("math::"))
            .unwrap_or(text);
        if let Some(primitive) = Primitive::from_name(unqualified) {
            return TypeKind::Primitive(primitive);
        }
        if let Some(vector) = vector_from_name(unqualified) {
            return vector;
        }
        if let Some(target) = self.vector_aliases.get(unqualified) {
            if depth < MAX_ALIAS_DEPTH {
                return self.classify_depth(target, scope, depth + 1);
            }
        }

        match self.lookup(text, scope) {
            Some(Entry::Enum(path)) => TypeKind::Enum(path.clone()),
            Some(Entry::Record(path)) => TypeKind::Record(path.clone()),
            Some(Entry::Alias { scope: alias_scope, name, rhs }) => {
                if depth < MAX_ALIAS_DEPTH {
                    let target = self.classify_depth(rhs, alias_scope, depth + 1);
                    if target.is_mappable() {
                        return target;
                    }
                }
                TypeKind::Alias(name.clone())
            }
            None => TypeKind::Unknown(text.to_string()),
        }
    }

    fn lookup(&self, text: &str, scope: &TypePath) -> Option<&Entry> {
        let name: Vec<String> = text.split("::").map(|s| s.trim().to_string()).collect();
        let scope = segments(scope);
        (0..=scope.len()).rev().find_map(|depth| {
            let mut key = scope[..depth].to_vec();
            key.extend(name.iter().cloned());
            self.entries.get(&key)
        })
    }
}

fn segments(path: &TypePath) -> Vec<String> {
    std::iter::once(&path.root)
        .chain(path.namespaces.iter())
        .chain(path.types.iter())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_ast::parse_str;

    const HEADER: &str = "namespace filament {
struct BloomOptions {
    enum class BlendMode { ADD, INTERPOLATE };
    BlendMode blendMode = BlendMode::ADD;
};
class View {
public:
    enum class QualityLevel { LOW, HIGH };
    using Callback = void(*)(void* user);
    using Level = QualityLevel;
};
}";

    fn table() -> TypeTable {
        let output = parse_str(HEADER).unwrap();
        let aliases = BTreeMap::from([("LinearColor".to_string(), "float3".to_string())]);
        TypeTable::build(&output.root, &aliases)
    }

    fn root() -> TypePath {
        TypePath::new("filament")
    }

    #[test]
    fn test_primitives_and_vectors() {
        let table = table();
        assert_eq!(table.classify("float", &root()), TypeKind::Primitive(Primitive::Float));
        assert_eq!(table.classify("const uint32_t", &root()), TypeKind::Primitive(Primitive::UInt32));
        assert_eq!(table.classify("math::float3", &root()), TypeKind::Vector(Primitive::Float, 3));
        assert_eq!(table.classify("double4", &root()), TypeKind::Vector(Primitive::Double, 4));
        assert_eq!(table.classify("LinearColor", &root()), TypeKind::Vector(Primitive::Float, 3));
    }

    #[test]
    fn test_strings_and_pointers() {
        let table = table();
        assert_eq!(table.classify("const char*", &root()), TypeKind::String);
        assert_eq!(table.classify("std::string", &root()), TypeKind::String);
        assert_eq!(table.classify("Texture*", &root()), TypeKind::Pointer("Texture".into()));
    }

    #[test]
    fn test_lookup_from_inner_scope() {
        let table = table();
        let bloom = root().child_type("BloomOptions");
        let blend_mode = bloom.child_type("BlendMode");
        assert_eq!(table.classify("BlendMode", &bloom), TypeKind::Enum(blend_mode.clone()));
        assert_eq!(table.classify("BloomOptions::BlendMode", &root()), TypeKind::Enum(blend_mode));
        assert_eq!(table.classify("BlendMode", &root()), TypeKind::Unknown("BlendMode".into()));
        assert_eq!(table.classify("BloomOptions", &bloom), TypeKind::Record(bloom.clone()));
    }

    #[test]
    fn test_aliases() {
        let table = table();
        let view = root().child_type("View");
        assert_eq!(table.classify("Callback", &view), TypeKind::Alias("Callback".into()));
        assert_eq!(
            table.classify("Level", &view),
            TypeKind::Enum(view.child_type("QualityLevel"))
        );
        assert!(!table.classify("View::Callback", &root()).is_mappable());
    }

    #[test]
    fn test_unknown() {
        let kind = table().classify("Texture", &root());
        assert_eq!(kind, TypeKind::Unknown("Texture".into()));
        assert!(!kind.is_mappable());
    }
}
