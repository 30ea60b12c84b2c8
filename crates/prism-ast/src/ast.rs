//! Header AST
//!
//! Every node is built once by the parser and is read-only afterwards.
//! Member and child lists keep declaration order, which is also the order
//! every backend emits in.

use serde::Serialize;
use std::fmt;

pub type Line = usize;

/// The root of the AST
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Root {
    pub line: Line,
    pub namespace: Namespace,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Namespace {
    pub line: Line,
    /// Empty for an anonymous namespace
    pub name: String,
    pub children: Vec<Decl>,
}

impl Namespace {
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

/// Declarations allowed directly inside a namespace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Decl {
    Namespace(Namespace),
    Class(Class),
    Struct(Struct),
    Enum(Enum),
}

impl Decl {
    pub fn line(&self) -> Line {
        match self {
            Decl::Namespace(n) => n.line,
            Decl::Class(c) => c.line,
            Decl::Struct(s) => s.line,
            Decl::Enum(e) => e.line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Class {
    pub line: Line,
    pub name: String,
    pub base: Option<String>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Struct {
    pub line: Line,
    pub name: Option<String>,
    pub members: Vec<Member>,
    /// `struct { ... } instance;`
    pub instance_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enum {
    pub line: Line,
    pub name: String,
    pub underlying: Option<String>,
    /// Implicitly numbered from zero in this order
    pub values: Vec<String>,
}

impl Enum {
    /// Value names paired with their ordinals
    pub fn ordinals(&self) -> impl Iterator<Item = (&str, usize)> {
        self.values.iter().enumerate().map(|(i, v)| (v.as_str(), i))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Member {
    Access(AccessSpecifier),
    Group(GroupingDelimiter),
    Using(Using),
    Method(Method),
    Field(Field),
    Class(Class),
    Struct(Struct),
    Enum(Enum),
}

impl Member {
    pub fn line(&self) -> Line {
        match self {
            Member::Access(a) => a.line,
            Member::Group(g) => g.line,
            Member::Using(u) => u.line,
            Member::Method(m) => m.line,
            Member::Field(f) => f.line,
            Member::Class(c) => c.line,
            Member::Struct(s) => s.line,
            Member::Enum(e) => e.line,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Member::Access(_) => "AccessSpecifier",
            Member::Group(_) => "GroupingDelimiter",
            Member::Using(_) => "Using",
            Member::Method(_) => "Method",
            Member::Field(_) => "Field",
            Member::Class(_) => "Class",
            Member::Struct(_) => "Struct",
            Member::Enum(_) => "Enum",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Using {
    pub line: Line,
    pub name: String,
    pub rhs: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Access {
    Public,
    Protected,
    Private,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessSpecifier {
    pub line: Line,
    pub access: Access,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupKind {
    Begin,
    End,
}

/// A `/** @{ */` or `/** @} */` doc comment, kept verbatim
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupingDelimiter {
    pub line: Line,
    pub kind: GroupKind,
    pub doc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    pub line: Line,
    pub name: String,
    /// Empty for constructors and destructors
    pub return_type: String,
    /// Unparsed, including the outer parentheses
    pub arguments: String,
    /// Unparsed, including the outer braces. Present for inline methods.
    pub body: Option<String>,
    pub is_template: bool,
    pub is_const: bool,
    pub is_noexcept: bool,
}

impl Method {
    pub fn is_inline(&self) -> bool {
        self.body.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub line: Line,
    pub name: String,
    pub field_type: String,
    /// Unparsed right-hand side of `=`
    pub default: Option<String>,
}

impl Field {
    /// Class-level (non instance) members
    pub fn is_static(&self) -> bool {
        self.field_type.split_whitespace().any(|w| w == "static" || w == "constexpr")
    }

    pub fn default_value(&self) -> Option<DefaultValue> {
        self.default.as_deref().map(DefaultValue::parse)
    }
}

/// A field default, with brace lists split into their items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DefaultValue {
    Scalar(String),
    List(Vec<String>),
}

impl DefaultValue {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
            Some(inner) => DefaultValue::List(split_top_level(inner)),
            None => DefaultValue::Scalar(text.to_string()),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, DefaultValue::List(_))
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Scalar(s) => write!(f, "{}", s),
            DefaultValue::List(items) => write!(f, "[{}]", items.join(",")),
        }
    }
}

/// Split on commas that are not nested in any bracket or quoted.
///
/// `<` opens a template argument list only when it directly follows a name,
/// so `a < b` stays a comparison.
fn split_top_level(text: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut angles = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut previous = ' ';
    let mut current = String::new();
    for ch in text.chars() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth = depth.saturating_sub(1),
            '<' if previous.is_alphanumeric() || previous == '_' => angles += 1,
            '>' if angles > 0 => angles -= 1,
            ',' if depth == 0 && angles == 0 => {
                items.push(current.trim().to_string());
                current.clear();
                previous = ch;
                continue;
            }
            _ => {}
        }
        previous = ch;
        current.push(ch);
    }
    if !current.trim().is_empty() {
        items.push(current.trim().to_string());
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scalar() {
        assert_eq!(DefaultValue::parse(" 0.5f "), DefaultValue::Scalar("0.5f".to_string()));
    }

    #[test]
    fn test_default_list() {
        let value = DefaultValue::parse("{1, 2, 3}");
        assert_eq!(value, DefaultValue::List(vec!["1".into(), "2".into(), "3".into()]));
        assert_eq!(value.to_string(), "[1,2,3]");
    }

    #[test]
    fn test_default_list_with_nested_call() {
        let value = DefaultValue::parse("{ f(1, 2), 3 }");
        assert_eq!(value, DefaultValue::List(vec!["f(1, 2)".into(), "3".into()]));
    }

    #[test]
    fn test_default_list_with_quoted_commas() {
        let value = DefaultValue::parse(r#"{"a,b", "c\",d", ','}"#);
        assert_eq!(
            value,
            DefaultValue::List(vec![r#""a,b""#.into(), r#""c\",d""#.into(), "','".into()])
        );
    }

    #[test]
    fn test_default_list_with_templates_and_comparisons() {
        let value = DefaultValue::parse("{ std::pair<int, int>{1, 2}, a < b, c > d }");
        assert_eq!(
            value,
            DefaultValue::List(vec!["std::pair<int, int>{1, 2}".into(), "a < b".into(), "c > d".into()])
        );
    }

    #[test]
    fn test_default_list_trailing_comma() {
        let value = DefaultValue::parse("{0.0f, 1.0f,}");
        assert_eq!(value, DefaultValue::List(vec!["0.0f".into(), "1.0f".into()]));
    }

    #[test]
    fn test_static_field() {
        let field = Field {
            line: 1,
            name: "MAX".into(),
            field_type: "static constexpr float".into(),
            default: Some("1.0f".into()),
        };
        assert!(field.is_static());
    }

    #[test]
    fn test_enum_ordinals() {
        let e = Enum {
            line: 1,
            name: "E".into(),
            underlying: None,
            values: vec!["A".into(), "B".into(), "C".into()],
        };
        let ordinals: Vec<_> = e.ordinals().collect();
        assert_eq!(ordinals, vec![("A", 0), ("B", 1), ("C", 2)]);
    }
}
