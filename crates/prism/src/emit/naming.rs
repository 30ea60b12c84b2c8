//! Target-language names for declarations

use serde::Serialize;

/// Where a type is declared: the root namespace, the named namespaces below
/// it, then the enclosing types ending with the type itself
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TypePath {
    pub root: String,
    pub namespaces: Vec<String>,
    pub types: Vec<String>,
}

impl TypePath {
    pub fn new(root: &str) -> Self {
        Self { root: root.to_string(), namespaces: Vec::new(), types: Vec::new() }
    }

    pub fn child_namespace(&self, name: &str) -> Self {
        let mut path = self.clone();
        path.namespaces.push(name.to_string());
        path
    }

    pub fn child_type(&self, name: &str) -> Self {
        let mut path = self.clone();
        path.types.push(name.to_string());
        path
    }

    /// Unqualified name of the type
    pub fn name(&self) -> &str {
        self.types.last().map(String::as_str).unwrap_or("")
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().chain(self.types.iter()).map(String::as_str)
    }
}

/// Fully qualified C++ name, e.g. `filament::View::QualityLevel`
pub fn cpp_name(path: &TypePath) -> String {
    std::iter::once(path.root.as_str())
        .filter(|root| !root.is_empty())
        .chain(path.segments())
        .collect::<Vec<_>>()
        .join("::")
}

/// C++ name as seen from inside the root namespace, e.g. `View::QualityLevel`
pub fn cpp_relative(path: &TypePath) -> String {
    path.segments().collect::<Vec<_>>().join("::")
}

/// Name registered with the dynamic runtime, e.g. `View$QualityLevel`
pub fn js_name(path: &TypePath) -> String {
    path.segments().collect::<Vec<_>>().join("$")
}

/// Name of the generated defaults factory, e.g. `makeViewBloomOptions`
pub fn js_factory(path: &TypePath) -> String {
    let mut name = String::from("make");
    for segment in path.segments() {
        name.push_str(&pascal_case(segment));
    }
    name
}

/// Java name relative to the patched file. Types nested in the host class are
/// referred to without it.
pub fn java_name(path: &TypePath, host: Option<&str>) -> String {
    let types = match (path.types.first(), host) {
        (Some(first), Some(host)) if first == host && path.types.len() > 1 => &path.types[1..],
        _ => &path.types[..],
    };
    types.join(".")
}

/// `screen_space` and `near` become `ScreenSpace` and `Near`
pub fn pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
