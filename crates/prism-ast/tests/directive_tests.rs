mod common;

use common::*;
use prism_ast::ast::Member;
use prism_ast::{parse_str, resolve, DirectiveError, Flags};

#[test]
fn test_field_directives_recorded() {
    let resolved = resolve_str(OPTIONS_HEADER);
    let bloom = find_struct(&resolved.root, "BloomOptions");
    let dirt = field(&bloom.members, "dirt");

    let flags = resolved.directives.get(dirt.line, "dirt");
    assert!(flags.contains(Flags::SKIP_SERIALIZATION));
    assert!(flags.contains(Flags::SKIP_DYNAMIC_BINDING));
    assert!(!flags.contains(Flags::NARROW_FLOAT));

    let strength = field(&bloom.members, "strength");
    assert!(resolved.directives.get(strength.line, "strength").is_empty());
}

#[test]
fn test_markers_stripped_from_docs() {
    let resolved = resolve_str(OPTIONS_HEADER);
    let bloom = find_struct(&resolved.root, "BloomOptions");
    let dirt = field(&bloom.members, "dirt");
    assert_eq!(resolved.doc(dirt.line).as_deref(), Some("dirt texture"));
    assert!(resolved.docs.iter().all(|c| !c.text.contains("%codegen")));
}

#[test]
fn test_type_level_directive() {
    let input = "namespace a {\n// %codegen_skip_javascript%\nstruct Internal {\n    int x;\n};\n}";
    let resolved = resolve_str(input);
    let internal = find_struct(&resolved.root, "Internal");
    assert_eq!(internal.line, 3);
    assert_eq!(resolved.directives.get(3, "Internal"), Flags::SKIP_DYNAMIC_BINDING);
    assert_eq!(resolved.doc(3), None);
}

#[test]
fn test_leading_directive_comment() {
    let input = "namespace a {\nstruct S {\n    // Precision of the value\n    // %codegen_java_float%\n    double value = 1.0;\n};\n}";
    let resolved = resolve_str(input);
    assert_eq!(resolved.directives.get(5, "value"), Flags::NARROW_FLOAT);
    assert_eq!(resolved.doc(5).as_deref(), Some("Precision of the value"));
}

#[test]
fn test_flatten_is_recognized() {
    let input = "namespace a { struct S { Inner inner; //!< %codegen_java_flatten%\n}; }";
    let resolved = resolve_str(input);
    assert_eq!(resolved.directives.get(1, "inner"), Flags::FLATTEN);
}

#[test]
fn test_unknown_directive_is_an_error() {
    let input = "namespace a {\nstruct S {\n    int x; //!< %codegen_skip_jsno%\n};\n}";
    let err = resolve(parse_str(input).unwrap()).unwrap_err();
    assert_eq!(err, DirectiveError::Unknown { name: "codegen_skip_jsno".into(), line: 3 });
    assert_eq!(err.to_string(), "Unknown directive '%codegen_skip_jsno%' at line 3");
}

#[test]
fn test_unknown_directive_in_detached_comment() {
    let input = "namespace a {\n// %typo%\n\nstruct S { int x; };\n}";
    let err = resolve(parse_str(input).unwrap()).unwrap_err();
    assert_eq!(err.line(), 2);
}

#[test]
fn test_resolve_leaves_ast_untouched() {
    let parsed = parse(OPTIONS_HEADER);
    let root = parsed.root.clone();
    let resolved = resolve(parsed).unwrap();
    assert_eq!(resolved.root, root);
}

#[test]
fn test_percent_signs_are_not_directives() {
    let input = "namespace a { struct S { float ratio = 0.5f; //!< between 0% and 100%\n}; }";
    let resolved = resolve_str(input);
    assert!(resolved.directives.is_empty());
    assert_eq!(resolved.doc(1).as_deref(), Some("between 0% and 100%"));
}

#[test]
fn test_unknown_directive_in_group_comment() {
    let input = "namespace a {\nstruct S {\n    /** @{ %codegen_skip_jsno% */\n    int x;\n    /** @} */\n};\n}";
    let err = resolve(parse_str(input).unwrap()).unwrap_err();
    assert_eq!(err, DirectiveError::Unknown { name: "codegen_skip_jsno".into(), line: 3 });
}

#[test]
fn test_group_comment_markers_are_stripped() {
    let input = "namespace a {\nstruct S {\n    /** @{ %codegen_skip_json% */\n    int x;\n    /** @} */\n};\n}";
    let resolved = resolve_str(input);
    let s = find_struct(&resolved.root, "S");
    let groups: Vec<&str> = s
        .members
        .iter()
        .filter_map(|m| match m {
            Member::Group(g) => Some(g.doc.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(groups, vec!["/** @{ */", "/** @} */"]);
}
