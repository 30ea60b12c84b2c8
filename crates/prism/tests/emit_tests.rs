mod common;

use common::*;
use prism::config::{Config, Patches};
use prism::emit::PatchTarget;
use proptest::prelude::*;
use serde_json::json;

fn java_config() -> Config {
    Config {
        patches: Patches { java_host_class: Some("View".to_string()), ..Patches::default() },
        ..Config::default()
    }
}

// ===== End to end =====

#[test]
fn test_scenario_serialization() {
    let outputs = emit(SCENARIO_HEADER);
    let source = artifact(&outputs, "Settings_generated.cpp");

    assert!(source.contains("out.key(\"x\");"));
    assert!(source.contains("out.key(\"y\");"));
    assert!(source.contains("in.find(\"x\")"));
    assert!(source.contains("in.find(\"y\")"));
    assert!(source.contains("out->x = 1;"));
    assert!(source.contains("out->y[0] = 1;"));
    assert!(source.contains("out->y[1] = 2;"));
    assert!(source.contains("out->y[2] = 3;"));

    let header = artifact(&outputs, "Settings_generated.h");
    assert!(header.contains("void serialize(JsonWriter& out, const S& in);"));
    assert!(header.contains("void deserialize(const JsonValue& in, E* out);"));
    assert!(header.contains("namespace N {"));
}

#[test]
fn test_scenario_defaults_document() {
    let outputs = emit(SCENARIO_HEADER);
    let defaults: serde_json::Value =
        serde_json::from_str(artifact(&outputs, "defaults_generated.json")).unwrap();
    assert_eq!(defaults, json!({ "N::S": { "x": 1, "y": [1, 2, 3] } }));
}

#[test]
fn test_scenario_enum_ordinals() {
    let outputs = emit(SCENARIO_HEADER);
    let enums = artifact(&outputs, "jsenums_generated.cpp");
    let found = positions(
        enums,
        &[".value(\"A\", E::A) // 0", ".value(\"B\", E::B) // 1", ".value(\"C\", E::C) // 2"],
    );
    assert!(is_increasing(&found));

    let typescript = patch(&outputs, PatchTarget::TypeScript);
    assert!(is_increasing(&positions(typescript, &["A = 0,", "B = 1,", "C = 2,"])));
}

#[test]
fn test_scenario_extensions() {
    let outputs = emit(SCENARIO_HEADER);
    let extensions = artifact(&outputs, "extensions_generated.js");
    assert!(extensions.contains("Filament.loadGeneratedExtensions = function() {"));
    assert!(extensions.contains("Filament.makeS = function(overrides) {"));
    assert!(extensions.contains("x: 1,"));
    assert!(extensions.contains("y: [1, 2, 3],"));
}

// ===== Properties =====

#[test]
fn test_output_is_deterministic() {
    let config = java_config();
    let first = emit_with(OPTIONS_HEADER, &config).unwrap();
    let second = emit_with(OPTIONS_HEADER, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_skipped_fields_never_reach_serialization() {
    let input = "namespace N {\nstruct S {\n    int kept = 1;\n    int secret = 2; //!< %codegen_skip_json%\n};\n}\n";
    let outputs = emit(input);

    for name in ["Settings_generated.h", "Settings_generated.cpp", "defaults_generated.json"] {
        assert!(!artifact(&outputs, name).contains("secret"), "secret leaked into {}", name);
    }
    let source = artifact(&outputs, "Settings_generated.cpp");
    assert_eq!(source.matches("\"kept\"").count(), 2);

    // Other backends still see the field
    assert!(artifact(&outputs, "jsbindings_generated.cpp").contains(".field(\"secret\""));
}

#[test]
fn test_skipped_fields_never_reach_javascript() {
    let outputs = emit(OPTIONS_HEADER);
    for name in ["jsbindings_generated.cpp", "extensions_generated.js"] {
        assert!(!artifact(&outputs, name).contains("dirt"));
    }
    assert!(!patch(&outputs, PatchTarget::TypeScript).contains("dirt"));
}

#[test]
fn test_members_keep_declaration_order() {
    let input = "namespace N {\nstruct S {\n    int zeta = 1;\n    int alpha = 2;\n    int mu = 3;\n};\n}\n";
    let outputs = emit(input);

    let source = artifact(&outputs, "Settings_generated.cpp");
    assert!(is_increasing(&positions(source, &["out.key(\"zeta\")", "out.key(\"alpha\")", "out.key(\"mu\")"])));
    assert!(is_increasing(&positions(source, &["in.find(\"zeta\")", "in.find(\"alpha\")", "in.find(\"mu\")"])));

    let bindings = artifact(&outputs, "jsbindings_generated.cpp");
    assert!(is_increasing(&positions(bindings, &[".field(\"zeta\"", ".field(\"alpha\"", ".field(\"mu\""])));

    let typescript = patch(&outputs, PatchTarget::TypeScript);
    assert!(is_increasing(&positions(typescript, &["zeta?:", "alpha?:", "mu?:"])));

    let java = patch(&outputs, PatchTarget::Java);
    assert!(is_increasing(&positions(java, &["int zeta", "int alpha", "int mu"])));
}

#[test]
fn test_vector_default_is_a_sequence() {
    let outputs = emit(OPTIONS_HEADER);
    let defaults: serde_json::Value =
        serde_json::from_str(artifact(&outputs, "defaults_generated.json")).unwrap();
    assert_eq!(defaults["filament::BloomOptions"]["tint"], json!([1.0, 1.0, 1.0]));
    assert_eq!(defaults["filament::FogOptions"]["color"], json!([1.0, 1.0, 1.0]));
    assert_eq!(defaults["filament::BloomOptions"]["blendMode"], json!("ADD"));
    assert_eq!(defaults["filament::FogOptions"]["height"], json!({ "start": 0.5, "falloff": 1.0 }));
}

proptest! {
    #[test]
    fn enum_ordinals_follow_declaration_order(
        values in prop::collection::btree_set("[A-Z][A-Z0-9_]{0,6}", 1..8)
    ) {
        let values: Vec<String> = values.into_iter().collect();
        let input = format!("namespace N {{ enum class Mode {{ {} }}; }}", values.join(", "));
        let outputs = emit(&input);

        let enums = artifact(&outputs, "jsenums_generated.cpp");
        let registrations: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, v)| format!(".value(\"{0}\", Mode::{0}) // {1}\n", v, i))
            .collect();
        let needles: Vec<&str> = registrations.iter().map(String::as_str).collect();
        prop_assert!(is_increasing(&positions(enums, &needles)));
        prop_assert_eq!(enums.matches(".value(").count(), values.len());

        let typescript = patch(&outputs, PatchTarget::TypeScript);
        for (i, v) in values.iter().enumerate() {
            let line = format!("    {} = {},\n", v, i);
            prop_assert!(typescript.contains(&line));
        }
    }
}

// ===== Errors =====

#[test]
fn test_callback_alias_is_unmappable() {
    let input = "namespace N {\nstruct S {\n    using Callback = void(*)(void* user);\n    Callback cb;\n};\n}\n";
    let err = emit_with(input, &Config::default()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("serialization backend cannot map type 'Callback'"));
    assert!(message.contains("line 4"));
}

#[test]
fn test_expression_default_is_rejected() {
    let input = "namespace N {\nstruct S {\n    int x = compute();\n};\n}\n";
    let err = emit_with(input, &Config::default()).unwrap_err();
    assert!(err.to_string().contains("cannot translate default 'compute()'"));
}

#[test]
fn test_unknown_type_is_unmappable() {
    let input = "namespace N {\nstruct S {\n    Mystery m;\n};\n}\n";
    let err = emit_with(input, &Config::default()).unwrap_err();
    assert!(err.to_string().contains("'Mystery'"));
}

#[test]
fn test_float_default_on_integer_field_is_rejected_everywhere() {
    let input = "namespace N {\nstruct S {\n    int x = 0.5f;\n};\n}\n";
    let results = emit_each(input, &java_config());
    assert_eq!(results.len(), 3);
    for (backend, result) in results {
        let err = result.expect_err(backend);
        assert_eq!(
            err.to_string(),
            format!("{} backend cannot translate default '0.5f' of field 'x' at line 3", backend)
        );
    }
}

#[test]
fn test_out_of_range_default_is_rejected() {
    let input = "namespace N {\nstruct S {\n    uint8_t level = 300;\n};\n}\n";
    let err = emit_with(input, &Config::default()).unwrap_err();
    assert!(err.to_string().contains("cannot translate default '300' of field 'level'"));
}

#[test]
fn test_field_typed_as_empty_record_is_kept_everywhere() {
    let input = "namespace N {
struct Empty {
    static constexpr int LIMIT = 4;
};
struct Unused {
};
struct S {
    Empty empty;
    int x = 1;
};
}
";
    let outputs = emit_with(input, &java_config()).unwrap();

    let source = artifact(&outputs, "Settings_generated.cpp");
    assert!(source.contains("void serialize(JsonWriter& out, const Empty& in) {"));
    assert!(source.contains("deserialize(*value, &out->empty);"));
    assert!(!source.contains("Unused"));

    let defaults: serde_json::Value =
        serde_json::from_str(artifact(&outputs, "defaults_generated.json")).unwrap();
    assert_eq!(defaults["N::Empty"], json!({}));

    let bindings = artifact(&outputs, "jsbindings_generated.cpp");
    assert!(bindings.contains("value_object<Empty>(\"Empty\");"));
    assert!(bindings.contains(".field(\"empty\", &S::empty)"));
    assert!(!bindings.contains("Unused"));

    let java = patch(&outputs, PatchTarget::Java);
    assert!(java.contains("public static class Empty {"));
    assert!(java.contains("public Empty empty = new Empty();"));
    assert!(!java.contains("Unused"));
}

// ===== Numeric boundaries =====

const BOUNDARY_HEADER: &str = "namespace N {
struct S {
    uint64_t mask = 0xFFFFFFFFFFFFFFFF;
    uint64_t big = 18446744073709551615ull;
    int32_t offset = -0x10;
    int64_t low = -9223372036854775807;
    float scale = 2;
};
}
";

#[test]
fn test_uint64_maximum_round_trips() {
    let outputs = emit_with(BOUNDARY_HEADER, &java_config()).unwrap();

    let source = artifact(&outputs, "Settings_generated.cpp");
    assert!(source.contains("out->mask = 18446744073709551615u;"));
    assert!(source.contains("out->big = 18446744073709551615u;"));

    let defaults: serde_json::Value =
        serde_json::from_str(artifact(&outputs, "defaults_generated.json")).unwrap();
    assert_eq!(defaults["N::S"]["mask"], json!(u64::MAX));

    let extensions = artifact(&outputs, "extensions_generated.js");
    assert!(extensions.contains("mask: 18446744073709551615,"));

    let java = patch(&outputs, PatchTarget::Java);
    assert!(java.contains("public long mask = 0xFFFFFFFFFFFFFFFFL;"));
}

#[test]
fn test_negative_hex_default() {
    let outputs = emit_with(BOUNDARY_HEADER, &java_config()).unwrap();
    assert!(artifact(&outputs, "Settings_generated.cpp").contains("out->offset = -16;"));
    assert!(artifact(&outputs, "extensions_generated.js").contains("offset: -16,"));
    assert!(patch(&outputs, PatchTarget::Java).contains("public int offset = -16;"));
    assert!(patch(&outputs, PatchTarget::Java).contains("public long low = -9223372036854775807L;"));

    let defaults: serde_json::Value =
        serde_json::from_str(artifact(&outputs, "defaults_generated.json")).unwrap();
    assert_eq!(defaults["N::S"]["offset"], json!(-16));
}

#[test]
fn test_integer_default_on_float_field() {
    let outputs = emit_with(BOUNDARY_HEADER, &java_config()).unwrap();
    assert!(patch(&outputs, PatchTarget::Java).contains("public float scale = 2.0f;"));
    assert!(artifact(&outputs, "Settings_generated.cpp").contains("out->scale = 2;"));
}

#[test]
fn test_integer_default_on_narrowed_double() {
    let input = "namespace N {\nstruct S {\n    double ratio = 1; //!< %codegen_java_float%\n};\n}\n";
    let outputs = emit_with(input, &java_config()).unwrap();
    let java = patch(&outputs, PatchTarget::Java);
    assert!(java.contains("public float ratio = 1.0f;"));
    assert!(artifact(&outputs, "Settings_generated.cpp").contains("out->ratio = 1;"));
}

// ===== Dynamic runtime =====

#[test]
fn test_bindings_register_inline_objects_first() {
    let outputs = emit(OPTIONS_HEADER);
    let bindings = artifact(&outputs, "jsbindings_generated.cpp");
    assert!(bindings.contains("using FogOptions_height = decltype(FogOptions::height);"));
    assert!(is_increasing(&positions(
        bindings,
        &["value_object<FogOptions_height>(\"FogOptions$Height\")", "value_object<FogOptions>(\"FogOptions\")"]
    )));
    assert!(bindings.contains(".field(\"height\", &FogOptions::height);"));
}

#[test]
fn test_typescript_declarations() {
    let outputs = emit(OPTIONS_HEADER);
    let typescript = patch(&outputs, PatchTarget::TypeScript);
    assert!(typescript.contains("export enum BloomOptions$BlendMode {"));
    assert!(typescript.contains("    INTERPOLATE = 1,"));
    assert!(typescript.contains("/**\n * Options to control the bloom effect\n */\nexport interface BloomOptions {")
        || typescript.contains("/** Options to control the bloom effect */\nexport interface BloomOptions {"));
    assert!(typescript.contains("    blendMode?: BloomOptions$BlendMode;"));
    assert!(typescript.contains("    tint?: [number, number, number];"));
    assert!(typescript.contains("    enabled?: boolean;"));
    assert!(typescript.contains("export enum View$QualityLevel {"));
    assert!(typescript.contains("    HIGH = 2,"));
}

#[test]
fn test_typescript_group_markers_are_clean() {
    let input = "namespace N {\nstruct S {\n    /** @{ %codegen_java_float% */\n    double d = 1;\n    /** @} */\n};\n}\n";
    let outputs = emit(input);
    let typescript = patch(&outputs, PatchTarget::TypeScript);
    assert!(typescript.contains("    /** @{ */\n    d?: number;\n    /** @} */"));
    assert!(!typescript.contains("codegen"));
}

#[test]
fn test_extensions_reference_enum_values() {
    let outputs = emit(OPTIONS_HEADER);
    let extensions = artifact(&outputs, "extensions_generated.js");
    assert!(extensions.contains("blendMode: Filament.BloomOptions$BlendMode.ADD,"));
    assert!(extensions.contains("Filament.makeFogOptions = function(overrides) {"));
}

// ===== Managed runtime =====

#[test]
fn test_java_host_class_is_unwrapped() {
    let outputs = emit_with(OPTIONS_HEADER, &java_config()).unwrap();
    let java = patch(&outputs, PatchTarget::Java);
    assert!(java.contains("    public enum QualityLevel {"));
    assert!(!java.contains("class View"));
    assert!(java.contains("    public static class BloomOptions {"));
}

#[test]
fn test_java_fields() {
    let outputs = emit_with(OPTIONS_HEADER, &java_config()).unwrap();
    let java = patch(&outputs, PatchTarget::Java);
    assert!(java.contains("public float strength = 0.10f;"));
    assert!(java.contains("public int resolution = 384;"));
    assert!(java.contains("@NonNull\n        public BloomOptions.BlendMode blendMode = BloomOptions.BlendMode.ADD;"));
    assert!(java.contains("public boolean enabled = false;"));
    assert!(java.contains("public float[] tint = { 1.0f, 1.0f, 1.0f };"));
    assert!(java.contains("@Nullable\n        public Texture dirt;"));
}

#[test]
fn test_java_narrow_float() {
    let outputs = emit_with(OPTIONS_HEADER, &java_config()).unwrap();
    let java = patch(&outputs, PatchTarget::Java);
    assert!(java.contains("public float density = 0.1f;"));
    assert!(!java.contains("double density"));

    // Other backends keep the declared type
    let source = artifact(&outputs, "Settings_generated.cpp");
    assert!(source.contains("out->density = 0.1;"));
}

#[test]
fn test_java_inline_object() {
    let outputs = emit_with(OPTIONS_HEADER, &java_config()).unwrap();
    let java = patch(&outputs, PatchTarget::Java);
    assert!(java.contains("public static class Height {"));
    assert!(java.contains("public Height height = new Height();"));
}
