// Shared fixtures and helpers for prism-ast tests
#![allow(dead_code)]

use prism_ast::ast::*;
use prism_ast::lexer::{Lexer, Token, TokenKind};
use prism_ast::{parse_str, resolve, ParseOutput, Resolved};

/// A header in the shape the generator is meant for
pub const OPTIONS_HEADER: &str = r#"#ifndef TNT_FILAMENT_OPTIONS_H
#define TNT_FILAMENT_OPTIONS_H

#include <stdint.h>

namespace filament {

/**
 * Options to control the bloom effect
 */
struct BloomOptions {
    enum class BlendMode : uint8_t {
        ADD,          //!< added to the scene
        INTERPOLATE   //!< interpolated with the scene
    };
    float strength = 0.10f;                 //!< strength between 0.0 and 1.0
    uint32_t resolution = 384;              //!< resolution of vertical axis
    BlendMode blendMode = BlendMode::ADD;   //!< how the effect is applied
    bool enabled = false;                   //!< enable or disable bloom
    math::float3 tint = {1.0f, 1.0f, 1.0f}; //!< color tint
    Texture* dirt = nullptr;                //!< %codegen_skip_json% %codegen_skip_javascript% dirt texture
};

class UTILS_PUBLIC View : public FilamentAPI {
public:
    /** @{ */
    enum class QualityLevel : uint8_t {
        LOW,
        MEDIUM,
        HIGH
    };
    /** @} */

    using Callback = void(*)(void* user);

    void setBloomOptions(BloomOptions options) noexcept;
    QualityLevel getQuality() const noexcept { return mQuality; }

private:
    QualityLevel mQuality = QualityLevel::LOW;
};

} // namespace filament

#endif // TNT_FILAMENT_OPTIONS_H
"#;

pub fn tokens(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

pub fn kinds(input: &str) -> Vec<TokenKind> {
    tokens(input).into_iter().map(|t| t.kind).collect()
}

pub fn parse(input: &str) -> ParseOutput {
    parse_str(input).unwrap()
}

pub fn resolve_str(input: &str) -> Resolved {
    resolve(parse(input)).unwrap()
}

/// Top-level struct with the given name
pub fn find_struct<'a>(root: &'a Root, name: &str) -> &'a Struct {
    root.namespace
        .children
        .iter()
        .find_map(|d| match d {
            Decl::Struct(s) if s.name.as_deref() == Some(name) => Some(s),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no struct named {}", name))
}

pub fn find_class<'a>(root: &'a Root, name: &str) -> &'a Class {
    root.namespace
        .children
        .iter()
        .find_map(|d| match d {
            Decl::Class(c) if c.name == name => Some(c),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no class named {}", name))
}

pub fn fields(members: &[Member]) -> Vec<&Field> {
    members
        .iter()
        .filter_map(|m| match m {
            Member::Field(f) => Some(f),
            _ => None,
        })
        .collect()
}

pub fn field<'a>(members: &'a [Member], name: &str) -> &'a Field {
    fields(members)
        .into_iter()
        .find(|f| f.name == name)
        .unwrap_or_else(|| panic!("no field named {}", name))
}
