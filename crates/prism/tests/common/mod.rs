// Shared fixtures and helpers for prism tests
#![allow(dead_code)]

use prism::config::{Config, DEFAULT_CONFIG_FILE};
use prism::emit::{backends, EmitContext, EmitError, Output, PatchTarget};
use prism::pipeline::{self, ScanMode};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

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

/**
 * Options to control fog in the scene
 */
struct FogOptions {
    float distance = 0.0f;
    LinearColor color = {1.0f, 1.0f, 1.0f};
    double density = 0.1;                   //!< %codegen_java_float%
    struct {
        float start = 0.5f;
        float falloff = 1.0f;
    } height;
};

class UTILS_PUBLIC View : public FilamentAPI {
public:
    enum class QualityLevel : uint8_t {
        LOW,
        MEDIUM,
        HIGH
    };

    void setBloomOptions(BloomOptions options) noexcept;
    QualityLevel getQuality() const noexcept { return mQuality; }

private:
    QualityLevel mQuality = QualityLevel::LOW;
};

} // namespace filament

#endif // TNT_FILAMENT_OPTIONS_H
"#;

/// The smallest header exercising records, vectors and enums together
pub const SCENARIO_HEADER: &str =
    "namespace N { struct S { int x = 1; float3 y = {1,2,3}; }; enum class E { A, B, C }; }";

pub const TYPESCRIPT_FILE: &str = "\
export declare class View {
    setBloomOptions(options: View$BloomOptions): void;
}

// GENERATED CODE BEGIN
// GENERATED CODE END
";

pub const JAVA_FILE: &str = "\
package com.google.android.filament;

public class View {
    // GENERATED CODE BEGIN
    // GENERATED CODE END

    public void setBloomOptions(@NonNull BloomOptions options) {
    }
}
";

/// Run every backend over header text with the given configuration
pub fn emit_with(input: &str, config: &Config) -> prism::Result<Vec<Output>> {
    let resolved = pipeline::load_str(input, config, ScanMode::Inline)?;
    let staged = pipeline::emit(&resolved, config)?;
    Ok(staged.outputs().to_vec())
}

/// Run every backend on its own, so one failing does not hide the others
pub fn emit_each(input: &str, config: &Config) -> Vec<(&'static str, Result<Output, EmitError>)> {
    let resolved = pipeline::load_str(input, config, ScanMode::Inline).unwrap();
    let ctx = EmitContext::new(config, &resolved);
    backends().iter().map(|b| (b.name(), b.emit(&resolved, &ctx))).collect()
}

pub fn emit(input: &str) -> Vec<Output> {
    emit_with(input, &Config::default()).unwrap()
}

/// Contents of the named artifact, whichever backend produced it
pub fn artifact<'a>(outputs: &'a [Output], name: &str) -> &'a str {
    outputs
        .iter()
        .find_map(|o| o.artifact(name))
        .map(|a| a.contents.as_str())
        .unwrap_or_else(|| panic!("no artifact named {}", name))
}

pub fn patch(outputs: &[Output], target: PatchTarget) -> &str {
    outputs
        .iter()
        .find_map(|o| o.patch(target))
        .map(|p| p.contents.as_str())
        .unwrap_or_else(|| panic!("no {} patch", target))
}

/// Byte offsets of each needle in `haystack`, panicking when one is missing
pub fn positions(haystack: &str, needles: &[&str]) -> Vec<usize> {
    needles
        .iter()
        .map(|n| haystack.find(n).unwrap_or_else(|| panic!("'{}' not found in:\n{}", n, haystack)))
        .collect()
}

pub fn is_increasing(values: &[usize]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

/// A project directory with a header, a configuration and both patch targets
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new(header: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Options.h"), header).unwrap();
        fs::create_dir_all(dir.path().join("web")).unwrap();
        fs::create_dir_all(dir.path().join("java")).unwrap();
        fs::write(dir.path().join("web/filament.d.ts"), TYPESCRIPT_FILE).unwrap();
        fs::write(dir.path().join("java/View.java"), JAVA_FILE).unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            r#"input = "Options.h"
output_dir = "generated"

[patches]
typescript = "web/filament.d.ts"
java = "java/View.java"
java_host_class = "View"
"#,
        )
        .unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join(DEFAULT_CONFIG_FILE)
    }

    pub fn generated(&self, name: &str) -> PathBuf {
        self.path().join("generated").join(name)
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path().join(relative)).unwrap()
    }
}
