use crate::patch::Markers;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "prism.toml";

/// Generator configuration with layered defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Annotated header to read
    pub input: PathBuf,

    /// Directory generated artifacts are written to
    pub output_dir: PathBuf,

    /// Name of the JavaScript module object that owns the bindings
    pub js_module: String,

    /// Token queue size when the scanner runs on its own thread
    pub channel_capacity: usize,

    /// Annotation macros to drop, in addition to the built-in list
    pub ignored_macros: Vec<String>,

    /// Type names that stand for a vector type, e.g. `LinearColor = "float3"`
    pub aliases: BTreeMap<String, String>,

    pub outputs: Outputs,
    pub patches: Patches,
    pub markers: Markers,
}

/// File names of the generated artifacts, relative to `output_dir`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outputs {
    pub serialization_header: String,
    pub serialization_source: String,
    pub defaults_json: String,
    pub js_bindings: String,
    pub js_enums: String,
    pub js_extensions: String,
}

/// Hand-maintained files with a generated region
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patches {
    pub typescript: Option<PathBuf>,
    pub java: Option<PathBuf>,

    /// Class the Java file declares; its nested types are emitted unwrapped
    pub java_host_class: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("Options.h"),
            output_dir: PathBuf::from("generated"),
            js_module: "Filament".to_string(),
            channel_capacity: 16,
            ignored_macros: Vec::new(),
            aliases: default_aliases(),
            outputs: Outputs::default(),
            patches: Patches::default(),
            markers: Markers::default(),
        }
    }
}

impl Default for Outputs {
    fn default() -> Self {
        Self {
            serialization_header: "Settings_generated.h".to_string(),
            serialization_source: "Settings_generated.cpp".to_string(),
            defaults_json: "defaults_generated.json".to_string(),
            js_bindings: "jsbindings_generated.cpp".to_string(),
            js_enums: "jsenums_generated.cpp".to_string(),
            js_extensions: "extensions_generated.js".to_string(),
        }
    }
}

fn default_aliases() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("LinearColor".to_string(), "float3".to_string()),
        ("LinearColorA".to_string(), "float4".to_string()),
    ])
}

impl Config {
    /// Load configuration from defaults and the given file.
    ///
    /// A missing file is only an error when it was asked for explicitly.
    /// Relative paths in the file are taken relative to the file's directory.
    pub fn load(path: &Path, explicit: bool) -> Result<Self> {
        // Start with defaults
        let mut config = Config::default();

        if !path.exists() {
            if explicit {
                bail!("Configuration file '{}' does not exist", path.display());
            }
            log::debug!("no configuration at {}, using defaults", path.display());
            return Ok(config);
        }

        let file_config = Self::load_from_file(path)?;
        config.merge(file_config);

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.resolve_paths(base);
        log::debug!("loaded configuration from {}", path.display());

        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<PartialConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: PartialConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(config)
    }

    /// Merge partial config into this one (partial takes precedence for specified fields)
    fn merge(&mut self, other: PartialConfig) {
        if let Some(val) = other.input {
            self.input = val;
        }
        if let Some(val) = other.output_dir {
            self.output_dir = val;
        }
        if let Some(val) = other.js_module {
            self.js_module = val;
        }
        if let Some(val) = other.channel_capacity {
            self.channel_capacity = val;
        }
        if let Some(val) = other.ignored_macros {
            self.ignored_macros = val;
        }
        if let Some(val) = other.aliases {
            self.aliases.extend(val);
        }
        if let Some(outputs) = other.outputs {
            let o = &mut self.outputs;
            for (slot, val) in [
                (&mut o.serialization_header, outputs.serialization_header),
                (&mut o.serialization_source, outputs.serialization_source),
                (&mut o.defaults_json, outputs.defaults_json),
                (&mut o.js_bindings, outputs.js_bindings),
                (&mut o.js_enums, outputs.js_enums),
                (&mut o.js_extensions, outputs.js_extensions),
            ] {
                if let Some(val) = val {
                    *slot = val;
                }
            }
        }
        if let Some(patches) = other.patches {
            if patches.typescript.is_some() {
                self.patches.typescript = patches.typescript;
            }
            if patches.java.is_some() {
                self.patches.java = patches.java;
            }
            if patches.java_host_class.is_some() {
                self.patches.java_host_class = patches.java_host_class;
            }
        }
        if let Some(markers) = other.markers {
            if let Some(val) = markers.begin {
                self.markers.begin = val;
            }
            if let Some(val) = markers.end {
                self.markers.end = val;
            }
        }
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &Path| if p.is_relative() { base.join(p) } else { p.to_path_buf() };
        self.input = resolve(&self.input);
        self.output_dir = resolve(&self.output_dir);
        self.patches.typescript = self.patches.typescript.as_deref().map(resolve);
        self.patches.java = self.patches.java.as_deref().map(resolve);
    }
}

/// Partial configuration for deserializing from TOML with optional fields
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    js_module: Option<String>,
    channel_capacity: Option<usize>,
    ignored_macros: Option<Vec<String>>,
    aliases: Option<BTreeMap<String, String>>,
    outputs: Option<PartialOutputs>,
    patches: Option<PartialPatches>,
    markers: Option<PartialMarkers>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialOutputs {
    serialization_header: Option<String>,
    serialization_source: Option<String>,
    defaults_json: Option<String>,
    js_bindings: Option<String>,
    js_enums: Option<String>,
    js_extensions: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialPatches {
    typescript: Option<PathBuf>,
    java: Option<PathBuf>,
    java_host_class: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialMarkers {
    begin: Option<String>,
    end: Option<String>,
}
