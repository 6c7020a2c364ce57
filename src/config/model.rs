// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// A minimal config only needs the transform sources and command:
///
/// ```toml
/// [build]
/// dest = "dist"
///
/// [build.transform]
/// sources = ["src/*.elm"]
/// command = "elm make {input} --output {output}"
///
/// [build.assets]
/// sources = ["static/**/*"]
///
/// [watch]
/// debounce_ms = 200
///
/// [serve]
/// host = "127.0.0.1"
/// port = 8000
/// ```
///
/// `[watch]` and `[serve]` are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Build pipeline config from `[build]`.
    pub build: BuildSection,

    /// Watch behaviour from `[watch]`.
    #[serde(default)]
    pub watch: WatchSection,

    /// Dev server config from `[serve]`.
    #[serde(default)]
    pub serve: ServeSection,
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Destination directory for all build outputs, relative to the
    /// project root.
    #[serde(default = "default_dest")]
    pub dest: String,

    /// The transform step from `[build.transform]`.
    pub transform: TransformSection,

    /// Optional static asset copying from `[build.assets]`.
    #[serde(default)]
    pub assets: Option<AssetsSection>,
}

/// `[build.transform]` section.
///
/// Describes which source files are fed to the external transformer and how
/// the command line is built for each invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformSection {
    /// Glob patterns selecting the source files, relative to the project root.
    pub sources: Vec<String>,

    /// Command template for the transformer.
    ///
    /// Per-file mode substitutes `{input}` and `{output}`; bundle mode
    /// substitutes `{inputs}` (all files, space separated) and `{output}`.
    pub command: String,

    /// `"per-file"` (default) or `"bundle"`.
    ///
    /// - `"per-file"`: one transformer invocation per source file, each
    ///   producing its own artifact under `dest`.
    /// - `"bundle"`: a single invocation over all source files, producing
    ///   one combined artifact.
    #[serde(default = "default_mode")]
    pub mode: String,

    /// File name of the combined artifact in bundle mode.
    #[serde(default = "default_bundle_name")]
    pub bundle: String,

    /// Extension given to per-file artifacts (without the leading dot).
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Glob patterns removed from the source set.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[build.assets]` section.
///
/// Files matching `sources` are copied byte-for-byte under `dest`, keeping
/// their path relative to the literal part of the pattern that matched them
/// (`static/css/site.css` with pattern `static/**/*` lands at
/// `dest/css/site.css`).
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsSection {
    /// Glob patterns selecting the asset files, relative to the project root.
    pub sources: Vec<String>,

    /// Glob patterns removed from the asset set.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Quiet window in milliseconds: change events arriving within this
    /// window of each other collapse into a single rebuild trigger.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[serve]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeSection {
    /// Address the dev server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the dev server binds to.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_dest() -> String {
    "dist".to_string()
}

fn default_mode() -> String {
    "per-file".to_string()
}

fn default_bundle_name() -> String {
    "bundle.js".to_string()
}

fn default_extension() -> String {
    "html".to_string()
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}
