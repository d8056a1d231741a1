//! Interop definition file (`.interop.toml`) parsing.
//!
//! An interop definition names the managed package the bindings land in,
//! the native library (headers, preamble, compiler flags), the target, and
//! the knobs that steer mapping decisions. It may also carry a small
//! declaration table of C prototypes for libraries without usable headers.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use cinterop_index::signature::{parse_function, parse_global};
use cinterop_index::{Language, NativeIndex, NativeLibrary};
use cinterop_targets::parse::resolve_target;
use cinterop_targets::Target;

use crate::error::{GenError, Result};

/// The managed runtime the bindings are generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagedPlatform {
    /// Natively compiled managed code calling C directly.
    #[default]
    Native,
    /// A JVM host reached through JNI.
    Jvm,
}

impl ManagedPlatform {
    /// Whether unsigned integer types exist on the managed side.
    pub fn uses_unsigned_types(self) -> bool {
        matches!(self, ManagedPlatform::Native)
    }
}

/// A C function declared by prototype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeclaredFunction {
    /// C prototype (e.g., "double sin(double x)").
    pub c_signature: String,
    /// The function is a macro or builtin without a linkable address.
    #[serde(default)]
    pub requires_wrapper: bool,
}

/// A complete interop definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InteropConfig {
    /// Managed package of the generated bindings (e.g., "platform.zlib").
    pub package: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub platform: ManagedPlatform,
    /// Builtin target name or a `.target.toml` under `targets/`.
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub preamble: Vec<String>,
    #[serde(default)]
    pub compiler_options: Vec<String>,
    /// Enums always mapped to a distinct enum class.
    #[serde(default)]
    pub strict_enums: BTreeSet<String>,
    /// Enums always mapped to their base integer type.
    #[serde(default)]
    pub non_strict_enums: BTreeSet<String>,
    #[serde(default)]
    pub excluded_functions: BTreeSet<String>,
    #[serde(default)]
    pub excluded_macros: BTreeSet<String>,
    /// Functions whose string parameters stay raw pointers.
    #[serde(default)]
    pub no_string_conversion: BTreeSet<String>,
    /// Treat every initializer as designated.
    #[serde(default)]
    pub disable_designated_initializer_checks: bool,
    #[serde(default)]
    pub functions: Vec<DeclaredFunction>,
    /// Global variable declarations (e.g., "const int32_t counter").
    #[serde(default)]
    pub globals: Vec<String>,
}

fn default_target() -> String {
    Target::default_target().name
}

impl InteropConfig {
    /// A configuration with defaults for everything but the package.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            language: Language::default(),
            platform: ManagedPlatform::default(),
            target: default_target(),
            headers: Vec::new(),
            preamble: Vec::new(),
            compiler_options: Vec::new(),
            strict_enums: BTreeSet::new(),
            non_strict_enums: BTreeSet::new(),
            excluded_functions: BTreeSet::new(),
            excluded_macros: BTreeSet::new(),
            no_string_conversion: BTreeSet::new(),
            disable_designated_initializer_checks: false,
            functions: Vec::new(),
            globals: Vec::new(),
        }
    }

    /// Parse an interop definition from a TOML string.
    pub fn parse(input: &str) -> Result<Self> {
        let config: InteropConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse an interop definition from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    fn validate(&self) -> Result<()> {
        let valid_segment = |s: &str| {
            !s.is_empty()
                && !s.starts_with(|c: char| c.is_ascii_digit())
                && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        };
        if !self.package.split('.').all(valid_segment) {
            return Err(GenError::Config {
                detail: format!("'{}' is not a valid package name", self.package),
            });
        }
        if let Some(name) = self.strict_enums.intersection(&self.non_strict_enums).next() {
            return Err(GenError::Config {
                detail: format!("enum '{name}' is listed as both strict and non-strict"),
            });
        }
        Ok(())
    }

    /// The native library described by this definition.
    pub fn library(&self) -> NativeLibrary {
        NativeLibrary {
            language: self.language,
            headers: self.headers.clone(),
            additional_preamble_lines: self.preamble.clone(),
            compiler_args: self.compiler_options.clone(),
        }
    }

    /// Resolve the configured target, looking for custom targets under
    /// `project_dir/targets`.
    pub fn resolve_target(&self, project_dir: Option<&Path>) -> Result<Target> {
        Ok(resolve_target(&self.target, project_dir)?)
    }

    /// Build an index from the declaration table.
    pub fn declared_index(&self) -> Result<NativeIndex> {
        let mut index = NativeIndex::default();
        for declared in &self.functions {
            let mut decl = parse_function(&declared.c_signature)?;
            decl.requires_wrapper = declared.requires_wrapper;
            index.functions.push(decl);
        }
        for global in &self.globals {
            index.globals.push(parse_global(global)?);
        }
        Ok(index)
    }
}
