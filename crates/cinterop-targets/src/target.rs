//! Target records and the builtin target table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::arch::Architecture;
use crate::error::{Result, TargetError};

/// Operating system family of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Ios,
    Macos,
    Linux,
    Mingw,
    Wasm,
}

impl Family {
    /// Whether the platform SDK ships an Objective-C runtime.
    pub fn has_objc_runtime(self) -> bool {
        matches!(self, Family::Ios | Family::Macos)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Ios => "ios",
            Family::Macos => "macos",
            Family::Linux => "linux",
            Family::Mingw => "mingw",
            Family::Wasm => "wasm",
        };
        write!(f, "{name}")
    }
}

/// A compilation target for generated bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Target {
    /// Target name (e.g., "ios_arm64", "linux_x64").
    pub name: String,
    pub family: Family,
    pub architecture: Architecture,
    /// Clang target triple passed to the compilability oracle.
    pub triple: String,
    /// Extra clang arguments for this target (sysroot, SDK flags).
    #[serde(default)]
    pub compiler_args: Vec<String>,
}

impl Target {
    fn builtin_entry(
        name: &str,
        family: Family,
        architecture: Architecture,
        triple: &str,
    ) -> Self {
        Self {
            name: name.into(),
            family,
            architecture,
            triple: triple.into(),
            compiler_args: Vec::new(),
        }
    }

    /// All targets known without a `.target.toml` file.
    pub fn builtins() -> Vec<Target> {
        use Architecture::*;
        use Family::*;
        vec![
            Self::builtin_entry("ios_arm64", Ios, Arm64, "arm64-apple-ios9.0"),
            Self::builtin_entry("ios_x64", Ios, X64, "x86_64-apple-ios9.0-simulator"),
            Self::builtin_entry("ios_arm32", Ios, Arm32, "armv7-apple-ios9.0"),
            Self::builtin_entry("macos_x64", Macos, X64, "x86_64-apple-macos10.11"),
            Self::builtin_entry("macos_arm64", Macos, Arm64, "arm64-apple-macos11.0"),
            Self::builtin_entry("linux_x64", Linux, X64, "x86_64-unknown-linux-gnu"),
            Self::builtin_entry("linux_arm64", Linux, Arm64, "aarch64-unknown-linux-gnu"),
            Self::builtin_entry("linux_arm32", Linux, Arm32, "armv7-unknown-linux-gnueabihf"),
            Self::builtin_entry("mingw_x64", Mingw, X64, "x86_64-pc-windows-gnu"),
            Self::builtin_entry("mingw_x86", Mingw, X86, "i686-pc-windows-gnu"),
            Self::builtin_entry("wasm32", Wasm, Wasm32, "wasm32-unknown-unknown"),
        ]
    }

    /// Look up a builtin target by name.
    pub fn builtin(name: &str) -> Result<Target> {
        Self::builtins()
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| TargetError::Unknown { name: name.into() })
    }

    /// The host-independent default used when no target is configured.
    pub fn default_target() -> Target {
        Self::builtin_entry("macos_x64", Family::Macos, Architecture::X64, "x86_64-apple-macos10.11")
    }

    /// Pointer width in bytes.
    pub fn word_size_bytes(&self) -> u64 {
        self.architecture.word_size_bytes()
    }

    /// Clang arguments selecting this target.
    pub fn clang_args(&self) -> Vec<String> {
        let mut args = vec!["-target".to_string(), self.triple.clone()];
        args.extend(self.compiler_args.iter().cloned());
        args
    }
}
