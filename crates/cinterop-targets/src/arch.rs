//! Architecture families.
//!
//! Only the properties the interop generator consumes are modelled here:
//! pointer width.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Architecture family of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// AArch64.
    Arm64,
    /// x86-64.
    X64,
    /// 32-bit ARM (ARMv7, AAPCS).
    Arm32,
    /// 32-bit x86.
    X86,
    /// WebAssembly with 32-bit memory.
    Wasm32,
}

impl Architecture {
    /// Pointer width in bits.
    pub fn word_size(self) -> u32 {
        match self {
            Architecture::Arm64 | Architecture::X64 => 64,
            Architecture::Arm32 | Architecture::X86 | Architecture::Wasm32 => 32,
        }
    }

    /// Pointer width in bytes.
    pub fn word_size_bytes(self) -> u64 {
        u64::from(self.word_size() / 8)
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Architecture::Arm64 => "arm64",
            Architecture::X64 => "x64",
            Architecture::Arm32 => "arm32",
            Architecture::X86 => "x86",
            Architecture::Wasm32 => "wasm32",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_sizes() {
        assert_eq!(Architecture::Arm64.word_size(), 64);
        assert_eq!(Architecture::X64.word_size_bytes(), 8);
        assert_eq!(Architecture::Arm32.word_size_bytes(), 4);
        assert_eq!(Architecture::Wasm32.word_size(), 32);
    }

    #[test]
    fn display_matches_serde_name() {
        for arch in [
            Architecture::Arm64,
            Architecture::X64,
            Architecture::Arm32,
            Architecture::X86,
            Architecture::Wasm32,
        ] {
            let json = serde_json::to_string(&arch).unwrap();
            assert_eq!(json, format!("\"{arch}\""));
        }
    }
}
