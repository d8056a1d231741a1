//! TOML parsing, serialization, validation, and discovery for target definitions.
//!
//! Custom targets are stored as `.target.toml` files in a `targets/`
//! directory next to the interop definition. Builtin targets always win
//! over discovered files of the same name.

use std::path::{Path, PathBuf};

use crate::error::{Result, TargetError};
use crate::target::Target;

/// A validation issue found in a target definition.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    /// Human-readable description.
    pub message: String,
}

/// Load a target from a `.target.toml` file.
pub fn load_target_toml(path: &Path) -> Result<Target> {
    if !path.exists() {
        return Err(TargetError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_target_toml(&content)
}

/// Parse a target from a TOML string.
pub fn parse_target_toml(toml_str: &str) -> Result<Target> {
    let target: Target = toml::from_str(toml_str)?;
    Ok(target)
}

/// Serialize a target to pretty TOML.
pub fn target_to_toml(target: &Target) -> Result<String> {
    Ok(toml::to_string_pretty(target)?)
}

/// Validate a target definition for structural correctness.
pub fn validate_target(target: &Target) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if target.name.is_empty()
        || !target
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        issues.push(ValidationIssue {
            severity: "error",
            message: format!(
                "target name '{}' must be non-empty and use only [A-Za-z0-9_-]",
                target.name
            ),
        });
    }

    let arch_prefix = match target.architecture {
        crate::Architecture::Arm64 => ["aarch64", "arm64"].as_slice(),
        crate::Architecture::X64 => ["x86_64"].as_slice(),
        crate::Architecture::Arm32 => ["armv7", "arm"].as_slice(),
        crate::Architecture::X86 => ["i386", "i686"].as_slice(),
        crate::Architecture::Wasm32 => ["wasm32"].as_slice(),
    };
    if !arch_prefix.iter().any(|p| target.triple.starts_with(p)) {
        issues.push(ValidationIssue {
            severity: "error",
            message: format!(
                "triple '{}' does not match architecture {}",
                target.triple, target.architecture
            ),
        });
    }

    if target.compiler_args.iter().any(|a| a == "-target") {
        issues.push(ValidationIssue {
            severity: "warning",
            message: "compiler-args repeat -target; the triple field already selects it".into(),
        });
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Discover all `.target.toml` files in a directory's `targets/` subdirectory.
///
/// Returns a list of (target_name, file_path) pairs sorted by name.
pub fn discover_targets(project_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let targets_dir = project_dir.join("targets");
    if !targets_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut targets = Vec::new();
    for entry in std::fs::read_dir(&targets_dir)? {
        let path = entry?.path();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(".target.toml"))
            .map(str::to_string);
        if let Some(name) = name {
            targets.push((name, path));
        }
    }
    targets.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(targets)
}

/// Resolve a target by name: builtins first, then `.target.toml` files
/// under `project_dir/targets`.
///
/// Loaded definitions are validated; error-severity issues are reported
/// as [`TargetError::Validation`].
pub fn resolve_target(name: &str, project_dir: Option<&Path>) -> Result<Target> {
    if let Ok(target) = Target::builtin(name) {
        return Ok(target);
    }
    let Some(dir) = project_dir else {
        return Err(TargetError::Unknown { name: name.into() });
    };
    let found = discover_targets(dir)?.into_iter().find(|(n, _)| n == name);
    let Some((_, path)) = found else {
        return Err(TargetError::Unknown { name: name.into() });
    };
    let target = load_target_toml(&path)?;
    if let Err(issues) = validate_target(&target) {
        let errors: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == "error")
            .map(|i| i.message.as_str())
            .collect();
        if !errors.is_empty() {
            return Err(TargetError::Validation {
                detail: errors.join("; "),
            });
        }
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Architecture, Family};

    const CUSTOM: &str = r#"
name = "tvos_arm64"
family = "ios"
architecture = "arm64"
triple = "arm64-apple-tvos9.0"
compiler-args = ["-isysroot", "/sdk/AppleTVOS.sdk"]
"#;

    #[test]
    fn parse_custom_target() {
        let target = parse_target_toml(CUSTOM).unwrap();
        assert_eq!(target.name, "tvos_arm64");
        assert_eq!(target.family, Family::Ios);
        assert_eq!(target.architecture, Architecture::Arm64);
        assert_eq!(target.compiler_args.len(), 2);
        assert!(validate_target(&target).is_ok());
    }

    #[test]
    fn serialized_builtin_parses_back() {
        let original = Target::builtin("ios_x64").unwrap();
        let text = target_to_toml(&original).unwrap();
        assert_eq!(parse_target_toml(&text).unwrap(), original);
    }

    #[test]
    fn parse_missing_field_returns_error() {
        assert!(parse_target_toml("name = \"incomplete\"").is_err());
    }

    #[test]
    fn builtins_validate() {
        for target in Target::builtins() {
            assert!(validate_target(&target).is_ok(), "{}", target.name);
        }
    }

    #[test]
    fn validate_mismatched_triple() {
        let mut target = Target::builtin("linux_arm64").unwrap();
        target.triple = "x86_64-unknown-linux-gnu".into();
        let issues = validate_target(&target).unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("does not match")));
    }

    #[test]
    fn validate_bad_name() {
        let mut target = Target::builtin("linux_x64").unwrap();
        target.name = "linux x64".into();
        let issues = validate_target(&target).unwrap_err();
        assert!(issues.iter().any(|i| i.severity == "error"));
    }

    #[test]
    fn discover_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let targets_dir = dir.path().join("targets");
        std::fs::create_dir_all(&targets_dir).unwrap();
        std::fs::write(targets_dir.join("tvos_arm64.target.toml"), CUSTOM).unwrap();
        std::fs::write(targets_dir.join("notes.txt"), "ignore me").unwrap();

        let found = discover_targets(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "tvos_arm64");

        let target = resolve_target("tvos_arm64", Some(dir.path())).unwrap();
        assert_eq!(target.triple, "arm64-apple-tvos9.0");

        let builtin = resolve_target("ios_arm64", Some(dir.path())).unwrap();
        assert_eq!(builtin.architecture, Architecture::Arm64);
    }

    #[test]
    fn resolve_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let targets_dir = dir.path().join("targets");
        std::fs::create_dir_all(&targets_dir).unwrap();
        let bad = CUSTOM.replace("arm64-apple-tvos9.0", "x86_64-apple-tvos9.0");
        std::fs::write(targets_dir.join("tvos_arm64.target.toml"), bad).unwrap();

        let err = resolve_target("tvos_arm64", Some(dir.path())).unwrap_err();
        assert!(matches!(err, TargetError::Validation { .. }));
    }

    #[test]
    fn resolve_unknown_without_dir() {
        let err = resolve_target("tvos_arm64", None).unwrap_err();
        assert!(matches!(err, TargetError::Unknown { .. }));
    }

    #[test]
    fn load_not_found() {
        let result = load_target_toml(Path::new("/nonexistent/path.target.toml"));
        assert!(matches!(result.unwrap_err(), TargetError::NotFound { .. }));
    }
}
