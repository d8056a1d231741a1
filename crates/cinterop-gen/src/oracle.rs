//! Compilability probing of native bridge fragments.

use std::collections::BTreeSet;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use cinterop_index::NativeLibrary;
use cinterop_targets::Target;

use crate::error::{GenError, Result};

/// Answers, for each native fragment, whether it compiles against the
/// library.
pub trait CompilabilityOracle {
    /// One answer per fragment, in order.
    fn check(&mut self, fragments: &[&[String]]) -> Result<Vec<bool>>;
}

impl<F> CompilabilityOracle for F
where
    F: FnMut(&[&[String]]) -> Result<Vec<bool>>,
{
    fn check(&mut self, fragments: &[&[String]]) -> Result<Vec<bool>> {
        self(fragments)
    }
}

/// Find the fragments that do not compile.
///
/// `check` compiles the preamble followed by the given fragments and
/// returns the 1-based line numbers that carry errors. Fragments without
/// error lines are accepted. Among the rest the first is rejected (an
/// earlier fragment can cause errors in later ones) and the others are
/// checked again on their own.
pub fn isolate_uncompilable<C>(
    fragments: &[&[String]],
    preamble_len: usize,
    mut check: C,
) -> Result<Vec<bool>>
where
    C: FnMut(&[&[String]]) -> Result<BTreeSet<usize>>,
{
    let mut compilable = vec![true; fragments.len()];
    let mut to_check: Vec<usize> = (0..fragments.len()).collect();

    while !to_check.is_empty() {
        let batch: Vec<&[String]> = to_check.iter().map(|&i| fragments[i]).collect();
        let error_lines = check(&batch)?;

        let mut last_line = preamble_len;
        to_check.retain(|&i| {
            let first_line = last_line + 1;
            last_line += fragments[i].len();
            error_lines.range(first_line..=last_line).next().is_some()
        });

        if !to_check.is_empty() {
            let rejected = to_check.remove(0);
            compilable[rejected] = false;
        }
    }
    Ok(compilable)
}

/// Line numbers of `error:` diagnostics for `file_name` in clang output.
pub fn parse_error_lines(diagnostics: &str, file_name: &str) -> BTreeSet<usize> {
    diagnostics
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix(file_name)?.strip_prefix(':')?;
            let mut parts = rest.splitn(3, ':');
            let line_number = parts.next()?.parse::<usize>().ok()?;
            let _column = parts.next()?;
            let message = parts.next()?.trim_start();
            (message.starts_with("error:") || message.starts_with("fatal error:"))
                .then_some(line_number)
        })
        .collect()
}

/// Oracle that runs `clang -fsyntax-only` over a temporary source file.
#[derive(Debug, Clone)]
pub struct ClangOracle {
    clang: PathBuf,
    library: NativeLibrary,
    target_args: Vec<String>,
}

impl ClangOracle {
    pub fn new(library: NativeLibrary, target: &Target) -> Self {
        Self {
            clang: PathBuf::from("clang"),
            library,
            target_args: target.clang_args(),
        }
    }

    /// Use a specific clang executable.
    pub fn with_clang(mut self, clang: impl Into<PathBuf>) -> Self {
        self.clang = clang.into();
        self
    }

    fn compile(&self, lines: &[String]) -> Result<(String, BTreeSet<usize>)> {
        let suffix = format!(".{}", self.library.language.source_extension());
        let mut file = tempfile::Builder::new()
            .prefix("cinterop_check")
            .suffix(&suffix)
            .tempfile()?;
        for line in lines {
            writeln!(file, "{line}")?;
        }
        file.flush()?;

        let path = file.path().to_string_lossy().into_owned();
        let output = Command::new(&self.clang)
            .arg("-fsyntax-only")
            .arg("-ferror-limit=0")
            .arg("-fno-color-diagnostics")
            .args(&self.target_args)
            .args(&self.library.compiler_args)
            .arg(&path)
            .output()?;
        let diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
        let errors = parse_error_lines(&diagnostics, &path);
        if !output.status.success() && errors.is_empty() {
            return Err(GenError::CompileCheck {
                detail: format!("clang failed without diagnostics: {}", diagnostics.trim()),
            });
        }
        Ok((diagnostics, errors))
    }
}

impl CompilabilityOracle for ClangOracle {
    fn check(&mut self, fragments: &[&[String]]) -> Result<Vec<bool>> {
        if fragments.is_empty() {
            return Ok(Vec::new());
        }
        let preamble = self.library.preamble_lines();

        let (diagnostics, errors) = self.compile(&preamble)?;
        if !errors.is_empty() {
            return Err(GenError::CompileCheck {
                detail: format!("library preamble does not compile: {}", diagnostics.trim()),
            });
        }

        let mut rounds = 0;
        let result = isolate_uncompilable(fragments, preamble.len(), |batch| {
            rounds += 1;
            let mut lines = preamble.clone();
            for fragment in batch {
                lines.extend(fragment.iter().cloned());
            }
            Ok(self.compile(&lines)?.1)
        })?;
        debug!(
            fragments = fragments.len(),
            rejected = result.iter().filter(|ok| !**ok).count(),
            rounds,
            "checked native fragments"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    /// A fake compiler: a line is an error when it says `bad`, or when it
    /// says `uses_bad` and a `bad` line precedes it.
    fn fake_check(preamble_len: usize) -> impl FnMut(&[&[String]]) -> Result<BTreeSet<usize>> {
        move |batch: &[&[String]]| {
            let mut errors = BTreeSet::new();
            let mut seen_bad = false;
            let mut line = preamble_len;
            for fragment in batch {
                for text in fragment.iter() {
                    line += 1;
                    if text == "bad" {
                        seen_bad = true;
                        errors.insert(line);
                    } else if text == "uses_bad" && seen_bad {
                        errors.insert(line);
                    }
                }
            }
            Ok(errors)
        }
    }

    #[test]
    fn everything_compiles() {
        let a = fragment(&["int a;"]);
        let b = fragment(&["int b;", "int c;"]);
        let result = isolate_uncompilable(&[a.as_slice(), b.as_slice()], 2, fake_check(2)).unwrap();
        assert_eq!(result, vec![true, true]);
    }

    #[test]
    fn cascading_errors_blame_only_the_cause() {
        let a = fragment(&["int a;"]);
        let b = fragment(&["bad"]);
        let c = fragment(&["uses_bad"]);
        let d = fragment(&["int d;", "bad"]);
        let result = isolate_uncompilable(
            &[a.as_slice(), b.as_slice(), c.as_slice(), d.as_slice()],
            3,
            fake_check(3),
        )
        .unwrap();
        assert_eq!(result, vec![true, false, true, false]);
    }

    #[test]
    fn check_errors_propagate() {
        let a = fragment(&["int a;"]);
        let result = isolate_uncompilable(&[a.as_slice()], 0, |_| {
            Err(GenError::CompileCheck {
                detail: "boom".into(),
            })
        });
        assert!(result.is_err());
    }

    #[test]
    fn parse_clang_diagnostics() {
        let output = "\
/tmp/x.c:4:10: error: use of undeclared identifier 'y'
/tmp/x.c:5:1: warning: unused variable 'z'
/tmp/x.c:9:3: fatal error: 'missing.h' file not found
/tmp/other.h:2:1: error: elsewhere
1 warning and 2 errors generated.";
        let lines = parse_error_lines(output, "/tmp/x.c");
        assert_eq!(lines.into_iter().collect::<Vec<_>>(), vec![4, 9]);
    }

    #[test]
    fn closures_are_oracles() {
        let mut seen = 0;
        let mut oracle = |fragments: &[&[String]]| -> Result<Vec<bool>> {
            seen = fragments.len();
            Ok(vec![false; fragments.len()])
        };
        let a = fragment(&["x"]);
        let answer = CompilabilityOracle::check(&mut oracle, &[a.as_slice()]).unwrap();
        assert_eq!(answer, vec![false]);
        assert_eq!(seen, 1);
    }

    #[test]
    fn clang_oracle_skips_empty_batches() {
        let target = Target::default_target();
        let mut oracle =
            ClangOracle::new(NativeLibrary::default(), &target).with_clang("/nonexistent/clang");
        assert_eq!(oracle.check(&[]).unwrap(), Vec::<bool>::new());
    }
}
