//! The indexed library and its index.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::functions::{FunctionDecl, GlobalDecl};
use crate::objc::{ObjCCategory, ObjCClass, ObjCProtocol};
use crate::records::{EnumDef, StructDecl, TypedefDef};
use crate::types::Type;

/// Source language of the native library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    #[default]
    C,
    ObjectiveC,
}

impl Language {
    /// File extension clang infers the language from.
    pub fn source_extension(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::ObjectiveC => "m",
        }
    }
}

/// The native library the bindings are generated for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeLibrary {
    pub language: Language,
    /// Headers included by every native fragment.
    pub headers: Vec<String>,
    /// Extra lines placed after the includes.
    pub additional_preamble_lines: Vec<String>,
    pub compiler_args: Vec<String>,
}

impl NativeLibrary {
    /// `#include` lines followed by the additional preamble.
    pub fn preamble_lines(&self) -> Vec<String> {
        self.headers
            .iter()
            .map(|h| format!("#include <{h}>"))
            .chain(self.additional_preamble_lines.iter().cloned())
            .collect()
    }
}

/// A macro whose expansion is an expression of known type.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedMacro {
    pub name: String,
    pub ty: Type,
}

/// A macro that expands to a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantDef {
    Integer { name: String, ty: Type, value: i64 },
    Floating { name: String, ty: Type, value: f64 },
    String { name: String, value: String },
}

impl ConstantDef {
    pub fn name(&self) -> &str {
        match self {
            ConstantDef::Integer { name, .. }
            | ConstantDef::Floating { name, .. }
            | ConstantDef::String { name, .. } => name,
        }
    }
}

/// Everything the indexer found in the library headers.
#[derive(Debug, Default)]
pub struct NativeIndex {
    pub structs: Vec<Rc<StructDecl>>,
    pub enums: Vec<Rc<EnumDef>>,
    pub typedefs: Vec<Rc<TypedefDef>>,
    pub functions: Vec<FunctionDecl>,
    pub globals: Vec<GlobalDecl>,
    pub wrapped_macros: Vec<WrappedMacro>,
    pub constants: Vec<ConstantDef>,
    pub objc_classes: Vec<Rc<ObjCClass>>,
    pub objc_protocols: Vec<Rc<ObjCProtocol>>,
    pub objc_categories: Vec<ObjCCategory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_order() {
        let library = NativeLibrary {
            language: Language::ObjectiveC,
            headers: vec!["Foundation/Foundation.h".into(), "zlib.h".into()],
            additional_preamble_lines: vec!["#define NDEBUG 1".into()],
            compiler_args: vec![],
        };
        assert_eq!(
            library.preamble_lines(),
            vec![
                "#include <Foundation/Foundation.h>",
                "#include <zlib.h>",
                "#define NDEBUG 1",
            ]
        );
        assert_eq!(library.language.source_extension(), "m");
    }
}
