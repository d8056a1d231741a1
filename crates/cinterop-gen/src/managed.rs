//! Managed-side type model and source rendering.
//!
//! Types are rendered relative to the package of the file they appear in:
//! classifiers from that package, from the default-imported builtin
//! packages and from the interop runtime package print unqualified.

use std::fmt::Write as _;

/// Packages whose classifiers never need qualification.
const IMPLICIT_PACKAGES: &[&str] = &["kotlin", "kotlin.collections", known::RUNTIME_PACKAGE];

/// A class, interface or object, possibly nested.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Classifier {
    pub package: String,
    /// Dot-separated name relative to the package.
    pub relative_name: String,
}

impl Classifier {
    pub fn top_level(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            relative_name: name.into(),
        }
    }

    pub fn nested(&self, name: &str) -> Self {
        Self {
            package: self.package.clone(),
            relative_name: format!("{}.{name}", self.relative_name),
        }
    }

    /// Innermost simple name.
    pub fn simple_name(&self) -> &str {
        self.relative_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.relative_name)
    }

    pub fn ty(&self) -> ManagedType {
        self.type_with_arguments(Vec::new())
    }

    pub fn type_with(&self, arguments: Vec<ManagedType>) -> ManagedType {
        self.type_with_arguments(arguments.into_iter().map(TypeArgument::Type).collect())
    }

    pub fn type_with_arguments(&self, arguments: Vec<TypeArgument>) -> ManagedType {
        ManagedType::Class {
            classifier: self.clone(),
            arguments,
            nullable: false,
        }
    }

    /// Reference to this classifier from a file in `scope`.
    pub fn render(&self, scope: &str) -> String {
        if self.package.is_empty()
            || self.package == scope
            || IMPLICIT_PACKAGES.contains(&self.package.as_str())
        {
            self.relative_name.clone()
        } else {
            format!("{}.{}", self.package, self.relative_name)
        }
    }
}

/// A type argument: a concrete type or the `*` projection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeArgument {
    Star,
    Type(ManagedType),
}

/// A managed type as it appears in generated declarations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ManagedType {
    Class {
        classifier: Classifier,
        arguments: Vec<TypeArgument>,
        nullable: bool,
    },
    Function {
        parameters: Vec<ManagedType>,
        return_type: Box<ManagedType>,
        nullable: bool,
    },
}

impl ManagedType {
    pub fn function(parameters: Vec<ManagedType>, return_type: ManagedType) -> Self {
        ManagedType::Function {
            parameters,
            return_type: Box::new(return_type),
            nullable: false,
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            ManagedType::Class { nullable, .. } | ManagedType::Function { nullable, .. } => {
                *nullable
            }
        }
    }

    pub fn make_nullable(&self) -> Self {
        self.make_nullable_as_specified(true)
    }

    pub fn make_nullable_as_specified(&self, nullable: bool) -> Self {
        let mut result = self.clone();
        match &mut result {
            ManagedType::Class { nullable: n, .. } | ManagedType::Function { nullable: n, .. } => {
                *n = nullable
            }
        }
        result
    }

    pub fn classifier(&self) -> Option<&Classifier> {
        match self {
            ManagedType::Class { classifier, .. } => Some(classifier),
            ManagedType::Function { .. } => None,
        }
    }

    pub fn render(&self, scope: &str) -> String {
        let mut out = String::new();
        self.render_into(scope, &mut out);
        out
    }

    fn render_into(&self, scope: &str, out: &mut String) {
        match self {
            ManagedType::Class {
                classifier,
                arguments,
                nullable,
            } => {
                out.push_str(&classifier.render(scope));
                if !arguments.is_empty() {
                    out.push('<');
                    for (i, argument) in arguments.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        match argument {
                            TypeArgument::Star => out.push('*'),
                            TypeArgument::Type(t) => t.render_into(scope, out),
                        }
                    }
                    out.push('>');
                }
                if *nullable {
                    out.push('?');
                }
            }
            ManagedType::Function {
                parameters,
                return_type,
                nullable,
            } => {
                if *nullable {
                    out.push('(');
                }
                out.push('(');
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    parameter.render_into(scope, out);
                }
                out.push_str(") -> ");
                return_type.render_into(scope, out);
                if *nullable {
                    out.push_str(")?");
                }
            }
        }
    }
}

/// Well-known classifiers of the builtin library and the interop runtime.
pub mod known {
    use super::{Classifier, ManagedType, TypeArgument};

    pub const BUILTIN_PACKAGE: &str = "kotlin";
    pub const COLLECTIONS_PACKAGE: &str = "kotlin.collections";
    pub const RUNTIME_PACKAGE: &str = "kotlinx.cinterop";
    /// Package of managed classes standing for forward-declared C structs.
    pub const FORWARD_STRUCTS_PACKAGE: &str = "cnames.structs";
    pub const FORWARD_CLASSES_PACKAGE: &str = "objcnames.classes";
    pub const FORWARD_PROTOCOLS_PACKAGE: &str = "objcnames.protocols";

    pub fn builtin(name: &str) -> Classifier {
        Classifier::top_level(BUILTIN_PACKAGE, name)
    }

    pub fn runtime(name: &str) -> Classifier {
        Classifier::top_level(RUNTIME_PACKAGE, name)
    }

    fn collection(name: &str) -> Classifier {
        Classifier::top_level(COLLECTIONS_PACKAGE, name)
    }

    pub fn byte() -> ManagedType {
        builtin("Byte").ty()
    }
    pub fn short() -> ManagedType {
        builtin("Short").ty()
    }
    pub fn int() -> ManagedType {
        builtin("Int").ty()
    }
    pub fn long() -> ManagedType {
        builtin("Long").ty()
    }
    pub fn ubyte() -> ManagedType {
        builtin("UByte").ty()
    }
    pub fn ushort() -> ManagedType {
        builtin("UShort").ty()
    }
    pub fn uint() -> ManagedType {
        builtin("UInt").ty()
    }
    pub fn ulong() -> ManagedType {
        builtin("ULong").ty()
    }
    pub fn float() -> ManagedType {
        builtin("Float").ty()
    }
    pub fn double() -> ManagedType {
        builtin("Double").ty()
    }
    pub fn boolean() -> ManagedType {
        builtin("Boolean").ty()
    }
    pub fn unit() -> ManagedType {
        builtin("Unit").ty()
    }
    pub fn string() -> ManagedType {
        builtin("String").ty()
    }
    pub fn any() -> ManagedType {
        builtin("Any").ty()
    }

    pub fn list_of_star() -> ManagedType {
        collection("List").type_with_arguments(vec![TypeArgument::Star])
    }
    pub fn mutable_list_of_any() -> ManagedType {
        collection("MutableList").type_with(vec![any().make_nullable()])
    }
    pub fn set_of_star() -> ManagedType {
        collection("Set").type_with_arguments(vec![TypeArgument::Star])
    }
    pub fn map_of_any_to_star() -> ManagedType {
        collection("Map").type_with_arguments(vec![
            TypeArgument::Type(any().make_nullable()),
            TypeArgument::Star,
        ])
    }

    pub fn native_ptr() -> ManagedType {
        runtime("NativePtr").ty()
    }
    pub fn c_opaque() -> ManagedType {
        runtime("COpaque").ty()
    }
    pub fn c_opaque_pointer() -> ManagedType {
        runtime("COpaquePointer").ty()
    }
    pub fn c_opaque_pointer_var() -> ManagedType {
        runtime("COpaquePointerVar").ty()
    }
    pub fn c_pointer(pointed: ManagedType) -> ManagedType {
        runtime("CPointer").type_with(vec![pointed])
    }
    pub fn c_pointer_var(pointed: ManagedType) -> ManagedType {
        runtime("CPointerVar").type_with(vec![pointed])
    }
    pub fn c_pointer_var_of(value: ManagedType) -> ManagedType {
        runtime("CPointerVarOf").type_with(vec![value])
    }
    pub fn c_array_pointer(pointed: ManagedType) -> ManagedType {
        runtime("CArrayPointer").type_with(vec![pointed])
    }
    pub fn c_array_pointer_var(pointed: ManagedType) -> ManagedType {
        runtime("CArrayPointerVar").type_with(vec![pointed])
    }
    pub fn c_value(pointed: ManagedType) -> ManagedType {
        runtime("CValue").type_with(vec![pointed])
    }
    pub fn c_values_ref(pointed: ManagedType) -> ManagedType {
        runtime("CValuesRef").type_with(vec![pointed])
    }
    pub fn c_values_ref_of_star() -> ManagedType {
        runtime("CValuesRef").type_with_arguments(vec![TypeArgument::Star])
    }
    pub fn c_function(function: ManagedType) -> ManagedType {
        runtime("CFunction").type_with(vec![function])
    }
    pub fn boolean_var_of(value: ManagedType) -> ManagedType {
        runtime("BooleanVarOf").type_with(vec![value])
    }
    pub fn objc_object_var(value: ManagedType) -> ManagedType {
        runtime("ObjCObjectVar").type_with(vec![value])
    }
    pub fn objc_block_var(value: ManagedType) -> ManagedType {
        runtime("ObjCBlockVar").type_with(vec![value])
    }
    pub fn objc_class() -> ManagedType {
        runtime("ObjCClass").ty()
    }
    pub fn objc_class_of() -> Classifier {
        runtime("ObjCClassOf")
    }
    pub fn objc_object() -> Classifier {
        runtime("ObjCObject")
    }
    pub fn objc_object_meta() -> Classifier {
        runtime("ObjCObjectMeta")
    }
    pub fn objc_object_base() -> Classifier {
        runtime("ObjCObjectBase")
    }
    pub fn objc_object_base_meta() -> Classifier {
        runtime("ObjCObjectBaseMeta")
    }
}

const KEYWORDS: &[&str] = &[
    "as", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in",
    "interface", "is", "null", "object", "package", "return", "super", "this", "throw", "true",
    "try", "typealias", "typeof", "val", "var", "when", "while",
];

/// Render `name` as an identifier, quoting keywords and odd characters.
pub fn simple_name(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if plain && !KEYWORDS.contains(&name) {
        name.to_string()
    } else {
        format!("`{name}`")
    }
}

/// Render `text` as a string literal.
pub fn quote_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// A parameter of a generated managed function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedParameter {
    pub name: String,
    pub ty: ManagedType,
    pub is_vararg: bool,
    pub annotations: Vec<String>,
}

impl ManagedParameter {
    pub fn new(name: impl Into<String>, ty: ManagedType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_vararg: false,
            annotations: Vec::new(),
        }
    }

    pub fn render(&self, scope: &str) -> String {
        let mut out = String::new();
        for annotation in &self.annotations {
            out.push_str(annotation);
            out.push(' ');
        }
        if self.is_vararg {
            out.push_str("vararg ");
        }
        let _ = write!(out, "{}: {}", simple_name(&self.name), self.ty.render(scope));
        out
    }
}

/// Comma-separated parameter list.
pub fn render_parameters(parameters: &[ManagedParameter], scope: &str) -> String {
    parameters
        .iter()
        .map(|p| p.render(scope))
        .collect::<Vec<_>>()
        .join(", ")
}
