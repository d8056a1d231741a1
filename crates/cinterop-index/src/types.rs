//! Native type descriptors.
//!
//! [`Type`] is a closed sum over everything the indexer can report. The
//! generator matches on it exhaustively, so a new descriptor kind has to be
//! handled everywhere it matters.

use std::rc::Rc;

use crate::objc::{ObjCClass, ObjCProtocol};
use crate::records::{EnumDef, StructDecl, TypedefDef};

/// Nullability annotation of an Objective-C pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Nullability {
    Nullable,
    NonNull,
    #[default]
    Unspecified,
}

/// Kind of an Objective-C pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjCPointerKind {
    /// `id` or `id<P, ...>`.
    Id { protocols: Vec<Rc<ObjCProtocol>> },
    /// `Class` or `Class<P, ...>`.
    Class { protocols: Vec<Rc<ObjCProtocol>> },
    /// `Cls<P, ...> *`.
    Object {
        class: Rc<ObjCClass>,
        protocols: Vec<Rc<ObjCProtocol>>,
    },
    /// `instancetype`; the generator substitutes the receiver class.
    InstanceType,
    /// `R (^)(P...)`.
    Block {
        parameters: Vec<Type>,
        return_type: Box<Type>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjCPointer {
    pub kind: ObjCPointerKind,
    pub nullability: Nullability,
}

impl ObjCPointer {
    pub fn new(kind: ObjCPointerKind, nullability: Nullability) -> Self {
        Self { kind, nullability }
    }
}

/// A native type as reported by the indexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Void,
    /// Plain `char`.
    Char,
    Bool,
    /// Integer of `size` bytes.
    Integer {
        size: u64,
        is_signed: bool,
        spelling: String,
    },
    Floating {
        size: u64,
        spelling: String,
    },
    Vector {
        size: u64,
        spelling: String,
    },
    Pointer {
        pointee: Box<Type>,
        pointee_is_const: bool,
    },
    ConstArray {
        element: Box<Type>,
        length: u64,
    },
    IncompleteArray {
        element: Box<Type>,
    },
    Record(Rc<StructDecl>),
    Enum(Rc<EnumDef>),
    Function {
        parameters: Vec<Type>,
        return_type: Box<Type>,
    },
    Typedef(Rc<TypedefDef>),
    ObjCPointer(ObjCPointer),
    /// Anything the indexer could not describe (e.g. `long double`).
    Unsupported {
        spelling: String,
    },
}

impl Type {
    pub fn integer(size: u64, is_signed: bool, spelling: impl Into<String>) -> Self {
        Type::Integer {
            size,
            is_signed,
            spelling: spelling.into(),
        }
    }

    /// 32-bit `int`.
    pub fn int() -> Self {
        Self::integer(4, true, "int")
    }

    pub fn floating(size: u64, spelling: impl Into<String>) -> Self {
        Type::Floating {
            size,
            spelling: spelling.into(),
        }
    }

    pub fn pointer_to(pointee: Type) -> Self {
        Type::Pointer {
            pointee: Box::new(pointee),
            pointee_is_const: false,
        }
    }

    pub fn const_pointer_to(pointee: Type) -> Self {
        Type::Pointer {
            pointee: Box::new(pointee),
            pointee_is_const: true,
        }
    }

    pub fn array_of(element: Type, length: u64) -> Self {
        Type::ConstArray {
            element: Box::new(element),
            length,
        }
    }

    pub fn objc(kind: ObjCPointerKind, nullability: Nullability) -> Self {
        Type::ObjCPointer(ObjCPointer::new(kind, nullability))
    }

    /// Strip every typedef layer.
    pub fn unwrap_typedefs(&self) -> &Type {
        match self {
            Type::Typedef(def) => def.aliased.unwrap_typedefs(),
            other => other,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self.unwrap_typedefs(), Type::Void)
    }

    /// C spelling of the type on its own, e.g. `const char *`.
    pub fn c_spelling(&self) -> String {
        self.declare("")
    }

    /// C declaration of `declarator` with this type, e.g. `int (*cb)(int)`.
    pub fn declare(&self, declarator: &str) -> String {
        match self {
            Type::Void => with_base("void", declarator),
            Type::Char => with_base("char", declarator),
            Type::Bool => with_base("_Bool", declarator),
            Type::Integer { spelling, .. }
            | Type::Floating { spelling, .. }
            | Type::Vector { spelling, .. }
            | Type::Unsupported { spelling } => with_base(spelling, declarator),
            Type::Pointer {
                pointee,
                pointee_is_const,
            } => {
                let inner = match pointee.as_ref() {
                    Type::Function { .. } | Type::ConstArray { .. } | Type::IncompleteArray { .. } => {
                        format!("(*{declarator})")
                    }
                    _ => format!("*{declarator}"),
                };
                let text = pointee.declare(&inner);
                if *pointee_is_const {
                    format!("const {text}")
                } else {
                    text
                }
            }
            Type::ConstArray { element, length } => {
                element.declare(&format!("{declarator}[{length}]"))
            }
            Type::IncompleteArray { element } => element.declare(&format!("{declarator}[]")),
            Type::Record(decl) => with_base(&decl.spelling, declarator),
            Type::Enum(def) => with_base(&def.spelling, declarator),
            Type::Typedef(def) => with_base(&def.name, declarator),
            Type::Function {
                parameters,
                return_type,
            } => return_type.declare(&format!("{declarator}({})", parameter_list(parameters))),
            Type::ObjCPointer(pointer) => match &pointer.kind {
                ObjCPointerKind::Id { protocols } => {
                    with_base(&qualified("id", protocols), declarator)
                }
                ObjCPointerKind::Class { protocols } => {
                    with_base(&qualified("Class", protocols), declarator)
                }
                ObjCPointerKind::Object { class, protocols } => with_base(
                    &qualified(&class.name, protocols),
                    &format!("*{declarator}"),
                ),
                ObjCPointerKind::InstanceType => with_base("instancetype", declarator),
                ObjCPointerKind::Block {
                    parameters,
                    return_type,
                } => return_type.declare(&format!(
                    "(^{declarator})({})",
                    parameter_list(parameters)
                )),
            },
        }
    }
}

fn with_base(base: &str, declarator: &str) -> String {
    if declarator.is_empty() {
        base.to_string()
    } else {
        format!("{base} {declarator}")
    }
}

fn parameter_list(parameters: &[Type]) -> String {
    if parameters.is_empty() {
        "void".to_string()
    } else {
        parameters
            .iter()
            .map(Type::c_spelling)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn qualified(base: &str, protocols: &[Rc<ObjCProtocol>]) -> String {
    if protocols.is_empty() {
        base.to_string()
    } else {
        let names: Vec<_> = protocols.iter().map(|p| p.name.as_str()).collect();
        format!("{base}<{}>", names.join(", "))
    }
}
