//! Functions, globals and parameters.

use crate::types::Type;

/// A function or method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Source name; empty when the declaration leaves it unnamed.
    pub name: String,
    pub ty: Type,
    /// `ns_consumed`: ownership of the argument passes to the callee.
    pub ns_consumed: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            ns_consumed: false,
        }
    }
}

/// A C function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Type,
    pub is_variadic: bool,
    /// The function has no linkable address (function-like macro,
    /// compiler builtin, `static inline`) and must be reached through a
    /// synthesized wrapper.
    pub requires_wrapper: bool,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>, parameters: Vec<Parameter>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            parameters,
            return_type,
            is_variadic: false,
            requires_wrapper: false,
        }
    }

    /// The C function type of this declaration.
    pub fn function_type(&self) -> Type {
        Type::Function {
            parameters: self.parameters.iter().map(|p| p.ty.clone()).collect(),
            return_type: Box::new(self.return_type.clone()),
        }
    }
}

/// A global variable.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalDecl {
    pub name: String,
    pub ty: Type,
    pub is_const: bool,
}

impl GlobalDecl {
    pub fn new(name: impl Into<String>, ty: Type, is_const: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            is_const,
        }
    }
}
