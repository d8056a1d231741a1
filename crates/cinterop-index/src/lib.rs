//! Declarative model of an indexed C/Objective-C native surface.
//!
//! The model is produced by a header indexer and consumed read-only by
//! the binding generator. Declarations are shared through `Rc`; struct
//! definitions and Objective-C container members are attached once after
//! the declaration itself is shared, so member types may refer back to
//! their container.
//!
//! ## Modules
//!
//! - [`types`] — native type descriptors and their C spelling
//! - [`records`] — structs, unions, enums, typedefs
//! - [`functions`] — functions, globals and parameters
//! - [`objc`] — Objective-C classes, protocols, categories and members
//! - [`library`] — the indexed library and its index
//! - [`signature`] — C prototype parser for hand-written declaration tables
//! - [`error`] — error types

pub mod error;
pub mod functions;
pub mod library;
pub mod objc;
pub mod records;
pub mod signature;
pub mod types;

// Re-export key types for convenience
pub use error::{IndexError, Result};
pub use functions::{FunctionDecl, GlobalDecl, Parameter};
pub use library::{ConstantDef, Language, NativeIndex, NativeLibrary, WrappedMacro};
pub use objc::{
    ObjCCategory, ObjCClass, ObjCContainer, ObjCMembers, ObjCMethod, ObjCProperty, ObjCProtocol,
};
pub use records::{
    EnumConstant, EnumDef, RecordKind, StructDecl, StructDef, StructMember, TypedefDef,
};
pub use types::{Nullability, ObjCPointer, ObjCPointerKind, Type};
