//! Interop glue generation between a managed language and C/Objective-C.
//!
//! Given an indexed native library, the generator decides the managed
//! representation of every native type, emits paired managed/native
//! bridges for each call boundary, synthesizes C wrappers for constructs
//! without a linkable address, reproduces struct layouts in plain C and
//! flattens Objective-C classes, protocols and categories into managed
//! stubs. Bridges are validated against the real headers in one batch;
//! declarations whose bridges do not compile degrade to stubs the managed
//! compiler rejects on use.
//!
//! ## Modules
//!
//! - [`config`] — `.interop.toml` definitions
//! - [`managed`] — managed types, classifiers and identifiers
//! - [`bridged`] — wire types crossing a bridge
//! - [`mirror`] — managed mirrors of native types
//! - [`naming`] — per-library naming decisions
//! - [`code`] — line builders for generated bodies
//! - [`bridge`] — paired bridge generation and validation
//! - [`convert`] — value conversions at either end of a bridge
//! - [`mapping`] — bridges over typed native values
//! - [`wrapper`] — C callee wrappers
//! - [`struct_render`] — layout-reproducing struct declarations
//! - [`function`] — C function and global stubs
//! - [`constants`] — macro constants
//! - [`objc`] — Objective-C stubs
//! - [`oracle`] — compilability probing
//! - [`session`] — one generation run
//! - [`error`] — error types

pub mod bridge;
pub mod bridged;
pub mod code;
pub mod config;
pub mod constants;
pub mod convert;
pub mod error;
pub mod function;
pub mod managed;
pub mod mapping;
pub mod mirror;
pub mod naming;
pub mod objc;
pub mod oracle;
pub mod session;
pub mod struct_render;
pub mod wrapper;

// Re-export key types for convenience
pub use bridge::{BridgeGenerator, BridgeSupport, ClientId, NativeBridge, PreparedBridges};
pub use bridged::BridgedType;
pub use config::{InteropConfig, ManagedPlatform};
pub use constants::ConstantStub;
pub use error::{GenError, Result};
pub use function::{FunctionStub, GlobalStub};
pub use mirror::{mirror, DeclarationMapper, TypeInfo, TypeMirror};
pub use naming::DeclarationNames;
pub use oracle::{ClangOracle, CompilabilityOracle};
pub use session::{GeneratedModule, GenerationSession, StructLayout};
pub use struct_render::try_render_struct_or_union;
pub use wrapper::{CCalleeWrapper, CWrappersGenerator};
