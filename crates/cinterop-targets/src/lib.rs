//! Target descriptions for native interop generation.
//!
//! A target names the compilation triple the bindings are produced for and
//! the architecture family whose ABI rules the generator has to respect
//! (structure-return classification, word size).
//!
//! ## Modules
//!
//! - [`arch`] — architecture families and word sizes
//! - [`target`] — target records and the builtin target table
//! - [`parse`] — `.target.toml` loading, validation and discovery
//! - [`error`] — error types

pub mod arch;
pub mod error;
pub mod parse;
pub mod target;

pub use arch::Architecture;
pub use error::{Result, TargetError};
pub use target::{Family, Target};
