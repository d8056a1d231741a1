//! Managed declarations of macro constants.
//!
//! Integer literals are narrowed to the width of their type so that the
//! managed compiler accepts them. Floating literals are spelled through
//! their bit pattern, which round-trips exactly.

use serde::Serialize;
use tracing::debug;

use cinterop_index::{ConstantDef, Type};

use crate::config::ManagedPlatform;
use crate::error::Result;
use crate::managed::{known, quote_literal, simple_name};
use crate::mirror::{mirror, DeclarationMapper};

/// A top-level managed value standing for a macro constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstantStub {
    pub name: String,
    pub managed_type: String,
    pub literal: String,
    /// Compile-time constant rather than a property with a getter.
    pub is_const: bool,
}

impl ConstantStub {
    pub fn render(&self) -> String {
        let name = simple_name(&self.name);
        if self.is_const {
            format!("const val {name}: {} = {}", self.managed_type, self.literal)
        } else {
            format!("val {name}: {} get() = {}", self.managed_type, self.literal)
        }
    }
}

/// Stub of `constant`, or `None` when its type has no literal form.
pub fn constant_stub(
    mapper: &dyn DeclarationMapper,
    platform: ManagedPlatform,
    constant: &ConstantDef,
) -> Result<Option<ConstantStub>> {
    let (literal, ty, is_const) = match constant {
        ConstantDef::Integer { ty, value, .. } => {
            let literal = match ty.unwrap_typedefs() {
                Type::Integer { size, is_signed, .. } => {
                    integer_literal(*size, mapper.is_mapped_to_signed(*is_signed), *value)
                }
                _ => None,
            };
            (literal, Some(ty), platform == ManagedPlatform::Native)
        }
        ConstantDef::Floating { ty, value, .. } => {
            let literal = match ty.unwrap_typedefs() {
                Type::Floating { size, .. } => floating_literal(*size, *value),
                _ => None,
            };
            (literal, Some(ty), false)
        }
        ConstantDef::String { value, .. } => (Some(quote_literal(value)), None, false),
    };
    let Some(literal) = literal else {
        debug!(constant = %constant.name(), "constant has no literal form");
        return Ok(None);
    };
    let managed_type = match ty {
        Some(ty) => mirror(mapper, ty)?.arg_type(),
        None => known::string(),
    };
    Ok(Some(ConstantStub {
        name: constant.name().to_string(),
        managed_type: managed_type.render(mapper.package()),
        literal,
        is_const,
    }))
}

/// `value` truncated to `size` bytes, as a signed or unsigned literal.
pub fn integer_literal(size: u64, signed: bool, value: i64) -> Option<String> {
    if signed {
        if value == i64::MIN {
            // The positive magnitude does not fit a signed literal.
            return Some(format!("{} - 1", value + 1));
        }
        let narrowed = match size {
            1 => i64::from(value as i8),
            2 => i64::from(value as i16),
            4 => i64::from(value as i32),
            8 => value,
            _ => return None,
        };
        Some(narrowed.to_string())
    } else {
        let narrowed = match size {
            1 => value as u64 & 0xFF,
            2 => value as u64 & 0xFFFF,
            4 => value as u64 & 0xFFFF_FFFF,
            8 => value as u64,
            _ => return None,
        };
        Some(format!("{narrowed}u"))
    }
}

/// Bit-exact literal of a `size`-byte floating value.
pub fn floating_literal(size: u64, value: f64) -> Option<String> {
    match size {
        4 => {
            let value = value as f32;
            Some(format!("bitsToFloat({}) /* == {value:?} */", value.to_bits() as i32))
        }
        8 => Some(format!("bitsToDouble({}) /* == {value:?} */", value.to_bits() as i64)),
        _ => None,
    }
}
