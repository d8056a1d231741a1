//! Struct-return classification for `objc_msgSend`.
//!
//! `objc_msgSend_stret` has to be used when the result is returned through
//! memory pointed to by a hidden argument. The rules approximate each
//! ABI closely enough for the declarations found in practice. Every
//! architecture family needs its own rule; families without one are
//! reported as unsupported.

use cinterop_index::{StructDecl, StructMember, Type};
use cinterop_targets::Architecture;

use crate::error::{GenError, Result};

/// Whether a method returning `ty` needs the struct-return convention.
pub fn is_stret(ty: &Type, architecture: Architecture) -> Result<bool> {
    let unwrapped = ty.unwrap_typedefs();
    match architecture {
        // The hidden argument is passed in x8, never in place of the receiver.
        Architecture::Arm64 => Ok(false),
        Architecture::X64 => match unwrapped {
            Type::Record(decl) => {
                let def = decl.def().ok_or_else(|| incomplete(decl))?;
                Ok(def.size > 16 || has_unaligned_members(ty))
            }
            _ => Ok(false),
        },
        Architecture::Arm32 => match unwrapped {
            Type::Record(_) => Ok(!is_integer_like(ty, architecture.word_size_bytes())),
            _ => Ok(false),
        },
        Architecture::X86 | Architecture::Wasm32 => Err(GenError::UnsupportedTarget {
            target: architecture.to_string(),
        }),
    }
}

fn incomplete(decl: &StructDecl) -> GenError {
    GenError::unmappable(format!("'{}' is returned by value but incomplete", decl.spelling))
}

/// Fits in one word with every member at offset 0, recursively.
fn is_integer_like(ty: &Type, word: u64) -> bool {
    match ty {
        Type::Record(decl) => decl.def().is_some_and(|def| {
            def.size <= word
                && def.members.iter().all(|member| match member {
                    StructMember::Field(field) => field.offset == 0 && is_integer_like(&field.ty, word),
                    StructMember::BitField { ty, .. } => is_integer_like(ty, word),
                    StructMember::IncompleteField { .. } => false,
                    StructMember::AnonymousInnerRecord { decl, offset, .. } => {
                        *offset == 0 && is_integer_like(&Type::Record(decl.clone()), word)
                    }
                })
        }),
        Type::ObjCPointer(_) | Type::Pointer { .. } | Type::Char | Type::Bool => true,
        Type::Integer { size, .. } => *size <= word,
        Type::Typedef(def) => is_integer_like(&def.aliased, word),
        Type::Enum(def) => is_integer_like(&def.base_type, word),
        _ => false,
    }
}

fn has_unaligned_members(ty: &Type) -> bool {
    match ty {
        Type::Typedef(def) => has_unaligned_members(&def.aliased),
        Type::Record(decl) => decl.def().is_some_and(|def| {
            def.members.iter().any(|member| match member {
                StructMember::Field(field) => !field.is_aligned() || has_unaligned_members(&field.ty),
                StructMember::AnonymousInnerRecord { decl, .. } => {
                    has_unaligned_members(&Type::Record(decl.clone()))
                }
                StructMember::BitField { .. } | StructMember::IncompleteField { .. } => false,
            })
        }),
        Type::ConstArray { element, .. } | Type::IncompleteArray { element } => {
            has_unaligned_members(element)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use cinterop_index::records::Field;
    use cinterop_index::{EnumDef, RecordKind, StructDef, TypedefDef};

    fn record(spelling: &str, size: u64, members: Vec<StructMember>) -> Type {
        Type::Record(StructDecl::with_def(
            spelling,
            StructDef {
                size,
                align: 4,
                kind: RecordKind::Struct,
                members,
            },
        ))
    }

    fn field(offset: u64, ty: Type, size: u64, align: u64) -> StructMember {
        StructMember::Field(Field::new("f", ty, offset, size, align))
    }

    fn rect() -> Type {
        let double = Type::floating(8, "double");
        record(
            "struct CGRect",
            32,
            (0..4).map(|i| field(i * 8, double.clone(), 8, 8)).collect(),
        )
    }

    #[test]
    fn arm64_never_uses_stret() {
        assert!(!is_stret(&rect(), Architecture::Arm64).unwrap());
    }

    #[test]
    fn x64_large_or_unaligned_records() {
        assert!(is_stret(&rect(), Architecture::X64).unwrap());

        let point = record(
            "struct CGPoint",
            16,
            vec![
                field(0, Type::floating(8, "double"), 8, 8),
                field(8, Type::floating(8, "double"), 8, 8),
            ],
        );
        assert!(!is_stret(&point, Architecture::X64).unwrap());

        let packed = record(
            "struct packed",
            5,
            vec![field(0, Type::Char, 1, 1), field(1, Type::int(), 4, 4)],
        );
        let alias = Type::Typedef(Rc::new(TypedefDef::new("packed_t", packed)));
        assert!(is_stret(&alias, Architecture::X64).unwrap());

        assert!(!is_stret(&Type::int(), Architecture::X64).unwrap());
    }

    #[test]
    fn arm32_integer_like_records_return_in_registers() {
        let small = record("struct tag", 4, vec![field(0, Type::int(), 4, 4)]);
        assert!(!is_stret(&small, Architecture::Arm32).unwrap());

        let two_shorts = record(
            "struct pair",
            4,
            vec![
                field(0, Type::integer(2, true, "short"), 2, 2),
                field(2, Type::integer(2, true, "short"), 2, 2),
            ],
        );
        assert!(is_stret(&two_shorts, Architecture::Arm32).unwrap());

        let color = Rc::new(EnumDef {
            spelling: "enum color".into(),
            base_type: Type::integer(4, false, "unsigned int"),
            constants: vec![],
        });
        let wrapped_enum = record("struct wrapped", 4, vec![field(0, Type::Enum(color), 4, 4)]);
        assert!(!is_stret(&wrapped_enum, Architecture::Arm32).unwrap());
        assert!(!is_stret(&Type::floating(8, "double"), Architecture::Arm32).unwrap());
    }

    #[test]
    fn other_families_are_unsupported() {
        let err = is_stret(&Type::int(), Architecture::X86).unwrap_err();
        assert!(matches!(err, GenError::UnsupportedTarget { .. }));
    }
}
