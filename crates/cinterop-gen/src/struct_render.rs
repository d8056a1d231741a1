//! C declarations reproducing the layout of a struct or union.
//!
//! Forward-declared foreign structs are emitted as an anonymous
//! declaration whose compiled layout matches the offsets reported by the
//! indexer. Member names are synthetic (`p{index}`); nested anonymous
//! records add 100 per nesting level to keep names apart.
//!
//! Only the alignments 1, 2, 4, 8, 16 and 32 (besides the natural one) are
//! tried. Layouts produced by other `#pragma pack` values are reported as
//! unrenderable.

use cinterop_index::{RecordKind, StructDef, StructMember, Type};

const ALIGNMENT_CANDIDATES: [u64; 6] = [1, 2, 4, 8, 16, 32];

/// Render `def`, or `None` when its layout cannot be reproduced.
pub fn try_render_struct_or_union(def: &StructDef, nesting: usize) -> Option<String> {
    match def.kind {
        RecordKind::Struct => try_render_struct(def, nesting),
        RecordKind::Union => try_render_union(def, nesting),
    }
}

fn try_render_struct(def: &StructDef, nesting: usize) -> Option<String> {
    let is_packed = def.fields().any(|f| !f.is_aligned());

    // Only an inner anonymous record starts at a non-zero offset.
    let mut offset = match def.fields().next() {
        Some(field) => field.offset_bytes()?,
        None => 0,
    };

    let mut out = String::from("struct");
    if is_packed {
        out.push_str(" __attribute__((packed))");
    }
    out.push_str(" { ");

    for (i, member) in def.members.iter().enumerate() {
        let name = format!("p{}", i + 100 * nesting);
        let decl = match member {
            StructMember::Field(field) => {
                let field_offset = field.offset_bytes()?;
                let default_alignment = if is_packed { 1 } else { field.type_align };
                let alignment = guess_alignment(offset, field_offset, default_alignment)?;
                offset = field_offset + field.type_size;

                let var = try_render_var(&field.ty, &name, nesting)?;
                if alignment == default_alignment {
                    var
                } else {
                    format!("{var} __attribute__((aligned({alignment})))")
                }
            }
            StructMember::BitField { .. } | StructMember::IncompleteField { .. } => return None,
            StructMember::AnonymousInnerRecord {
                decl,
                offset: bits,
                type_size,
            } => {
                offset = bits / 8 + type_size;
                try_render_inner(decl.def()?, nesting + 1)?
            }
        };
        out.push_str(&decl);
        out.push_str("; ");
    }

    out.push('}');
    Some(out)
}

fn try_render_union(def: &StructDef, nesting: usize) -> Option<String> {
    let mut out = String::from("union { ");
    for (i, member) in def.members.iter().enumerate() {
        let decl = match member {
            StructMember::Field(field) => {
                try_render_var(&field.ty, &format!("p{}", i + 100 * nesting), nesting)?
            }
            StructMember::BitField { .. } | StructMember::IncompleteField { .. } => return None,
            StructMember::AnonymousInnerRecord { decl, .. } => {
                try_render_inner(decl.def()?, nesting + 1)?
            }
        };
        out.push_str(&decl);
        out.push_str("; ");
    }
    out.push('}');
    Some(out)
}

fn try_render_inner(def: &StructDef, nesting: usize) -> Option<String> {
    try_render_struct_or_union(def, nesting).map(|rendered| format!("{rendered} "))
}

/// The smallest candidate alignment that pads `offset` to `padded`,
/// trying `default_alignment` first.
fn guess_alignment(offset: u64, padded: u64, default_alignment: u64) -> Option<u64> {
    std::iter::once(default_alignment)
        .chain(ALIGNMENT_CANDIDATES)
        .find(|&alignment| align_up(offset, alignment) == padded)
}

fn align_up(x: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        return x;
    }
    (x + alignment - 1) & !(alignment - 1)
}

fn try_render_var(ty: &Type, name: &str, nesting: usize) -> Option<String> {
    let declared = |spelling: &str| format!("{spelling} {name}");
    match ty {
        Type::Char | Type::Bool => Some(declared("char")),
        Type::Integer { spelling, .. }
        | Type::Floating { spelling, .. }
        | Type::Vector { spelling, .. } => Some(declared(spelling)),
        Type::Record(decl) => {
            let rendered = try_render_struct_or_union(decl.def()?, nesting)?;
            Some(declared(&rendered))
        }
        Type::Enum(def) => try_render_var(&def.base_type, name, nesting),
        Type::Pointer { .. } | Type::ObjCPointer(_) => Some(declared("void*")),
        Type::ConstArray { element, length } => {
            try_render_var(element, &format!("{name}[{length}]"), nesting)
        }
        Type::IncompleteArray { element } => try_render_var(element, &format!("{name}[]"), nesting),
        Type::Typedef(def) => try_render_var(&def.aliased, name, nesting),
        Type::Void | Type::Function { .. } | Type::Unsupported { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinterop_index::records::Field;
    use cinterop_index::StructDecl;
    use pretty_assertions::assert_eq;

    fn field(offset: u64, ty: Type, size: u64, align: u64) -> StructMember {
        StructMember::Field(Field::new(format!("f{offset}"), ty, offset, size, align))
    }

    fn def(kind: RecordKind, members: Vec<StructMember>) -> StructDef {
        StructDef {
            size: 0,
            align: 0,
            kind,
            members,
        }
    }

    #[test]
    fn naturally_aligned_fields() {
        let def = def(
            RecordKind::Struct,
            vec![
                field(0, Type::int(), 4, 4),
                field(4, Type::int(), 4, 4),
                field(8, Type::floating(4, "float"), 4, 4),
            ],
        );
        assert_eq!(
            try_render_struct_or_union(&def, 0).unwrap(),
            "struct { int p0; int p1; float p2; }"
        );
    }

    #[test]
    fn over_aligned_field_gets_attribute() {
        let def = def(
            RecordKind::Struct,
            vec![
                field(0, Type::Char, 1, 1),
                field(16, Type::int(), 4, 4),
            ],
        );
        assert_eq!(
            try_render_struct_or_union(&def, 0).unwrap(),
            "struct { char p0; int p1 __attribute__((aligned(16))); }"
        );
    }

    #[test]
    fn unaligned_field_packs_the_struct() {
        let def = def(
            RecordKind::Struct,
            vec![
                field(0, Type::Char, 1, 1),
                field(1, Type::int(), 4, 4),
                field(5, Type::pointer_to(Type::Void), 8, 8),
            ],
        );
        assert_eq!(
            try_render_struct_or_union(&def, 0).unwrap(),
            "struct __attribute__((packed)) { char p0; int p1; void* p2; }"
        );
    }

    #[test]
    fn unreachable_offset_is_unrenderable() {
        // A 3-byte gap after a 4-byte field cannot come from any alignment.
        let def = def(
            RecordKind::Struct,
            vec![
                field(0, Type::int(), 4, 4),
                field(7, Type::Char, 1, 1),
                field(12, Type::int(), 4, 4),
            ],
        );
        assert_eq!(try_render_struct_or_union(&def, 0), None);
    }

    #[test]
    fn misaligned_int_after_char_is_unrenderable() {
        let def = def(
            RecordKind::Struct,
            vec![field(0, Type::Char, 1, 1), field(3, Type::int(), 4, 4)],
        );
        assert_eq!(try_render_struct_or_union(&def, 0), None);
    }

    #[test]
    fn bit_fields_are_unrenderable() {
        let def = def(
            RecordKind::Struct,
            vec![
                field(0, Type::int(), 4, 4),
                StructMember::BitField {
                    name: "flag".into(),
                    ty: Type::int(),
                    offset: 32,
                    size: 1,
                },
            ],
        );
        assert_eq!(try_render_struct_or_union(&def, 0), None);
    }

    #[test]
    fn nested_anonymous_union_renumbers_members() {
        let inner = StructDecl::with_def(
            "union (anonymous at x.h:3:5)",
            def(
                RecordKind::Union,
                vec![
                    field(8, Type::int(), 4, 4),
                    field(8, Type::floating(8, "double"), 8, 8),
                ],
            ),
        );
        let outer = def(
            RecordKind::Struct,
            vec![
                field(0, Type::integer(8, true, "long"), 8, 8),
                StructMember::AnonymousInnerRecord {
                    decl: inner,
                    offset: 64,
                    type_size: 8,
                },
                field(16, Type::array_of(Type::Char, 4), 4, 1),
            ],
        );
        assert_eq!(
            try_render_struct_or_union(&outer, 0).unwrap(),
            "struct { long p0; union { int p100; double p101; } ; char p2[4]; }"
        );
    }

    #[test]
    fn enums_and_typedefs_render_through_their_base() {
        use cinterop_index::{EnumDef, TypedefDef};
        use std::rc::Rc;

        let color = Rc::new(EnumDef {
            spelling: "enum color".into(),
            base_type: Type::integer(4, false, "unsigned int"),
            constants: vec![],
        });
        let size = Rc::new(TypedefDef::new("size_t", Type::integer(8, false, "unsigned long")));
        let def = def(
            RecordKind::Struct,
            vec![
                field(0, Type::Enum(color), 4, 4),
                field(8, Type::Typedef(size), 8, 8),
            ],
        );
        assert_eq!(
            try_render_struct_or_union(&def, 0).unwrap(),
            "struct { unsigned int p0; unsigned long p1; }"
        );
    }
}
