//! Structs, unions, enums and typedefs.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{IndexError, Result};
use crate::types::Type;

/// Whether a record is a struct or a union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Union,
}

/// An ordinary field. Offsets are in bits, sizes and alignment in bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub offset: u64,
    pub type_size: u64,
    pub type_align: u64,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type, offset_bytes: u64, size: u64, align: u64) -> Self {
        Self {
            name: name.into(),
            ty,
            offset: offset_bytes * 8,
            type_size: size,
            type_align: align,
        }
    }

    /// Byte offset, `None` when the field does not start on a byte boundary.
    pub fn offset_bytes(&self) -> Option<u64> {
        (self.offset % 8 == 0).then_some(self.offset / 8)
    }

    /// Whether the field sits at a multiple of its type's natural alignment.
    pub fn is_aligned(&self) -> bool {
        self.type_align == 0 || self.offset % (self.type_align * 8) == 0
    }
}

/// A member of a struct or union.
#[derive(Debug, Clone, PartialEq)]
pub enum StructMember {
    Field(Field),
    BitField {
        name: String,
        ty: Type,
        offset: u64,
        size: u64,
    },
    /// Flexible array member.
    IncompleteField { name: String, ty: Type },
    /// Unnamed nested struct or union; `offset` in bits, `type_size` in bytes.
    AnonymousInnerRecord {
        decl: Rc<StructDecl>,
        offset: u64,
        type_size: u64,
    },
}

impl StructMember {
    pub fn name(&self) -> Option<&str> {
        match self {
            StructMember::Field(field) => Some(&field.name),
            StructMember::BitField { name, .. } | StructMember::IncompleteField { name, .. } => {
                Some(name)
            }
            StructMember::AnonymousInnerRecord { .. } => None,
        }
    }
}

/// Layout and members of a complete record.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub size: u64,
    pub align: u64,
    pub kind: RecordKind,
    pub members: Vec<StructMember>,
}

impl StructDef {
    /// Ordinary fields, skipping every other member kind.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.members.iter().filter_map(|m| match m {
            StructMember::Field(field) => Some(field),
            _ => None,
        })
    }
}

/// A struct or union declaration; the definition is absent for forward
/// declarations.
pub struct StructDecl {
    /// C spelling including the tag keyword, e.g. `struct point`.
    pub spelling: String,
    def: OnceCell<StructDef>,
}

impl StructDecl {
    /// A declaration without a definition yet.
    pub fn new(spelling: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            spelling: spelling.into(),
            def: OnceCell::new(),
        })
    }

    pub fn with_def(spelling: impl Into<String>, def: StructDef) -> Rc<Self> {
        let decl = Self::new(spelling);
        let _ = decl.def.set(def);
        decl
    }

    /// Attach the definition; a declaration is defined at most once.
    pub fn define(&self, def: StructDef) -> Result<()> {
        self.def.set(def).map_err(|_| IndexError::AlreadyDefined {
            name: self.spelling.clone(),
        })
    }

    pub fn def(&self) -> Option<&StructDef> {
        self.def.get()
    }

    pub fn is_anonymous(&self) -> bool {
        self.spelling.contains("(anonymous")
    }
}

impl PartialEq for StructDecl {
    fn eq(&self, other: &Self) -> bool {
        self.spelling == other.spelling
    }
}

impl fmt::Debug for StructDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructDecl")
            .field("spelling", &self.spelling)
            .field("defined", &self.def.get().is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumConstant {
    pub name: String,
    pub value: i64,
    /// Whether the value was written out in the source.
    pub is_explicitly_defined: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub spelling: String,
    pub base_type: Type,
    pub constants: Vec<EnumConstant>,
}

impl EnumDef {
    pub fn is_anonymous(&self) -> bool {
        self.spelling.contains("(anonymous")
    }

    /// Spelling without the `enum ` keyword.
    pub fn name(&self) -> &str {
        self.spelling.strip_prefix("enum ").unwrap_or(&self.spelling)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedefDef {
    pub name: String,
    pub aliased: Type,
}

impl TypedefDef {
    pub fn new(name: impl Into<String>, aliased: Type) -> Self {
        Self {
            name: name.into(),
            aliased,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_alignment() {
        let aligned = Field::new("a", Type::int(), 4, 4, 4);
        assert!(aligned.is_aligned());
        assert_eq!(aligned.offset_bytes(), Some(4));

        let packed = Field::new("b", Type::int(), 1, 4, 4);
        assert!(!packed.is_aligned());
    }

    #[test]
    fn bit_offset_has_no_byte_offset() {
        let mut field = Field::new("a", Type::int(), 0, 4, 4);
        field.offset = 3;
        assert_eq!(field.offset_bytes(), None);
    }

    #[test]
    fn define_once() {
        let decl = StructDecl::new("struct node");
        assert!(decl.def().is_none());
        let def = StructDef {
            size: 8,
            align: 8,
            kind: RecordKind::Struct,
            members: vec![StructMember::Field(Field::new(
                "next",
                Type::pointer_to(Type::Record(decl.clone())),
                0,
                8,
                8,
            ))],
        };
        decl.define(def.clone()).unwrap();
        assert_eq!(decl.def().map(|d| d.size), Some(8));
        assert!(matches!(
            decl.define(def),
            Err(IndexError::AlreadyDefined { .. })
        ));
    }

    #[test]
    fn enum_names() {
        let def = EnumDef {
            spelling: "enum color".into(),
            base_type: Type::integer(4, false, "unsigned int"),
            constants: vec![],
        };
        assert_eq!(def.name(), "color");
        assert!(!def.is_anonymous());
    }
}
