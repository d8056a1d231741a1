//! Wire types: the only vocabulary crossing the managed/native boundary.

use std::fmt;

use crate::config::ManagedPlatform;
use crate::error::{GenError, Result};
use crate::managed::{known, ManagedType};

/// A primitive wire type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgedType {
    Byte,
    Short,
    Int,
    Long,
    UByte,
    UShort,
    UInt,
    ULong,
    Float,
    Double,
    NativePtr,
    ObjCPointer,
    Void,
}

impl BridgedType {
    /// The wire type for an integer of `size` bytes.
    pub fn integer(size: u64, is_signed: bool) -> Result<Self> {
        let bridged = match (size, is_signed) {
            (1, true) => BridgedType::Byte,
            (2, true) => BridgedType::Short,
            (4, true) => BridgedType::Int,
            (8, true) => BridgedType::Long,
            (1, false) => BridgedType::UByte,
            (2, false) => BridgedType::UShort,
            (4, false) => BridgedType::UInt,
            (8, false) => BridgedType::ULong,
            _ => return Err(GenError::UnsupportedWidth { kind: "integer", size }),
        };
        Ok(bridged)
    }

    pub fn floating(size: u64) -> Result<Self> {
        match size {
            4 => Ok(BridgedType::Float),
            8 => Ok(BridgedType::Double),
            _ => Err(GenError::UnsupportedWidth {
                kind: "floating",
                size,
            }),
        }
    }

    /// `(size, is_signed)` of an integer wire type.
    pub fn integer_shape(self) -> Option<(u64, bool)> {
        match self {
            BridgedType::Byte => Some((1, true)),
            BridgedType::Short => Some((2, true)),
            BridgedType::Int => Some((4, true)),
            BridgedType::Long => Some((8, true)),
            BridgedType::UByte => Some((1, false)),
            BridgedType::UShort => Some((2, false)),
            BridgedType::UInt => Some((4, false)),
            BridgedType::ULong => Some((8, false)),
            _ => None,
        }
    }

    pub fn is_void(self) -> bool {
        self == BridgedType::Void
    }

    /// Managed type of a bridge parameter or result.
    pub fn managed_type(self) -> ManagedType {
        match self {
            BridgedType::Byte => known::byte(),
            BridgedType::Short => known::short(),
            BridgedType::Int => known::int(),
            BridgedType::Long => known::long(),
            BridgedType::UByte => known::ubyte(),
            BridgedType::UShort => known::ushort(),
            BridgedType::UInt => known::uint(),
            BridgedType::ULong => known::ulong(),
            BridgedType::Float => known::float(),
            BridgedType::Double => known::double(),
            BridgedType::NativePtr | BridgedType::ObjCPointer => known::native_ptr(),
            BridgedType::Void => known::unit(),
        }
    }

    /// C spelling on the native side of a bridge.
    pub fn native_type(self, platform: ManagedPlatform) -> Result<&'static str> {
        let spelling = match platform {
            ManagedPlatform::Native => match self {
                BridgedType::Byte => "int8_t",
                BridgedType::Short => "int16_t",
                BridgedType::Int => "int32_t",
                BridgedType::Long => "int64_t",
                BridgedType::UByte => "uint8_t",
                BridgedType::UShort => "uint16_t",
                BridgedType::UInt => "uint32_t",
                BridgedType::ULong => "uint64_t",
                BridgedType::Float => "float",
                BridgedType::Double => "double",
                BridgedType::NativePtr => "void*",
                BridgedType::ObjCPointer => "id",
                BridgedType::Void => "void",
            },
            ManagedPlatform::Jvm => match self {
                BridgedType::Byte | BridgedType::UByte => "jbyte",
                BridgedType::Short | BridgedType::UShort => "jshort",
                BridgedType::Int | BridgedType::UInt => "jint",
                BridgedType::Long | BridgedType::ULong | BridgedType::NativePtr => "jlong",
                BridgedType::Float => "jfloat",
                BridgedType::Double => "jdouble",
                BridgedType::Void => "void",
                BridgedType::ObjCPointer => {
                    return Err(GenError::UnsupportedOnPlatform {
                        detail: "Objective-C pointers cannot cross a JNI bridge".into(),
                    })
                }
            },
        };
        Ok(spelling)
    }
}

impl fmt::Display for BridgedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BridgedType::Byte => "BYTE",
            BridgedType::Short => "SHORT",
            BridgedType::Int => "INT",
            BridgedType::Long => "LONG",
            BridgedType::UByte => "UBYTE",
            BridgedType::UShort => "USHORT",
            BridgedType::UInt => "UINT",
            BridgedType::ULong => "ULONG",
            BridgedType::Float => "FLOAT",
            BridgedType::Double => "DOUBLE",
            BridgedType::NativePtr => "NATIVE_PTR",
            BridgedType::ObjCPointer => "OBJC_POINTER",
            BridgedType::Void => "VOID",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_width_and_signedness_survive() {
        for size in [1, 2, 4, 8] {
            for signed in [true, false] {
                let bridged = BridgedType::integer(size, signed).unwrap();
                assert_eq!(bridged.integer_shape(), Some((size, signed)));
            }
        }
    }

    #[test]
    fn odd_integer_widths_fail() {
        for size in [0, 3, 16] {
            assert!(matches!(
                BridgedType::integer(size, true),
                Err(GenError::UnsupportedWidth { kind: "integer", .. })
            ));
        }
        assert!(BridgedType::floating(10).is_err());
        assert_eq!(BridgedType::floating(4).unwrap(), BridgedType::Float);
    }

    #[test]
    fn native_spellings() {
        assert_eq!(
            BridgedType::UShort.native_type(ManagedPlatform::Native).unwrap(),
            "uint16_t"
        );
        assert_eq!(
            BridgedType::NativePtr.native_type(ManagedPlatform::Jvm).unwrap(),
            "jlong"
        );
        assert!(BridgedType::ObjCPointer
            .native_type(ManagedPlatform::Jvm)
            .is_err());
    }

    #[test]
    fn managed_types() {
        assert_eq!(BridgedType::ObjCPointer.managed_type().render("p"), "NativePtr");
        assert_eq!(BridgedType::Void.managed_type().render("p"), "Unit");
        assert_eq!(BridgedType::ULong.managed_type().render("p"), "ULong");
    }
}
