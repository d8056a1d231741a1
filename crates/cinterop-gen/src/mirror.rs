//! Type mirrors: the managed representation of a native type together
//! with the conversion it needs at the wire.

use cinterop_index::{EnumDef, ObjCContainer, ObjCPointer, ObjCPointerKind, StructDecl, Type};

use crate::bridged::BridgedType;
use crate::error::{GenError, Result};
use crate::managed::{known, Classifier, ManagedType};

/// Naming and mapping decisions that depend on the library being bound.
pub trait DeclarationMapper {
    /// Package of the generated bindings.
    fn package(&self) -> &str;

    /// Managed class standing for the memory of a struct or union.
    fn class_for_pointed(&self, decl: &StructDecl) -> Classifier;

    /// Whether the enum maps to a distinct enum class.
    fn is_mapped_to_strict(&self, def: &EnumDef) -> bool;

    /// Managed name of the enum's value type.
    fn name_for_value(&self, def: &EnumDef) -> String;

    fn uses_unsigned_types(&self) -> bool;

    fn is_mapped_to_signed(&self, is_signed: bool) -> bool {
        is_signed || !self.uses_unsigned_types()
    }

    /// Managed class of an Objective-C class or protocol, or of its
    /// metaclass when `is_meta`.
    fn class_for_container(&self, container: &ObjCContainer, is_meta: bool) -> Classifier {
        let package = match container {
            ObjCContainer::Class(c) if c.is_forward_declaration => known::FORWARD_CLASSES_PACKAGE,
            ObjCContainer::Protocol(p) if p.is_forward_declaration => {
                known::FORWARD_PROTOCOLS_PACKAGE
            }
            _ => self.package(),
        };
        Classifier::top_level(package, container_class_name(container, is_meta))
    }
}

/// Managed class name of a container: protocols get a `Protocol` suffix,
/// metaclasses a `Meta` suffix.
pub fn container_class_name(container: &ObjCContainer, is_meta: bool) -> String {
    let base = match container {
        ObjCContainer::Class(c) => c.name.clone(),
        ObjCContainer::Protocol(p) => format!("{}Protocol", p.name),
    };
    if is_meta {
        format!("{base}Meta")
    } else {
        base
    }
}

/// How a mirrored value crosses the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeInfo {
    Primitive {
        bridged: BridgedType,
        var_class_of: Classifier,
    },
    /// Crosses as a signed byte.
    Boolean,
    Enum {
        class: Classifier,
        bridged: BridgedType,
    },
    Pointer {
        /// Pointed type of the pointee mirror.
        pointee: ManagedType,
        c_pointee: Type,
    },
    ObjCPointer {
        managed: ManagedType,
        pointer: ObjCPointer,
    },
    ObjCBlockPointer {
        /// Managed function type.
        managed: ManagedType,
        parameters: Vec<Type>,
        return_type: Type,
        nullable: bool,
    },
    /// Only representable by reference; never crosses the wire.
    ByRef {
        pointed: ManagedType,
    },
}

impl TypeInfo {
    /// The wire type, or `None` for by-reference types.
    pub fn try_bridged_type(&self) -> Option<BridgedType> {
        match self {
            TypeInfo::Primitive { bridged, .. } | TypeInfo::Enum { bridged, .. } => Some(*bridged),
            TypeInfo::Boolean => Some(BridgedType::Byte),
            TypeInfo::Pointer { .. } => Some(BridgedType::NativePtr),
            TypeInfo::ObjCPointer { .. } | TypeInfo::ObjCBlockPointer { .. } => {
                Some(BridgedType::ObjCPointer)
            }
            TypeInfo::ByRef { .. } => None,
        }
    }

    /// The wire type.
    ///
    /// # Panics
    ///
    /// Panics for [`TypeInfo::ByRef`]: by-reference types have no wire
    /// representation and asking for one is a caller bug.
    pub fn bridged_type(&self) -> BridgedType {
        match self.try_bridged_type() {
            Some(bridged) => bridged,
            None => panic!("by-reference type {self:?} has no wire type"),
        }
    }

    /// The by-reference accessor type for a value of `value` type.
    ///
    /// # Panics
    ///
    /// Panics for [`TypeInfo::ByRef`].
    pub fn construct_pointed_type(&self, value: ManagedType) -> ManagedType {
        match self {
            TypeInfo::Primitive { var_class_of, .. } => var_class_of.type_with(vec![value]),
            TypeInfo::Boolean => known::boolean_var_of(value),
            TypeInfo::Enum { class, .. } => class.nested("Var").ty(),
            TypeInfo::Pointer { .. } => known::c_pointer_var_of(value),
            TypeInfo::ObjCPointer { .. } => known::objc_object_var(value),
            TypeInfo::ObjCBlockPointer { .. } => known::objc_block_var(value),
            TypeInfo::ByRef { pointed } => {
                panic!("by-reference type {pointed:?} has no pointed type constructor")
            }
        }
    }
}

/// The managed representation of a native type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeMirror {
    ByValue {
        pointed_type: ManagedType,
        info: TypeInfo,
        value_type: ManagedType,
        nullable: bool,
    },
    ByRef {
        pointed_type: ManagedType,
        info: TypeInfo,
    },
}

impl TypeMirror {
    /// By-value mirror, nullable exactly when the info is a pointer.
    pub fn by_value(pointed_type: ManagedType, info: TypeInfo, value_type: ManagedType) -> Self {
        let nullable = matches!(info, TypeInfo::Pointer { .. });
        TypeMirror::ByValue {
            pointed_type,
            info,
            value_type,
            nullable,
        }
    }

    fn by_ref(pointed_type: ManagedType) -> Self {
        TypeMirror::ByRef {
            info: TypeInfo::ByRef {
                pointed: pointed_type.clone(),
            },
            pointed_type,
        }
    }

    pub fn info(&self) -> &TypeInfo {
        match self {
            TypeMirror::ByValue { info, .. } | TypeMirror::ByRef { info, .. } => info,
        }
    }

    pub fn pointed_type(&self) -> &ManagedType {
        match self {
            TypeMirror::ByValue { pointed_type, .. } | TypeMirror::ByRef { pointed_type, .. } => {
                pointed_type
            }
        }
    }

    /// Type used for parameters and return values.
    pub fn arg_type(&self) -> ManagedType {
        match self {
            TypeMirror::ByValue {
                value_type,
                nullable,
                ..
            } => value_type.make_nullable_as_specified(*nullable),
            TypeMirror::ByRef { pointed_type, .. } => known::c_value(pointed_type.clone()),
        }
    }
}

fn primitive_var_name(ty: &Type, mapper: &dyn DeclarationMapper) -> Result<(&'static str, ManagedType, Option<BridgedType>)> {
    let result = match ty {
        Type::Char => ("ByteVar", known::byte(), Some(BridgedType::Byte)),
        Type::Bool => ("BooleanVar", known::boolean(), None),
        Type::Integer { size, is_signed, .. } => {
            let signed = mapper.is_mapped_to_signed(*is_signed);
            let bridged = BridgedType::integer(*size, signed)?;
            let (var, managed) = match bridged {
                BridgedType::Byte => ("ByteVar", known::byte()),
                BridgedType::Short => ("ShortVar", known::short()),
                BridgedType::Int => ("IntVar", known::int()),
                BridgedType::Long => ("LongVar", known::long()),
                BridgedType::UByte => ("UByteVar", known::ubyte()),
                BridgedType::UShort => ("UShortVar", known::ushort()),
                BridgedType::UInt => ("UIntVar", known::uint()),
                _ => ("ULongVar", known::ulong()),
            };
            (var, managed, Some(bridged))
        }
        Type::Floating { size, .. } => {
            let bridged = BridgedType::floating(*size)?;
            if bridged == BridgedType::Float {
                ("FloatVar", known::float(), Some(bridged))
            } else {
                ("DoubleVar", known::double(), Some(bridged))
            }
        }
        other => return Err(GenError::unmappable(format!("{other:?} is not primitive"))),
    };
    Ok(result)
}

fn mirror_primitive(ty: &Type, mapper: &dyn DeclarationMapper) -> Result<TypeMirror> {
    let (var_name, value_type, bridged) = primitive_var_name(ty, mapper)?;
    let var_class = known::runtime(var_name);
    let info = match bridged {
        Some(bridged) => TypeInfo::Primitive {
            bridged,
            var_class_of: known::runtime(&format!("{var_name}Of")),
        },
        None => TypeInfo::Boolean,
    };
    Ok(TypeMirror::by_value(var_class.ty(), info, value_type))
}

/// Wire type of a primitive type, looking through typedefs.
pub fn primitive_bridged_type(ty: &Type, mapper: &dyn DeclarationMapper) -> Result<BridgedType> {
    let (_, _, bridged) = primitive_var_name(ty.unwrap_typedefs(), mapper)?;
    Ok(bridged.unwrap_or(BridgedType::Byte))
}

/// Resolve the mirror of `ty`.
pub fn mirror(mapper: &dyn DeclarationMapper, ty: &Type) -> Result<TypeMirror> {
    match ty {
        Type::Char | Type::Bool | Type::Integer { .. } | Type::Floating { .. } => {
            mirror_primitive(ty, mapper)
        }

        Type::Record(decl) => Ok(TypeMirror::by_ref(mapper.class_for_pointed(decl).ty())),

        Type::Enum(def) => {
            let package = mapper.package();
            let name = mapper.name_for_value(def);
            if mapper.is_mapped_to_strict(def) {
                let bridged = primitive_bridged_type(&def.base_type, mapper)?;
                let class = Classifier::top_level(package, name);
                let info = TypeInfo::Enum {
                    class: class.clone(),
                    bridged,
                };
                Ok(TypeMirror::by_value(class.nested("Var").ty(), info, class.ty()))
            } else if !def.is_anonymous() {
                let base = mirror(mapper, &def.base_type)?;
                Ok(TypeMirror::by_value(
                    Classifier::top_level(package, format!("{name}Var")).ty(),
                    base.info().clone(),
                    Classifier::top_level(package, name).ty(),
                ))
            } else {
                mirror(mapper, &def.base_type)
            }
        }

        Type::Pointer { pointee, .. } => match pointee.unwrap_typedefs() {
            Type::Void => {
                let info = TypeInfo::Pointer {
                    pointee: known::c_opaque(),
                    c_pointee: pointee.as_ref().clone(),
                };
                Ok(TypeMirror::by_value(
                    known::c_opaque_pointer_var(),
                    info,
                    known::c_opaque_pointer(),
                ))
            }
            Type::ConstArray { .. } | Type::IncompleteArray { .. } => mirror(mapper, pointee),
            _ => {
                let pointee_mirror = mirror(mapper, pointee)?;
                let pointed = pointee_mirror.pointed_type().clone();
                let info = TypeInfo::Pointer {
                    pointee: pointed.clone(),
                    c_pointee: pointee.as_ref().clone(),
                };
                Ok(TypeMirror::by_value(
                    known::c_pointer_var(pointed.clone()),
                    info,
                    known::c_pointer(pointed),
                ))
            }
        },

        Type::ConstArray { element, .. } | Type::IncompleteArray { element } => {
            let element_mirror = mirror(mapper, element)?;
            if matches!(
                element.unwrap_typedefs(),
                Type::ConstArray { .. } | Type::IncompleteArray { .. }
            ) {
                return Ok(element_mirror);
            }
            let pointed = element_mirror.pointed_type().clone();
            let info = TypeInfo::Pointer {
                pointee: pointed.clone(),
                c_pointee: element.as_ref().clone(),
            };
            Ok(TypeMirror::by_value(
                known::c_array_pointer_var(pointed.clone()),
                info,
                known::c_array_pointer(pointed),
            ))
        }

        Type::Function {
            parameters,
            return_type,
        } => {
            let function = managed_function_type(mapper, parameters, return_type)?;
            Ok(TypeMirror::by_ref(known::c_function(function)))
        }

        Type::Typedef(def) => {
            let base = mirror(mapper, &def.aliased)?;
            let package = mapper.package();
            Ok(match base {
                TypeMirror::ByValue { info, nullable, .. } => TypeMirror::ByValue {
                    pointed_type: Classifier::top_level(package, format!("{}Var", def.name)).ty(),
                    info,
                    value_type: Classifier::top_level(package, def.name.clone()).ty(),
                    nullable,
                },
                TypeMirror::ByRef { info, .. } => TypeMirror::ByRef {
                    pointed_type: Classifier::top_level(package, def.name.clone()).ty(),
                    info,
                },
            })
        }

        Type::ObjCPointer(pointer) => objc_pointer_mirror(mapper, pointer),

        Type::Void | Type::Vector { .. } | Type::Unsupported { .. } => Err(GenError::unmappable(
            format!("no managed representation for '{}'", ty.c_spelling()),
        )),
    }
}

fn is_nullable(pointer: &ObjCPointer) -> bool {
    pointer.nullability != cinterop_index::Nullability::NonNull
}

fn objc_pointer_mirror(mapper: &dyn DeclarationMapper, pointer: &ObjCPointer) -> Result<TypeMirror> {
    let nullable = is_nullable(pointer);
    let value_type = match &pointer.kind {
        ObjCPointerKind::Object { class, .. } if class.is_string_or_subclass() => known::string(),
        ObjCPointerKind::Object { class, .. } => match class.name.as_str() {
            "NSArray" => known::list_of_star(),
            "NSMutableArray" => known::mutable_list_of_any(),
            "NSSet" => known::set_of_star(),
            "NSDictionary" => known::map_of_any_to_star(),
            _ => mapper
                .class_for_container(&ObjCContainer::Class(class.clone()), false)
                .ty(),
        },
        ObjCPointerKind::Id { protocols } => match protocols.first() {
            Some(protocol) => mapper
                .class_for_container(&ObjCContainer::Protocol(protocol.clone()), false)
                .ty(),
            None => known::any(),
        },
        ObjCPointerKind::Class { .. } => known::objc_class(),
        ObjCPointerKind::InstanceType => {
            return Err(GenError::unmappable(
                "instancetype must be substituted by the receiver type",
            ))
        }
        ObjCPointerKind::Block {
            parameters,
            return_type,
        } => {
            let managed = managed_function_type(mapper, parameters, return_type)?;
            let info = TypeInfo::ObjCBlockPointer {
                managed: managed.clone(),
                parameters: parameters.clone(),
                return_type: return_type.as_ref().clone(),
                nullable,
            };
            return Ok(objc_mirror(managed, info, nullable));
        }
    };
    let info = TypeInfo::ObjCPointer {
        managed: value_type.clone(),
        pointer: pointer.clone(),
    };
    Ok(objc_mirror(value_type, info, nullable))
}

fn objc_mirror(value_type: ManagedType, info: TypeInfo, nullable: bool) -> TypeMirror {
    TypeMirror::ByValue {
        pointed_type: info.construct_pointed_type(value_type.make_nullable_as_specified(nullable)),
        info,
        value_type: value_type.make_nullable(),
        nullable,
    }
}

/// Managed return type of a native return: `Unit` for `void`.
pub fn managed_return_type(mapper: &dyn DeclarationMapper, return_type: &Type) -> Result<ManagedType> {
    if return_type.is_void() {
        Ok(known::unit())
    } else {
        Ok(mirror(mapper, return_type)?.arg_type())
    }
}

/// Managed function type of a native function or block signature.
pub fn managed_function_type(
    mapper: &dyn DeclarationMapper,
    parameters: &[Type],
    return_type: &Type,
) -> Result<ManagedType> {
    let parameters = parameters
        .iter()
        .map(|p| mirror(mapper, p).map(|m| m.arg_type()))
        .collect::<Result<Vec<_>>>()?;
    Ok(ManagedType::function(
        parameters,
        managed_return_type(mapper, return_type)?,
    ))
}
