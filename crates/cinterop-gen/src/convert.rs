//! Conversions between typed values and their wire representation.
//!
//! Four directions exist: managed value to wire (`arg_to_bridged`), wire
//! to managed value (`arg_from_bridged`), wire to native value
//! (`c_from_bridged`) and native value to wire (`c_to_bridged`). Blocks
//! are the only values whose conversion needs a bridge of its own.
//!
//! By-reference types have no wire value and converting one panics;
//! [`crate::mapping`] passes records by pointer instead.

use cinterop_index::{Nullability, ObjCPointerKind, Type};

use crate::bridge::{BridgeGenerator, ClientId};
use crate::code::ManagedCodeBuilder;
use crate::error::Result;
use crate::managed::{ManagedType, ManagedParameter, render_parameters};
use crate::mapping::{self, TypedValue};
use crate::mirror::{DeclarationMapper, TypeInfo};

fn by_ref_violation(pointed: &ManagedType) -> ! {
    panic!("by-reference type {pointed:?} cannot be converted to a wire value")
}

/// Managed value to wire value.
///
/// # Panics
///
/// Panics for [`TypeInfo::ByRef`].
pub fn arg_to_bridged(info: &TypeInfo, expr: &str) -> String {
    match info {
        TypeInfo::Primitive { .. } => expr.to_string(),
        TypeInfo::Boolean => format!("{expr}.toByte()"),
        TypeInfo::Enum { .. } => format!("{expr}.value"),
        TypeInfo::Pointer { .. } => format!("{expr}.rawValue"),
        TypeInfo::ObjCPointer { .. } => format!("{expr}.objcPtr()"),
        // Turned into a real block by `c_from_bridged`.
        TypeInfo::ObjCBlockPointer { .. } => format!("createKotlinObjectHolder({expr})"),
        TypeInfo::ByRef { pointed } => by_ref_violation(pointed),
    }
}

/// Native value to wire value.
///
/// # Panics
///
/// Panics for [`TypeInfo::ByRef`].
pub fn c_to_bridged(info: &TypeInfo, expr: &str) -> String {
    match info {
        TypeInfo::Boolean => format!("({expr}) ? 1 : 0"),
        TypeInfo::Primitive { .. }
        | TypeInfo::Enum { .. }
        | TypeInfo::Pointer { .. }
        | TypeInfo::ObjCPointer { .. }
        | TypeInfo::ObjCBlockPointer { .. } => expr.to_string(),
        TypeInfo::ByRef { pointed } => by_ref_violation(pointed),
    }
}

/// Wire value to managed value.
///
/// # Panics
///
/// Panics for [`TypeInfo::ByRef`].
pub fn arg_from_bridged(
    info: &TypeInfo,
    expr: &str,
    mapper: &dyn DeclarationMapper,
    client: ClientId,
    bridges: &mut BridgeGenerator,
) -> Result<String> {
    let scope = mapper.package();
    let converted = match info {
        TypeInfo::Primitive { .. } => expr.to_string(),
        TypeInfo::Boolean => format!("{expr}.toBoolean()"),
        TypeInfo::Enum { class, .. } => format!("{}.byValue({expr})", class.render(scope)),
        TypeInfo::Pointer { pointee, .. } => {
            format!("interpretCPointer<{}>({expr})", pointee.render(scope))
        }
        TypeInfo::ObjCPointer { managed, pointer } => {
            let assertion = if pointer.nullability == Nullability::NonNull {
                "!!"
            } else {
                ""
            };
            format!(
                "interpretObjCPointerOrNull<{}>({expr}){assertion}",
                managed.render(scope)
            )
        }
        TypeInfo::ObjCBlockPointer {
            managed,
            parameters,
            return_type,
            nullable,
        } => block_from_bridged(
            expr,
            managed,
            parameters,
            return_type,
            *nullable,
            mapper,
            client,
            bridges,
        )?,
        TypeInfo::ByRef { pointed } => by_ref_violation(pointed),
    };
    Ok(converted)
}

/// A managed anonymous function calling the block behind `expr`.
#[allow(clippy::too_many_arguments)]
fn block_from_bridged(
    expr: &str,
    managed: &ManagedType,
    parameters: &[Type],
    return_type: &Type,
    nullable: bool,
    mapper: &dyn DeclarationMapper,
    client: ClientId,
    bridges: &mut BridgeGenerator,
) -> Result<String> {
    let scope = mapper.package();
    let (managed_parameters, managed_return) = match managed {
        ManagedType::Function {
            parameters,
            return_type,
            ..
        } => (parameters.clone(), return_type.as_ref().clone()),
        other => (Vec::new(), other.clone()),
    };
    let fun_parameters: Vec<ManagedParameter> = managed_parameters
        .into_iter()
        .enumerate()
        .map(|(i, ty)| ManagedParameter::new(format!("p{i}"), ty))
        .collect();

    let block_type = Type::objc(
        ObjCPointerKind::Block {
            parameters: parameters.to_vec(),
            return_type: Box::new(return_type.clone()),
        },
        Nullability::Unspecified,
    )
    .c_spelling();

    let mut values: Vec<TypedValue> = parameters
        .iter()
        .enumerate()
        .map(|(i, ty)| TypedValue::new(ty.clone(), format!("p{i}")))
        .collect();
    values.push(TypedValue::new(
        Type::pointer_to(Type::Void),
        "interpretCPointer<COpaque>(blockPtr)",
    ));

    let mut code = ManagedCodeBuilder::new(scope);
    let result = mapping::managed_to_native(
        bridges,
        mapper,
        &mut code,
        client,
        return_type,
        &values,
        true,
        |native| {
            let (block, arguments) = native.split_last().map_or(("", &[][..]), |(l, r)| (l.as_str(), r));
            format!("((__bridge {block_type}){block})({})", arguments.join(", "))
        },
    )?;
    code.return_result(&result);

    let null_output = if nullable {
        "null"
    } else {
        "throw NullPointerException()"
    };
    let mut function = format!(
        "fun({}): {} {{\n",
        render_parameters(&fun_parameters, scope),
        managed_return.render(scope)
    );
    for line in code.into_lines() {
        function.push_str(&line);
        function.push('\n');
    }
    function.push('}');
    Ok(format!(
        "{expr}.let {{ blockPtr -> if (blockPtr == nativeNullPtr) {null_output} else {function} }}"
    ))
}

/// Wire value to native value.
///
/// # Panics
///
/// Panics for [`TypeInfo::ByRef`].
pub fn c_from_bridged(
    info: &TypeInfo,
    expr: &str,
    mapper: &dyn DeclarationMapper,
    client: ClientId,
    bridges: &mut BridgeGenerator,
) -> Result<String> {
    let converted = match info {
        TypeInfo::Boolean => format!("({expr}) ? 1 : 0"),
        TypeInfo::Pointer { c_pointee, .. } => {
            format!("({}){expr}", Type::pointer_to(c_pointee.clone()).c_spelling())
        }
        TypeInfo::Primitive { .. } | TypeInfo::Enum { .. } | TypeInfo::ObjCPointer { .. } => {
            expr.to_string()
        }
        TypeInfo::ObjCBlockPointer {
            managed,
            parameters,
            return_type,
            ..
        } => block_from_managed(expr, managed, parameters, return_type, mapper, client, bridges)?,
        TypeInfo::ByRef { pointed } => by_ref_violation(pointed),
    };
    Ok(converted)
}

/// A native block calling the managed function held by `expr`.
fn block_from_managed(
    expr: &str,
    managed: &ManagedType,
    parameters: &[Type],
    return_type: &Type,
    mapper: &dyn DeclarationMapper,
    client: ClientId,
    bridges: &mut BridgeGenerator,
) -> Result<String> {
    let block_parameters = parameters
        .iter()
        .enumerate()
        .map(|(i, ty)| ty.declare(&format!("p{i}")))
        .collect::<Vec<_>>()
        .join(", ");

    let mut values: Vec<TypedValue> = parameters
        .iter()
        .enumerate()
        .map(|(i, ty)| TypedValue::new(ty.clone(), format!("p{i}")))
        .collect();
    values.push(TypedValue::new(
        Type::objc(
            ObjCPointerKind::Id {
                protocols: Vec::new(),
            },
            Nullability::Nullable,
        ),
        "blockFunction",
    ));

    let function_type = managed.make_nullable_as_specified(false).render(mapper.package());
    let call = mapping::native_to_managed(bridges, mapper, client, return_type, &values, |_, args| {
        let (function, arguments) = args.split_last().map_or(("", &[][..]), |(l, r)| (l.as_str(), r));
        format!(
            "unwrapKotlinObjectHolder<{function_type}>({function})({})",
            arguments.join(", ")
        )
    })?;
    let statement = if return_type.is_void() {
        format!("{call};")
    } else {
        format!("return {call};")
    };

    Ok(format!(
        "({{ id blockFunction = {expr}; (blockFunction == nil) ? nil : (id)^{}({block_parameters}) {{ {statement} }}; }})",
        return_type.c_spelling()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManagedPlatform;
    use crate::managed::{known, Classifier};
    use crate::mirror::tests::TestMapper;
    use crate::mirror::mirror;
    use cinterop_index::{Language, ObjCClass};

    fn setup() -> (TestMapper, BridgeGenerator) {
        (
            TestMapper { unsigned: true },
            BridgeGenerator::new("test", ManagedPlatform::Native, Language::ObjectiveC),
        )
    }

    #[test]
    fn simple_conversions() {
        let (mapper, mut bridges) = setup();
        let client = ClientId::new();

        let boolean = TypeInfo::Boolean;
        assert_eq!(arg_to_bridged(&boolean, "flag"), "flag.toByte()");
        assert_eq!(c_to_bridged(&boolean, "b"), "(b) ? 1 : 0");
        assert_eq!(
            arg_from_bridged(&boolean, "p0", &mapper, client, &mut bridges).unwrap(),
            "p0.toBoolean()"
        );

        let color = Classifier::top_level("test", "color");
        let enum_info = TypeInfo::Enum {
            class: color,
            bridged: crate::bridged::BridgedType::UInt,
        };
        assert_eq!(arg_to_bridged(&enum_info, "c"), "c.value");
        assert_eq!(
            arg_from_bridged(&enum_info, "p0", &mapper, client, &mut bridges).unwrap(),
            "color.byValue(p0)"
        );

        let int_ptr = mirror(&mapper, &Type::pointer_to(Type::int())).unwrap();
        let info = int_ptr.info();
        assert_eq!(arg_to_bridged(info, "buf"), "buf.rawValue");
        assert_eq!(
            arg_from_bridged(info, "p0", &mapper, client, &mut bridges).unwrap(),
            "interpretCPointer<IntVar>(p0)"
        );
        assert_eq!(
            c_from_bridged(info, "p0", &mapper, client, &mut bridges).unwrap(),
            "(int *)p0"
        );
        assert!(bridges.bridges().is_empty());
    }

    #[test]
    fn objc_pointer_conversions() {
        let (mapper, mut bridges) = setup();
        let client = ClientId::new();
        let view = ObjCClass::new("UIView", None, vec![]);
        let non_null = Type::objc(
            ObjCPointerKind::Object {
                class: view.clone(),
                protocols: vec![],
            },
            Nullability::NonNull,
        );
        let m = mirror(&mapper, &non_null).unwrap();
        assert_eq!(arg_to_bridged(m.info(), "v"), "v.objcPtr()");
        assert_eq!(
            arg_from_bridged(m.info(), "p0", &mapper, client, &mut bridges).unwrap(),
            "interpretObjCPointerOrNull<UIView>(p0)!!"
        );

        let nullable = Type::objc(
            ObjCPointerKind::Object {
                class: view,
                protocols: vec![],
            },
            Nullability::Nullable,
        );
        let m = mirror(&mapper, &nullable).unwrap();
        assert_eq!(
            arg_from_bridged(m.info(), "p0", &mapper, client, &mut bridges).unwrap(),
            "interpretObjCPointerOrNull<UIView>(p0)"
        );
    }

    fn completion_block(nullability: Nullability) -> Type {
        Type::objc(
            ObjCPointerKind::Block {
                parameters: vec![Type::Bool],
                return_type: Box::new(Type::Void),
            },
            nullability,
        )
    }

    #[test]
    fn block_to_managed_function() {
        let (mapper, mut bridges) = setup();
        let client = ClientId::new();
        let m = mirror(&mapper, &completion_block(Nullability::Nullable)).unwrap();
        let converted = arg_from_bridged(m.info(), "p0", &mapper, client, &mut bridges).unwrap();
        assert_eq!(
            converted,
            "p0.let { blockPtr -> if (blockPtr == nativeNullPtr) null else fun(p0: Boolean): Unit {\n\
             return bridge0(p0.toByte(), interpretCPointer<COpaque>(blockPtr).rawValue)\n\
             } }"
        );
        let bridge = &bridges.bridges()[0];
        assert_eq!(bridge.client, client);
        assert_eq!(
            bridge.native_lines[2],
            "    ((__bridge void (^)(_Bool))(void *)p1)((p0) ? 1 : 0);"
        );
    }

    #[test]
    fn non_null_block_throws_on_null() {
        let (mapper, mut bridges) = setup();
        let m = mirror(&mapper, &completion_block(Nullability::NonNull)).unwrap();
        let converted =
            arg_from_bridged(m.info(), "x", &mapper, ClientId::new(), &mut bridges).unwrap();
        assert!(converted.contains("if (blockPtr == nativeNullPtr) throw NullPointerException() else"));
    }

    #[test]
    fn managed_function_to_block() {
        let (mapper, mut bridges) = setup();
        let client = ClientId::new();
        let m = mirror(&mapper, &completion_block(Nullability::Nullable)).unwrap();
        assert_eq!(arg_to_bridged(m.info(), "handler"), "createKotlinObjectHolder(handler)");
        let converted = c_from_bridged(m.info(), "p1", &mapper, client, &mut bridges).unwrap();
        assert_eq!(
            converted,
            "({ id blockFunction = p1; (blockFunction == nil) ? nil : (id)^void(_Bool p0) { \
             test_bridge0((p0) ? 1 : 0, blockFunction); }; })"
        );
        let bridge = &bridges.bridges()[0];
        assert_eq!(bridge.native_lines, vec!["void test_bridge0(int8_t p0, id p1);"]);
        assert_eq!(
            bridge.managed_lines[2],
            "    unwrapKotlinObjectHolder<(Boolean) -> Unit>(interpretObjCPointerOrNull<Any>(p1))(p0.toBoolean())"
        );
    }

    #[test]
    #[should_panic]
    fn by_ref_conversion_panics() {
        arg_to_bridged(
            &TypeInfo::ByRef {
                pointed: known::int(),
            },
            "x",
        );
    }
}
