//! Bridges over typed values.
//!
//! These wrap the wire-level bridge generator: arguments are converted to
//! wire values on the calling side, converted back on the other side, and
//! the result takes the reverse path. A `void` result crosses as nothing
//! and its expression becomes a statement.
//!
//! Structs and unions have no wire type. They cross as a pointer to a copy
//! of the value, and a record result is written through one extra pointer
//! argument into `kniStructResult`.

use cinterop_index::Type;

use crate::bridge::{BridgeGenerator, BridgeValue, ClientId};
use crate::bridged::BridgedType;
use crate::code::ManagedCodeBuilder;
use crate::convert;
use crate::error::{GenError, Result};
use crate::managed::ManagedType;
use crate::mirror::{mirror, DeclarationMapper, TypeInfo};

const STRUCT_RESULT: &str = "kniStructResult";

/// A native-typed expression.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    pub ty: Type,
    pub expr: String,
}

impl TypedValue {
    pub fn new(ty: Type, expr: impl Into<String>) -> Self {
        Self {
            ty,
            expr: expr.into(),
        }
    }
}

/// How one value crosses a bridge.
#[derive(Debug, Clone)]
enum Crossing {
    /// Converted to a wire value.
    Value(TypeInfo),
    /// A struct or union passed as a pointer to a copy of it.
    Record { pointed: ManagedType, c_type: String },
}

fn crossing(mapper: &dyn DeclarationMapper, ty: &Type) -> Result<Crossing> {
    let mirror = mirror(mapper, ty)?;
    match mirror.info() {
        TypeInfo::ByRef { pointed } if matches!(ty.unwrap_typedefs(), Type::Record(_)) => {
            Ok(Crossing::Record {
                pointed: pointed.clone(),
                c_type: ty.c_spelling(),
            })
        }
        TypeInfo::ByRef { .. } => Err(GenError::unmappable(format!(
            "'{}' cannot cross a bridge by value",
            ty.c_spelling()
        ))),
        info => Ok(Crossing::Value(info.clone())),
    }
}

fn return_crossing(mapper: &dyn DeclarationMapper, ty: &Type) -> Result<Option<Crossing>> {
    if ty.is_void() {
        Ok(None)
    } else {
        crossing(mapper, ty).map(Some)
    }
}

fn crossings(mapper: &dyn DeclarationMapper, values: &[TypedValue]) -> Result<Vec<Crossing>> {
    values.iter().map(|v| crossing(mapper, &v.ty)).collect()
}

/// Whether a value of type `ty` can be passed through a bridge.
pub fn crosses_bridge(mapper: &dyn DeclarationMapper, ty: &Type) -> Result<bool> {
    match crossing(mapper, ty) {
        Ok(_) => Ok(true),
        Err(GenError::UnmappableType { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Call native code from managed code.
///
/// `body` receives the native argument expressions and returns the native
/// result expression. Statements the call needs are emitted into `code`;
/// the returned managed expression is the result.
#[allow(clippy::too_many_arguments)]
pub fn managed_to_native<F>(
    bridges: &mut BridgeGenerator,
    mapper: &dyn DeclarationMapper,
    code: &mut ManagedCodeBuilder,
    client: ClientId,
    return_type: &Type,
    values: &[TypedValue],
    independent: bool,
    body: F,
) -> Result<String>
where
    F: FnOnce(&[String]) -> String,
{
    let kinds = crossings(mapper, values)?;
    let result_kind = return_crossing(mapper, return_type)?;

    let mut bridge_values = Vec::with_capacity(values.len() + 1);
    for (kind, v) in kinds.iter().zip(values) {
        bridge_values.push(match kind {
            Crossing::Value(info) => BridgeValue::new(info.bridged_type(), convert::arg_to_bridged(info, &v.expr)),
            Crossing::Record { .. } => {
                code.push_mem_scoped();
                BridgeValue::new(
                    BridgedType::NativePtr,
                    format!("{}.getPointer(memScope).rawValue", v.expr),
                )
            }
        });
    }
    let bridged_return = match &result_kind {
        Some(Crossing::Value(info)) => info.bridged_type(),
        Some(Crossing::Record { pointed, .. }) => {
            code.push_mem_scoped();
            code.out(format!("val {STRUCT_RESULT} = alloc<{}>()", pointed.render(code.scope())));
            bridge_values.push(BridgeValue::new(BridgedType::NativePtr, format!("{STRUCT_RESULT}.rawPtr")));
            BridgedType::Void
        }
        None => BridgedType::Void,
    };

    let call = bridges.managed_to_native(
        client,
        bridged_return,
        &bridge_values,
        independent,
        |bridges, _, names| {
            let mut native = Vec::with_capacity(names.len());
            for (kind, name) in kinds.iter().zip(names) {
                native.push(match kind {
                    Crossing::Value(info) => convert::c_from_bridged(info, name, mapper, client, bridges)?,
                    Crossing::Record { c_type, .. } => format!("*({c_type}*){name}"),
                });
            }
            let result = body(&native);
            Ok(match &result_kind {
                Some(Crossing::Value(info)) => convert::c_to_bridged(info, &result),
                Some(Crossing::Record { c_type, .. }) => {
                    format!("*({c_type}*){} = {result}", names[values.len()])
                }
                None => result,
            })
        },
    )?;

    match &result_kind {
        Some(Crossing::Value(info)) => convert::arg_from_bridged(info, &call, mapper, client, bridges),
        Some(Crossing::Record { .. }) => {
            code.out(call);
            Ok(format!("{STRUCT_RESULT}.readValue()"))
        }
        None => Ok(call),
    }
}

/// Call managed code from native code.
///
/// `body` receives the managed argument expressions and returns the
/// managed result expression. Returns the native result expression.
pub fn native_to_managed<F>(
    bridges: &mut BridgeGenerator,
    mapper: &dyn DeclarationMapper,
    client: ClientId,
    return_type: &Type,
    values: &[TypedValue],
    body: F,
) -> Result<String>
where
    F: FnOnce(&mut ManagedCodeBuilder, &[String]) -> String,
{
    let kinds = crossings(mapper, values)?;
    let result_kind = return_crossing(mapper, return_type)?;

    let mut bridge_values: Vec<BridgeValue> = kinds
        .iter()
        .zip(values)
        .map(|(kind, v)| match kind {
            Crossing::Value(info) => BridgeValue::new(info.bridged_type(), convert::c_to_bridged(info, &v.expr)),
            Crossing::Record { .. } => BridgeValue::new(BridgedType::NativePtr, format!("(void*)&{}", v.expr)),
        })
        .collect();
    let bridged_return = match &result_kind {
        Some(Crossing::Value(info)) => info.bridged_type(),
        Some(Crossing::Record { .. }) => {
            bridge_values.push(BridgeValue::new(BridgedType::NativePtr, format!("(void*)&{STRUCT_RESULT}")));
            BridgedType::Void
        }
        None => BridgedType::Void,
    };

    let call = bridges.native_to_managed(client, bridged_return, &bridge_values, |bridges, code, names| {
        let mut arguments = Vec::with_capacity(names.len());
        for (kind, name) in kinds.iter().zip(names) {
            arguments.push(match kind {
                Crossing::Value(info) => convert::arg_from_bridged(info, name, mapper, client, bridges)?,
                Crossing::Record { pointed, .. } => {
                    format!("interpretPointed<{}>({name}).readValue()", pointed.render(code.scope()))
                }
            });
        }
        let result = body(code, &arguments);
        Ok(match &result_kind {
            Some(Crossing::Value(info)) => convert::arg_to_bridged(info, &result),
            Some(Crossing::Record { .. }) => {
                code.out(format!("{result}.write({})", names[values.len()]));
                String::new()
            }
            None => result,
        })
    })?;

    match &result_kind {
        Some(Crossing::Value(info)) => convert::c_from_bridged(info, &call, mapper, client, bridges),
        Some(Crossing::Record { c_type, .. }) => {
            Ok(format!("({{ {c_type} {STRUCT_RESULT}; {call}; {STRUCT_RESULT}; }})"))
        }
        None => Ok(call),
    }
}
