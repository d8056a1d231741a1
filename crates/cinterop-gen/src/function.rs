//! Managed declarations of C functions and global variables.
//!
//! Plain functions are called through a managed-to-native bridge. Functions
//! without a linkable address, and every global, are reached directly
//! through a C callee wrapper bound to a fresh symbol. Variadic functions
//! of a native host are called through their address.
//!
//! `const char*` parameters take managed strings, as do parameters typed
//! with a platform wide-string alias. Other pointer and array parameters
//! take any `CValuesRef`, which is pinned for the duration of the call.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use cinterop_index::{FunctionDecl, GlobalDecl, Type};

use crate::bridge::{BridgeGenerator, BridgeSupport, ClientId};
use crate::code::ManagedCodeBuilder;
use crate::config::ManagedPlatform;
use crate::error::{GenError, Result};
use crate::managed::{known, quote_literal, render_parameters, simple_name, ManagedParameter, ManagedType};
use crate::mapping::{self, TypedValue};
use crate::mirror::{managed_return_type, mirror, DeclarationMapper, TypeMirror};
use crate::objc::UNABLE_TO_IMPORT;
use crate::wrapper::{CCalleeWrapper, CWrappersGenerator};

/// Typedefs whose parameters are passed as wide strings.
const PLATFORM_WSTRING_TYPES: &[&str] = &["LPCWSTR"];

/// How a function stub reaches its native counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum FunctionCall {
    /// Through a bridge; the managed body evaluates `expression`.
    Bridge { expression: String },
    /// Directly, through the wrapper exported as `symbol`.
    Direct { symbol: String },
    /// Directly, through the function address exported as `symbol`.
    Variadic { symbol: String },
}

/// A top-level managed function standing for a C function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionStub {
    pub name: String,
    pub parameters: Vec<String>,
    pub return_type: String,
    pub call: FunctionCall,
    #[serde(skip)]
    client: ClientId,
    #[serde(skip)]
    header: String,
    #[serde(skip)]
    body: Vec<String>,
}

impl FunctionStub {
    pub fn client(&self) -> ClientId {
        self.client
    }

    pub fn render(&self, support: &dyn BridgeSupport) -> Vec<String> {
        match &self.call {
            FunctionCall::Direct { symbol } => self.external(symbol),
            _ if !support.is_supported(self.client) => vec![
                UNABLE_TO_IMPORT.to_string(),
                format!("{} = throw UnsupportedOperationException()", self.header),
            ],
            FunctionCall::Variadic { symbol } => self.external(symbol),
            FunctionCall::Bridge { .. } => {
                let mut lines = vec![format!("{} {{", self.header)];
                lines.extend(self.body.iter().map(|l| format!("    {l}")));
                lines.push("}".to_string());
                lines
            }
        }
    }

    fn external(&self, symbol: &str) -> Vec<String> {
        vec![
            format!("@CCall({})", quote_literal(symbol)),
            format!("external {}", self.header),
        ]
    }
}

/// A top-level managed property standing for a C global.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalStub {
    pub name: String,
    pub managed_type: String,
    pub getter: String,
    pub setter: Option<String>,
}

impl GlobalStub {
    pub fn render(&self) -> Vec<String> {
        let kind = if self.setter.is_some() { "var" } else { "val" };
        let mut lines = vec![
            format!("{kind} {}: {}", simple_name(&self.name), self.managed_type),
            format!("    @CCall({}) external get", quote_literal(&self.getter)),
        ];
        if let Some(setter) = &self.setter {
            lines.push(format!("    @CCall({}) external set", quote_literal(setter)));
        }
        lines
    }
}

/// Managed shape of one C function parameter.
#[derive(Debug, Clone, PartialEq)]
enum ParameterKind {
    CString,
    WString,
    ValuesRef(ManagedType),
    Plain,
}

/// Builds function and global stubs, registering bridges and wrappers.
pub struct FunctionStubBuilder<'a> {
    mapper: &'a dyn DeclarationMapper,
    bridges: &'a mut BridgeGenerator,
    wrappers: &'a mut CWrappersGenerator,
    no_string_conversion: BTreeSet<String>,
    wrapper_lines: Vec<String>,
}

impl<'a> FunctionStubBuilder<'a> {
    pub fn new(
        mapper: &'a dyn DeclarationMapper,
        bridges: &'a mut BridgeGenerator,
        wrappers: &'a mut CWrappersGenerator,
    ) -> Self {
        Self {
            mapper,
            bridges,
            wrappers,
            no_string_conversion: BTreeSet::new(),
            wrapper_lines: Vec::new(),
        }
    }

    /// Functions whose `const char*` and wide-string parameters stay pointers.
    pub fn no_string_conversion(mut self, functions: BTreeSet<String>) -> Self {
        self.no_string_conversion = functions;
        self
    }

    /// Native lines of the wrappers produced so far.
    pub fn into_wrapper_lines(self) -> Vec<String> {
        self.wrapper_lines
    }

    /// Drop the bridges of a declaration that failed half-way.
    pub fn discard_client(&mut self, client: ClientId) {
        self.bridges.discard_client(client);
    }

    fn keep(&mut self, wrapper: CCalleeWrapper) {
        self.wrapper_lines.extend(wrapper.lines);
    }

    fn parameter_kind(&self, function: &FunctionDecl, ty: &Type) -> Result<ParameterKind> {
        let converts_strings = !self.no_string_conversion.contains(&function.name);
        if converts_strings && is_c_string(ty) {
            return Ok(ParameterKind::CString);
        }
        if converts_strings && is_alias_of(ty, PLATFORM_WSTRING_TYPES) {
            return Ok(ParameterKind::WString);
        }
        Ok(match self.values_ref_type(ty)? {
            Some(values_ref) => ParameterKind::ValuesRef(values_ref),
            None => ParameterKind::Plain,
        })
    }

    /// `CValuesRef<T>?` for pointers and arrays other than function pointers.
    fn values_ref_type(&self, ty: &Type) -> Result<Option<ManagedType>> {
        let pointee = match ty {
            Type::Pointer { pointee, .. } => pointee.as_ref(),
            Type::ConstArray { element, .. } | Type::IncompleteArray { element } => element.as_ref(),
            _ => return Ok(None),
        };
        match pointee.unwrap_typedefs() {
            Type::Void => Ok(Some(known::c_values_ref_of_star().make_nullable())),
            Type::Function { .. } => Ok(None),
            array @ (Type::ConstArray { .. } | Type::IncompleteArray { .. }) => self.values_ref_type(array),
            _ => {
                let pointed = mirror(self.mapper, pointee)?.pointed_type().clone();
                Ok(Some(known::c_values_ref(pointed).make_nullable()))
            }
        }
    }

    /// Stub of `function`, or `None` when it cannot be reached.
    pub fn function_stub(
        &mut self,
        function: &FunctionDecl,
        client: ClientId,
    ) -> Result<Option<FunctionStub>> {
        let scope = self.mapper.package().to_string();
        let native_host = self.bridges.platform() == ManagedPlatform::Native;
        let mut code = ManagedCodeBuilder::new(scope.clone());
        let mut parameters = Vec::with_capacity(function.parameters.len());
        let mut values = Vec::with_capacity(function.parameters.len());
        for (i, parameter) in function.parameters.iter().enumerate() {
            let raw_name = if parameter.name.is_empty() {
                format!("arg{i}")
            } else {
                parameter.name.clone()
            };
            let name = simple_name(&raw_name);
            let (managed, annotation, argument) = match self.parameter_kind(function, &parameter.ty)? {
                ParameterKind::CString => {
                    code.push_mem_scoped();
                    let argument = format!("{name}?.cstr?.getPointer(memScope)");
                    (known::string().make_nullable(), Some("@CCall.CString"), argument)
                }
                ParameterKind::WString => {
                    code.push_mem_scoped();
                    let argument = format!("{name}?.wcstr?.getPointer(memScope)");
                    (known::string().make_nullable(), Some("@CCall.WCString"), argument)
                }
                ParameterKind::ValuesRef(values_ref) => {
                    let argument = code.native_pointer(&name);
                    (values_ref, None, argument)
                }
                ParameterKind::Plain => (mirror(self.mapper, &parameter.ty)?.arg_type(), None, name.clone()),
            };
            let mut managed_parameter = ManagedParameter::new(raw_name, managed);
            if native_host {
                managed_parameter.annotations.extend(annotation.map(str::to_string));
            }
            parameters.push(managed_parameter);
            values.push(TypedValue::new(parameter.ty.clone(), argument));
        }
        let return_type = managed_return_type(self.mapper, &function.return_type)?.render(&scope);

        let call = if function.requires_wrapper {
            let symbol = self.bridges.fresh_symbol(&function.name);
            let wrapper = self.wrappers.function_wrapper(function, &symbol);
            if wrapper.is_empty() {
                return Ok(None);
            }
            self.keep(wrapper);
            FunctionCall::Direct { symbol }
        } else if function.is_variadic {
            if !native_host {
                debug!(function = %function.name, "variadic function is not bridged to a JVM host");
                return Ok(None);
            }
            let symbol = self.bridges.fresh_symbol("knifunptr");
            self.bridges.insert_native_bridge(
                client,
                symbol.clone(),
                Vec::new(),
                vec![
                    format!("extern const void* {symbol} __asm({});", quote_literal(&symbol)),
                    format!("extern const void* {symbol} = &{};", function.name),
                ],
            );
            let mut variadic = ManagedParameter::new("variadicArguments", known::any().make_nullable());
            variadic.is_vararg = true;
            parameters.push(variadic);
            FunctionCall::Variadic { symbol }
        } else {
            let name = function.name.clone();
            let expression = mapping::managed_to_native(
                self.bridges,
                self.mapper,
                &mut code,
                client,
                &function.return_type,
                &values,
                false,
                |args| format!("{name}({})", args.join(", ")),
            )?;
            if function.return_type.is_void() {
                code.out(expression.clone());
            } else {
                code.return_result(&expression);
            }
            FunctionCall::Bridge { expression }
        };

        let body = if matches!(call, FunctionCall::Bridge { .. }) {
            code.into_lines()
        } else {
            Vec::new()
        };
        let header = format!(
            "fun {}({}): {return_type}",
            simple_name(&function.name),
            render_parameters(&parameters, &scope)
        );
        Ok(Some(FunctionStub {
            name: function.name.clone(),
            parameters: parameters.iter().map(|p| p.render(&scope)).collect(),
            return_type,
            call,
            client,
            header,
            body,
        }))
    }

    /// Stub of `global`; const globals get no setter.
    pub fn global_stub(&mut self, global: &GlobalDecl) -> Result<GlobalStub> {
        let mirror = mirror(self.mapper, &global.ty)?;
        if let TypeMirror::ByRef { .. } = mirror {
            return Err(GenError::unmappable(format!(
                "global '{}' of type '{}' is only accessible by reference",
                global.name,
                global.ty.c_spelling()
            )));
        }
        let managed_type = mirror.arg_type().render(self.mapper.package());

        let getter = self.bridges.fresh_symbol(&format!("{}_getter", global.name));
        let wrapper = self.wrappers.global_getter(global, &getter);
        self.keep(wrapper);

        let setter = if global.is_const {
            None
        } else {
            let setter = self.bridges.fresh_symbol(&format!("{}_setter", global.name));
            let wrapper = self.wrappers.global_setter(global, &setter);
            self.keep(wrapper);
            Some(setter)
        };

        Ok(GlobalStub {
            name: global.name.clone(),
            managed_type,
            getter,
            setter,
        })
    }
}

/// `const char*`, possibly behind typedefs.
fn is_c_string(ty: &Type) -> bool {
    match ty.unwrap_typedefs() {
        Type::Pointer {
            pointee,
            pointee_is_const: true,
        } => matches!(pointee.unwrap_typedefs(), Type::Char),
        _ => false,
    }
}

fn is_alias_of(ty: &Type, names: &[&str]) -> bool {
    let mut ty = ty;
    while let Type::Typedef(def) = ty {
        if names.contains(&def.name.as_str()) {
            return true;
        }
        ty = &def.aliased;
    }
    false
}
