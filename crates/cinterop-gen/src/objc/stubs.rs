//! Stubs for Objective-C classes, protocols and categories.
//!
//! Stubs are built before the bridges are checked and rendered after, so
//! that methods whose bridges do not compile can fall back to a stub the
//! managed compiler rejects on use.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use serde::Serialize;

use cinterop_index::{
    Nullability, ObjCCategory, ObjCClass, ObjCContainer, ObjCMethod, ObjCPointerKind,
    ObjCProperty, ObjCProtocol, Type,
};
use cinterop_targets::Architecture;

use crate::bridge::{BridgeGenerator, BridgeSupport, ClientId};
use crate::code::ManagedCodeBuilder;
use crate::error::Result;
use crate::managed::{known, quote_literal, render_parameters, simple_name, ManagedParameter};
use crate::mapping::{self, TypedValue};
use crate::mirror::{container_class_name, managed_return_type, mirror, DeclarationMapper};

use super::hierarchy::{
    compose_methods, compose_properties, designated_initializer_selectors, is_override,
};
use super::params::{managed_name, parameter_names};
use super::stret::is_stret;

/// Rendered in place of a declaration whose bridges do not compile.
pub const UNABLE_TO_IMPORT: &str =
    "@Deprecated(\"Unable to import this declaration\", level = DeprecationLevel.ERROR)";

/// A method of a class, protocol or category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjCMethodStub {
    pub selector: String,
    pub encoding: String,
    pub managed_name: String,
    /// Rendered managed parameters.
    pub parameters: Vec<String>,
    pub return_type: String,
    pub is_class: bool,
    pub is_init: bool,
    pub is_optional: bool,
    pub is_override: bool,
    pub is_designated: bool,
    pub is_stret: bool,
    pub consumes_receiver: bool,
    pub returns_retained: bool,
    pub consumed_parameters: Vec<bool>,
    /// Managed expression sending the message through a bridge.
    pub bridge_call: Option<String>,
    #[serde(skip)]
    client: ClientId,
    #[serde(skip)]
    declaration: String,
    #[serde(skip)]
    is_external: bool,
    #[serde(skip)]
    body: Vec<String>,
    #[serde(skip)]
    annotations: Vec<String>,
    #[serde(skip)]
    deprecation: Option<String>,
    #[serde(skip)]
    init_lines: Vec<String>,
}

impl ObjCMethodStub {
    pub fn client(&self) -> ClientId {
        self.client
    }

    pub fn render(&self, support: &dyn BridgeSupport) -> Vec<String> {
        let external_header = if self.is_external {
            format!("external {}", self.declaration)
        } else {
            self.declaration.clone()
        };
        if !support.is_supported(self.client) {
            return vec![UNABLE_TO_IMPORT.to_string(), external_header];
        }

        let mut lines: Vec<String> = self.deprecation.iter().cloned().collect();
        lines.extend(self.annotations.iter().cloned());
        match &self.bridge_call {
            Some(_) => {
                lines.push(format!("{} {{", self.declaration));
                lines.extend(self.body.iter().map(|l| format!("    {l}")));
                lines.push("}".to_string());
            }
            None => lines.push(external_header),
        }
        lines.extend(self.init_lines.iter().cloned());
        lines
    }
}

/// A property whose accessors have method stubs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjCPropertyStub {
    pub name: String,
    pub managed_type: String,
    pub is_var: bool,
    pub getter: String,
    pub setter: Option<String>,
    #[serde(skip)]
    lines: Vec<String>,
}

impl ObjCPropertyStub {
    pub fn render(&self) -> Vec<String> {
        self.lines.clone()
    }
}

/// One managed class or interface: the instance or the meta half of a
/// container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjCTypeStub {
    pub name: String,
    pub is_meta: bool,
    pub header: String,
    pub properties: Vec<ObjCPropertyStub>,
    pub methods: Vec<ObjCMethodStub>,
    #[serde(skip)]
    is_class: bool,
    #[serde(skip)]
    companion: Option<String>,
}

impl ObjCTypeStub {
    pub fn render(&self, support: &dyn BridgeSupport) -> Vec<String> {
        let mut body: Vec<String> = self.companion.iter().cloned().collect();
        for property in &self.properties {
            body.push(String::new());
            body.extend(property.render());
        }
        for method in &self.methods {
            body.push(String::new());
            body.extend(method.render(support));
        }
        let has_default_init = self.methods.iter().any(|m| {
            m.is_init && m.parameters.is_empty() && support.is_supported(m.client)
        });
        if self.is_class && !has_default_init {
            body.push(String::new());
            body.push("protected constructor() {}".to_string());
        }
        block(&self.header, body)
    }
}

/// A class or protocol with its meta half.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjCContainerStub {
    pub name: String,
    pub is_protocol: bool,
    /// Native function returning the protocol object.
    pub protocol_getter: Option<String>,
    pub meta: ObjCTypeStub,
    pub instance: ObjCTypeStub,
    #[serde(skip)]
    getter_client: Option<ClientId>,
}

impl ObjCContainerStub {
    /// Meta half, then instance half. A protocol whose getter does not
    /// compile renders nothing.
    pub fn render(&self, support: &dyn BridgeSupport) -> Vec<String> {
        if self
            .getter_client
            .is_some_and(|client| !support.is_supported(client))
        {
            return Vec::new();
        }
        let mut lines = self.meta.render(support);
        lines.push(String::new());
        lines.extend(self.instance.render(support));
        lines
    }
}

/// Members an `@interface Cls (Name)` category adds to a class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjCCategoryStub {
    pub class: String,
    pub name: String,
    pub properties: Vec<ObjCPropertyStub>,
    pub methods: Vec<ObjCMethodStub>,
}

impl ObjCCategoryStub {
    pub fn render(&self, support: &dyn BridgeSupport) -> Vec<String> {
        let description = format!("{} ({})", self.class, self.name);
        let mut lines = vec![format!("// @interface {description}")];
        for property in &self.properties {
            lines.push(String::new());
            lines.extend(property.render());
        }
        for method in &self.methods {
            lines.push(String::new());
            lines.extend(method.render(support));
        }
        lines.push(format!("// @end; // {description}"));
        lines
    }
}

#[derive(Debug, Default)]
struct CategoryMembers {
    property_names: HashSet<String>,
    instance_selectors: HashSet<String>,
    class_selectors: HashSet<String>,
}

impl CategoryMembers {
    fn has_method(&self, method: &ObjCMethod) -> bool {
        let selectors = if method.is_class {
            &self.class_selectors
        } else {
            &self.instance_selectors
        };
        selectors.contains(&method.selector)
    }

    fn register_method(&mut self, method: &ObjCMethod) -> bool {
        let selectors = if method.is_class {
            &mut self.class_selectors
        } else {
            &mut self.instance_selectors
        };
        selectors.insert(method.selector.clone())
    }

    fn register_property(&mut self, property: &ObjCProperty) -> bool {
        self.property_names.insert(property.name.clone())
    }

    fn merge(&mut self, other: CategoryMembers) {
        self.property_names.extend(other.property_names);
        self.instance_selectors.extend(other.instance_selectors);
        self.class_selectors.extend(other.class_selectors);
    }
}

/// Members already generated by categories, per class. Two categories of
/// one class may declare the same selector; only the first is kept.
#[derive(Debug, Default)]
pub struct CategoryRegistry {
    classes: HashMap<String, CategoryMembers>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn members_of(&mut self, class: &ObjCClass) -> &mut CategoryMembers {
        self.classes.entry(class.name.clone()).or_default()
    }
}

#[derive(Clone, Copy)]
enum Owner<'c> {
    Class(&'c Rc<ObjCClass>),
    Protocol(&'c Rc<ObjCProtocol>),
    Category(&'c ObjCCategory),
}

impl Owner<'_> {
    /// The class or protocol the methods resolve `instancetype` against.
    fn container(&self) -> ObjCContainer {
        match self {
            Owner::Class(class) => ObjCContainer::Class((*class).clone()),
            Owner::Protocol(protocol) => ObjCContainer::Protocol((*protocol).clone()),
            Owner::Category(category) => ObjCContainer::Class(category.class.clone()),
        }
    }
}

/// Builds stubs for one declaration, registering its bridges.
pub struct ObjCStubBuilder<'a> {
    mapper: &'a dyn DeclarationMapper,
    bridges: &'a mut BridgeGenerator,
    architecture: Architecture,
    disable_designated_initializer_checks: bool,
    clients: Vec<ClientId>,
}

impl<'a> ObjCStubBuilder<'a> {
    pub fn new(
        mapper: &'a dyn DeclarationMapper,
        bridges: &'a mut BridgeGenerator,
        architecture: Architecture,
    ) -> Self {
        Self {
            mapper,
            bridges,
            architecture,
            disable_designated_initializer_checks: false,
            clients: Vec::new(),
        }
    }

    /// Treat every initializer as designated.
    pub fn disable_designated_initializer_checks(mut self, disable: bool) -> Self {
        self.disable_designated_initializer_checks = disable;
        self
    }

    /// Clients of every bridge registered so far.
    pub fn clients(&self) -> &[ClientId] {
        &self.clients
    }

    /// Drop every bridge registered by this builder.
    pub fn discard(self) {
        for client in self.clients {
            self.bridges.discard_client(client);
        }
    }

    fn new_client(&mut self) -> ClientId {
        let client = ClientId::new();
        self.clients.push(client);
        client
    }

    pub fn class_stub(&mut self, class: &Rc<ObjCClass>) -> Result<ObjCContainerStub> {
        let container = ObjCContainer::Class(class.clone());
        Ok(ObjCContainerStub {
            name: class.name.clone(),
            is_protocol: false,
            protocol_getter: None,
            meta: self.type_stub(&container, true, None)?,
            instance: self.type_stub(&container, false, None)?,
            getter_client: None,
        })
    }

    pub fn protocol_stub(&mut self, protocol: &Rc<ObjCProtocol>) -> Result<ObjCContainerStub> {
        let container = ObjCContainer::Protocol(protocol.clone());
        let (getter, client) = self.protocol_getter(protocol);
        Ok(ObjCContainerStub {
            name: protocol.name.clone(),
            is_protocol: true,
            meta: self.type_stub(&container, true, Some(&getter))?,
            instance: self.type_stub(&container, false, Some(&getter))?,
            protocol_getter: Some(getter),
            getter_client: Some(client),
        })
    }

    pub fn category_stub(
        &mut self,
        category: &ObjCCategory,
        registry: &mut CategoryRegistry,
    ) -> Result<ObjCCategoryStub> {
        let owner = Owner::Category(category);
        let members = registry.members_of(&category.class);

        // Registered only once the whole category has been generated.
        let mut added = CategoryMembers::default();
        let methods: Vec<&ObjCMethod> = category
            .methods
            .iter()
            .filter(|m| !members.has_method(m) && added.register_method(m))
            .collect();
        let properties: Vec<&ObjCProperty> = category
            .properties
            .iter()
            .filter(|p| !members.property_names.contains(&p.name) && added.register_property(p))
            .collect();

        let method_stubs = methods
            .into_iter()
            .map(|m| self.method_stub(m, owner, false))
            .collect::<Result<Vec<_>>>()?;
        let mut property_stubs = Vec::new();
        for property in properties {
            if let Some(stub) = self.property_stub(property, owner, &method_stubs)? {
                property_stubs.push(stub);
            }
        }

        registry.members_of(&category.class).merge(added);
        Ok(ObjCCategoryStub {
            class: category.class.name.clone(),
            name: category.name.clone(),
            properties: property_stubs,
            methods: method_stubs,
        })
    }

    /// `Protocol* sym() { return @protocol(Name); }`
    fn protocol_getter(&mut self, protocol: &ObjCProtocol) -> (String, ClientId) {
        let client = self.new_client();
        let symbol = self.bridges.fresh_symbol("kniprot");
        let lines = vec![
            format!("Protocol* {symbol}() {{"),
            format!("    return @protocol({});", protocol.name),
            "}".to_string(),
        ];
        self.bridges
            .insert_native_bridge(client, symbol.clone(), Vec::new(), lines);
        (symbol, client)
    }

    fn type_stub(
        &mut self,
        container: &ObjCContainer,
        is_meta: bool,
        protocol_getter: Option<&str>,
    ) -> Result<ObjCTypeStub> {
        let scope = self.mapper.package().to_string();
        let owner = match container {
            ObjCContainer::Class(class) => Owner::Class(class),
            ObjCContainer::Protocol(protocol) => Owner::Protocol(protocol),
        };

        let designated = match container {
            ObjCContainer::Class(class) if !is_meta => designated_initializer_selectors(class),
            _ => BTreeSet::new(),
        };
        let method_stubs = compose_methods(container, is_meta)
            .iter()
            .map(|m| self.method_stub(m, owner, designated.contains(&m.selector)))
            .collect::<Result<Vec<_>>>()?;
        let mut property_stubs = Vec::new();
        for property in compose_properties(container, is_meta) {
            if let Some(stub) = self.property_stub(&property, owner, &method_stubs)? {
                property_stubs.push(stub);
            }
        }

        let mut supers = Vec::new();
        if let ObjCContainer::Class(class) = container {
            supers.push(match &class.base_class {
                Some(base) => self
                    .mapper
                    .class_for_container(&ObjCContainer::Class(base.clone()), is_meta),
                None if is_meta => known::objc_object_base_meta(),
                None => known::objc_object_base(),
            });
        }
        for protocol in container.protocols() {
            supers.push(
                self.mapper
                    .class_for_container(&ObjCContainer::Protocol(protocol.clone()), is_meta),
            );
        }
        if supers.is_empty() {
            supers.push(if is_meta {
                known::objc_object_meta()
            } else {
                known::objc_object()
            });
        }
        let supers = supers
            .iter()
            .map(|s| s.ty().render(&scope))
            .collect::<Vec<_>>()
            .join(", ");

        let classifier = self.mapper.class_for_container(container, is_meta);
        let (keywords, annotation) = match container {
            ObjCContainer::Class(class) => (
                "open class",
                match &class.binary_name {
                    Some(binary) => format!("@ExternalObjCClass(\"\", {})", quote_literal(binary)),
                    None => "@ExternalObjCClass".to_string(),
                },
            ),
            ObjCContainer::Protocol(_) => (
                "interface",
                format!(
                    "@ExternalObjCClass({})",
                    quote_literal(protocol_getter.unwrap_or_default())
                ),
            ),
        };
        let header = format!(
            "{annotation} {keywords} {} : {supers}",
            classifier.relative_name
        );

        let is_class = matches!(container, ObjCContainer::Class(_));
        let companion = (is_class && !is_meta).then(|| {
            let meta = self.mapper.class_for_container(container, true).ty();
            let class_of = known::objc_class_of().type_with(vec![classifier.ty()]);
            format!(
                "companion object : {}(), {} {{}}",
                meta.render(&scope),
                class_of.render(&scope)
            )
        });

        Ok(ObjCTypeStub {
            name: classifier.relative_name.clone(),
            is_meta,
            header,
            properties: property_stubs,
            methods: method_stubs,
            is_class,
            companion,
        })
    }

    fn managed_parameters(
        &self,
        method: &ObjCMethod,
        names: &[String],
    ) -> Result<Vec<ManagedParameter>> {
        let mut result = Vec::with_capacity(names.len());
        for (parameter, name) in method.parameters.iter().zip(names) {
            let mut managed = ManagedParameter::new(
                name.clone(),
                mirror(self.mapper, &parameter.ty)?.arg_type(),
            );
            if parameter.ns_consumed {
                managed.annotations.push("@CCall.Consumed".to_string());
            }
            result.push(managed);
        }
        if method.is_variadic {
            if let Some(name) = names.last() {
                let mut vararg = ManagedParameter::new(name.clone(), known::any().make_nullable());
                vararg.is_vararg = true;
                result.push(vararg);
            }
        }
        Ok(result)
    }

    fn method_stub(
        &mut self,
        method: &ObjCMethod,
        owner: Owner<'_>,
        is_designated: bool,
    ) -> Result<ObjCMethodStub> {
        let scope = self.mapper.package().to_string();
        let container = owner.container();
        let client = self.new_client();

        let names = parameter_names(method, false);
        let parameters = self.managed_parameters(method, &names)?;
        let return_type = method.return_type_for(&container);
        let is_stret = is_stret(&return_type, self.architecture)?;
        let managed_return = managed_return_type(self.mapper, &return_type)?.render(&scope);

        let is_override = match owner {
            Owner::Class(_) | Owner::Protocol(_) => is_override(method, &container),
            Owner::Category(_) => false,
        };
        let modality = match owner {
            Owner::Class(_) if is_override => "override ",
            Owner::Class(_) => "open ",
            Owner::Protocol(_) if is_override => "override ",
            Owner::Protocol(_) | Owner::Category(_) => "",
        };
        let receiver = match owner {
            Owner::Category(category) => format!(
                "{}.",
                self.mapper
                    .class_for_container(&ObjCContainer::Class(category.class.clone()), method.is_class)
                    .ty()
                    .render(&scope)
            ),
            _ => String::new(),
        };
        let optional = match owner {
            Owner::Protocol(_) if method.is_optional => " = optional()",
            _ => "",
        };
        let declaration = format!(
            "{modality}fun {receiver}{}({}): {managed_return}{optional}",
            simple_name(&managed_name(method)),
            render_parameters(&parameters, &scope),
        );

        let (bridge_call, body) = if self.is_bridgeable(method, owner, &return_type)? {
            let (call, body) = self.message_send(method, client, &return_type, &names)?;
            (Some(call), body)
        } else {
            (None, Vec::new())
        };

        let mut deprecation = None;
        let mut init_lines = Vec::new();
        if method.is_init {
            let constructor_names = parameter_names(method, true);
            let constructor_parameters = render_parameters(
                &self.managed_parameters(method, &constructor_names)?,
                &scope,
            );
            match owner {
                Owner::Class(_) => {
                    deprecation = Some(deprecated_init(
                        &container_class_name(&container, method.is_class),
                        &names,
                        false,
                    ));
                    let designated = is_designated || self.disable_designated_initializer_checks;
                    init_lines.push(String::new());
                    init_lines.push(format!(
                        "@ObjCConstructor({}, {designated})",
                        quote_literal(&method.selector)
                    ));
                    init_lines.push(format!("constructor({constructor_parameters}) {{}}"));
                }
                Owner::Category(category) => {
                    let class_name = self
                        .mapper
                        .class_for_container(&ObjCContainer::Class(category.class.clone()), false)
                        .ty()
                        .render(&scope);
                    deprecation = Some(deprecated_init(&class_name, &names, true));
                    let factory_return = match &return_type {
                        Type::ObjCPointer(p) if p.nullability == Nullability::NonNull => "T".to_string(),
                        Type::ObjCPointer(_) => "T?".to_string(),
                        _ => managed_return.clone(),
                    };
                    init_lines.push(String::new());
                    init_lines.extend(method_annotations(method, is_stret, "@ObjCFactory"));
                    init_lines.push(format!(
                        "external fun <T : {class_name}> {}<T>.create({constructor_parameters}): {factory_return}",
                        known::objc_class_of().render(&scope)
                    ));
                }
                Owner::Protocol(_) => {}
            }
        }

        Ok(ObjCMethodStub {
            selector: method.selector.clone(),
            encoding: method.encoding.clone(),
            managed_name: managed_name(method),
            parameters: parameters.iter().map(|p| p.render(&scope)).collect(),
            return_type: managed_return,
            is_class: method.is_class,
            is_init: method.is_init,
            is_optional: method.is_optional,
            is_override,
            is_designated,
            is_stret,
            consumes_receiver: method.ns_consumes_self,
            returns_retained: method.ns_returns_retained,
            consumed_parameters: method.parameters.iter().map(|p| p.ns_consumed).collect(),
            bridge_call,
            client,
            declaration,
            is_external: !matches!(owner, Owner::Protocol(_)),
            body,
            annotations: method_annotations(method, is_stret, "@ObjCMethod"),
            deprecation,
            init_lines,
        })
    }

    /// Methods of classes and categories whose values can all be passed
    /// through a bridge.
    fn is_bridgeable(&self, method: &ObjCMethod, owner: Owner<'_>, return_type: &Type) -> Result<bool> {
        if matches!(owner, Owner::Protocol(_)) || method.is_variadic || method.is_init {
            return Ok(false);
        }
        if !return_type.is_void() && !mapping::crosses_bridge(self.mapper, return_type)? {
            return Ok(false);
        }
        for parameter in &method.parameters {
            if !mapping::crosses_bridge(self.mapper, &parameter.ty)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Bridge sending `method` to `this`; returns the managed call and the
    /// managed method body.
    fn message_send(
        &mut self,
        method: &ObjCMethod,
        client: ClientId,
        return_type: &Type,
        names: &[String],
    ) -> Result<(String, Vec<String>)> {
        let receiver = Type::objc(
            ObjCPointerKind::Id {
                protocols: Vec::new(),
            },
            Nullability::NonNull,
        );
        let mut values = vec![TypedValue::new(receiver, "this")];
        values.extend(
            method
                .parameters
                .iter()
                .zip(names)
                .map(|(p, name)| TypedValue::new(p.ty.clone(), simple_name(name))),
        );
        let keywords: Vec<&str> = method.selector.split(':').collect();
        let mut code = ManagedCodeBuilder::new(self.mapper.package());
        let call = mapping::managed_to_native(
            self.bridges,
            self.mapper,
            &mut code,
            client,
            return_type,
            &values,
            false,
            |args| {
                let receiver = &args[0];
                let arguments = &args[1..];
                if arguments.is_empty() {
                    format!("[{receiver} {}]", method.selector)
                } else {
                    let parts: Vec<String> = keywords
                        .iter()
                        .zip(arguments)
                        .map(|(keyword, arg)| format!("{keyword}:{arg}"))
                        .collect();
                    format!("[{receiver} {}]", parts.join(" "))
                }
            },
        )?;
        if return_type.is_void() {
            code.out(call.clone());
        } else {
            code.return_result(&call);
        }
        Ok((call, code.into_lines()))
    }

    fn property_stub(
        &self,
        property: &ObjCProperty,
        owner: Owner<'_>,
        method_stubs: &[ObjCMethodStub],
    ) -> Result<Option<ObjCPropertyStub>> {
        let find = |accessor: &ObjCMethod| {
            method_stubs
                .iter()
                .find(|s| s.selector == accessor.selector && s.is_class == accessor.is_class)
        };
        let Some(getter) = find(&property.getter) else {
            return Ok(None);
        };
        let setter = match &property.setter {
            Some(setter) => match find(setter) {
                Some(stub) => Some(stub),
                None => return Ok(None),
            },
            None => None,
        };

        let scope = self.mapper.package();
        let container = owner.container();
        let managed_type = mirror(self.mapper, &property.type_for(&container))?
            .arg_type()
            .render(scope);
        let kind = if setter.is_some() { "var" } else { "val" };
        let modifiers = match owner {
            Owner::Protocol(_) => "final ",
            _ => "",
        };
        let receiver = match owner {
            Owner::Category(category) => format!(
                "{}.",
                self.mapper
                    .class_for_container(
                        &ObjCContainer::Class(category.class.clone()),
                        property.getter.is_class
                    )
                    .ty()
                    .render(scope)
            ),
            _ => String::new(),
        };

        let mut lines = vec![
            format!(
                "{modifiers}{kind} {receiver}{}: {managed_type}",
                simple_name(&property.name)
            ),
            format!("    {} external get", getter.annotations.join(" ")),
        ];
        if let Some(setter) = setter {
            lines.push(format!("    {} external set", setter.annotations.join(" ")));
        }

        Ok(Some(ObjCPropertyStub {
            name: property.name.clone(),
            managed_type,
            is_var: setter.is_some(),
            getter: getter.selector.clone(),
            setter: setter.map(|s| s.selector.clone()),
            lines,
        }))
    }
}

fn method_annotations(method: &ObjCMethod, is_stret: bool, main: &str) -> Vec<String> {
    let stret = if is_stret { ", true" } else { "" };
    let mut annotations = vec![format!(
        "{main}({}, {}{stret})",
        quote_literal(&method.selector),
        quote_literal(&method.encoding)
    )];
    if method.ns_consumes_self {
        annotations.push("@CCall.ConsumesReceiver".to_string());
    }
    if method.ns_returns_retained {
        annotations.push("@CCall.ReturnsRetained".to_string());
    }
    annotations
}

fn deprecated_init(class_name: &str, parameter_names: &[String], factory: bool) -> String {
    let (replacement, kind) = if factory {
        (format!("{class_name}.create"), "factory method")
    } else {
        (class_name.to_string(), "constructor")
    };
    let arguments: Vec<String> = parameter_names.iter().map(|n| simple_name(n)).collect();
    let replace_with = format!("{replacement}({})", arguments.join(", "));
    format!(
        "@Deprecated({}, ReplaceWith({}), DeprecationLevel.ERROR)",
        quote_literal(&format!("Use {kind} instead")),
        quote_literal(&replace_with)
    )
}

fn block(header: &str, body: Vec<String>) -> Vec<String> {
    let mut lines = Vec::with_capacity(body.len() + 2);
    lines.push(format!("{header} {{"));
    lines.extend(body.into_iter().map(|line| {
        if line.is_empty() {
            line
        } else {
            format!("    {line}")
        }
    }));
    lines.push("}".to_string());
    lines
}
