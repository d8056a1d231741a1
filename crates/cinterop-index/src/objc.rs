//! Objective-C classes, protocols, categories and their members.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{IndexError, Result};
use crate::functions::Parameter;
use crate::types::{ObjCPointerKind, Type};

/// An Objective-C method declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjCMethod {
    pub selector: String,
    /// Type encoding string as produced by `@encode`.
    pub encoding: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Type,
    pub is_variadic: bool,
    /// Class (`+`) method rather than instance (`-`) method.
    pub is_class: bool,
    pub ns_consumes_self: bool,
    pub ns_returns_retained: bool,
    /// Declared in an `@optional` protocol section.
    pub is_optional: bool,
    pub is_init: bool,
    pub is_explicitly_designated_initializer: bool,
}

impl ObjCMethod {
    /// A plain instance method; the selector's method family decides
    /// `is_init`.
    pub fn new(
        selector: impl Into<String>,
        encoding: impl Into<String>,
        parameters: Vec<Parameter>,
        return_type: Type,
    ) -> Self {
        let selector = selector.into();
        let is_init = is_init_family(&selector);
        Self {
            selector,
            encoding: encoding.into(),
            parameters,
            return_type,
            is_variadic: false,
            is_class: false,
            ns_consumes_self: false,
            ns_returns_retained: false,
            is_optional: false,
            is_init,
            is_explicitly_designated_initializer: false,
        }
    }

    /// Whether this method redeclares `other` (same selector, same level).
    pub fn replaces(&self, other: &ObjCMethod) -> bool {
        self.is_class == other.is_class && self.selector == other.selector
    }

    pub fn returns_instancetype(&self) -> bool {
        matches!(
            &self.return_type,
            Type::ObjCPointer(p) if matches!(p.kind, ObjCPointerKind::InstanceType)
        )
    }

    /// Return type with `instancetype` replaced by a pointer to `class`.
    pub fn return_type_for(&self, class: &ObjCContainer) -> Type {
        substitute_instancetype(&self.return_type, class)
    }
}

/// `init`, `initWithX:`, `_init`; not `initialize`.
fn is_init_family(selector: &str) -> bool {
    selector
        .trim_start_matches('_')
        .strip_prefix("init")
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_ascii_lowercase()))
}

/// Replace `instancetype` by the concrete receiver type, keeping nullability.
pub fn substitute_instancetype(ty: &Type, container: &ObjCContainer) -> Type {
    let Type::ObjCPointer(pointer) = ty else {
        return ty.clone();
    };
    if !matches!(pointer.kind, ObjCPointerKind::InstanceType) {
        return ty.clone();
    }
    let kind = match container {
        ObjCContainer::Class(class) => ObjCPointerKind::Object {
            class: class.clone(),
            protocols: Vec::new(),
        },
        ObjCContainer::Protocol(protocol) => ObjCPointerKind::Id {
            protocols: vec![protocol.clone()],
        },
    };
    Type::objc(kind, pointer.nullability)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjCProperty {
    pub name: String,
    pub getter: ObjCMethod,
    pub setter: Option<ObjCMethod>,
}

impl ObjCProperty {
    pub fn type_for(&self, container: &ObjCContainer) -> Type {
        self.getter.return_type_for(container)
    }
}

/// Methods and properties of a class or protocol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjCMembers {
    pub methods: Vec<ObjCMethod>,
    pub properties: Vec<ObjCProperty>,
}

pub struct ObjCClass {
    pub name: String,
    /// Runtime name when it differs from `name`.
    pub binary_name: Option<String>,
    pub is_forward_declaration: bool,
    pub base_class: Option<Rc<ObjCClass>>,
    pub protocols: Vec<Rc<ObjCProtocol>>,
    members: OnceCell<ObjCMembers>,
}

impl ObjCClass {
    pub fn new(
        name: impl Into<String>,
        base_class: Option<Rc<ObjCClass>>,
        protocols: Vec<Rc<ObjCProtocol>>,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            binary_name: None,
            is_forward_declaration: false,
            base_class,
            protocols,
            members: OnceCell::new(),
        })
    }

    /// A class whose runtime name differs from its source name.
    pub fn with_binary_name(
        name: impl Into<String>,
        binary_name: impl Into<String>,
        base_class: Option<Rc<ObjCClass>>,
        protocols: Vec<Rc<ObjCProtocol>>,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            binary_name: Some(binary_name.into()),
            is_forward_declaration: false,
            base_class,
            protocols,
            members: OnceCell::new(),
        })
    }

    /// A `@class Name;` forward declaration.
    pub fn forward(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            binary_name: None,
            is_forward_declaration: true,
            base_class: None,
            protocols: Vec::new(),
            members: OnceCell::new(),
        })
    }

    pub fn with_members(
        name: impl Into<String>,
        base_class: Option<Rc<ObjCClass>>,
        protocols: Vec<Rc<ObjCProtocol>>,
        members: ObjCMembers,
    ) -> Rc<Self> {
        let class = Self::new(name, base_class, protocols);
        let _ = class.members.set(members);
        class
    }

    /// Attach the `@interface` body.
    pub fn define(&self, members: ObjCMembers) -> Result<()> {
        self.members.set(members).map_err(|_| IndexError::AlreadyDefined {
            name: self.name.clone(),
        })
    }

    pub fn methods(&self) -> &[ObjCMethod] {
        self.members.get().map(|m| m.methods.as_slice()).unwrap_or_default()
    }

    pub fn properties(&self) -> &[ObjCProperty] {
        self.members.get().map(|m| m.properties.as_slice()).unwrap_or_default()
    }

    /// `NSString`, `NSMutableString` or any class derived from them.
    pub fn is_string_or_subclass(&self) -> bool {
        match self.name.as_str() {
            "NSString" | "NSMutableString" => true,
            _ => self
                .base_class
                .as_ref()
                .is_some_and(|base| base.is_string_or_subclass()),
        }
    }

    /// A proper subclass of a string class.
    pub fn is_string_subclass(&self) -> bool {
        self.base_class
            .as_ref()
            .is_some_and(|base| base.is_string_or_subclass())
    }
}

impl PartialEq for ObjCClass {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for ObjCClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjCClass").field("name", &self.name).finish()
    }
}

pub struct ObjCProtocol {
    pub name: String,
    pub is_forward_declaration: bool,
    pub protocols: Vec<Rc<ObjCProtocol>>,
    members: OnceCell<ObjCMembers>,
}

impl ObjCProtocol {
    pub fn new(name: impl Into<String>, protocols: Vec<Rc<ObjCProtocol>>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            is_forward_declaration: false,
            protocols,
            members: OnceCell::new(),
        })
    }

    pub fn forward(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            is_forward_declaration: true,
            protocols: Vec::new(),
            members: OnceCell::new(),
        })
    }

    pub fn with_members(
        name: impl Into<String>,
        protocols: Vec<Rc<ObjCProtocol>>,
        members: ObjCMembers,
    ) -> Rc<Self> {
        let protocol = Self::new(name, protocols);
        let _ = protocol.members.set(members);
        protocol
    }

    /// Attach the `@protocol` body.
    pub fn define(&self, members: ObjCMembers) -> Result<()> {
        self.members.set(members).map_err(|_| IndexError::AlreadyDefined {
            name: self.name.clone(),
        })
    }

    pub fn methods(&self) -> &[ObjCMethod] {
        self.members.get().map(|m| m.methods.as_slice()).unwrap_or_default()
    }

    pub fn properties(&self) -> &[ObjCProperty] {
        self.members.get().map(|m| m.properties.as_slice()).unwrap_or_default()
    }
}

impl PartialEq for ObjCProtocol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for ObjCProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjCProtocol")
            .field("name", &self.name)
            .finish()
    }
}

/// A class or a protocol: the containers that take part in inheritance.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjCContainer {
    Class(Rc<ObjCClass>),
    Protocol(Rc<ObjCProtocol>),
}

impl ObjCContainer {
    pub fn name(&self) -> &str {
        match self {
            ObjCContainer::Class(c) => &c.name,
            ObjCContainer::Protocol(p) => &p.name,
        }
    }

    pub fn is_forward_declaration(&self) -> bool {
        match self {
            ObjCContainer::Class(c) => c.is_forward_declaration,
            ObjCContainer::Protocol(p) => p.is_forward_declaration,
        }
    }

    pub fn methods(&self) -> &[ObjCMethod] {
        match self {
            ObjCContainer::Class(c) => c.methods(),
            ObjCContainer::Protocol(p) => p.methods(),
        }
    }

    pub fn properties(&self) -> &[ObjCProperty] {
        match self {
            ObjCContainer::Class(c) => c.properties(),
            ObjCContainer::Protocol(p) => p.properties(),
        }
    }

    pub fn protocols(&self) -> &[Rc<ObjCProtocol>] {
        match self {
            ObjCContainer::Class(c) => &c.protocols,
            ObjCContainer::Protocol(p) => &p.protocols,
        }
    }

    /// Base class first (for classes), then adopted protocols.
    pub fn immediate_super_types(&self) -> Vec<ObjCContainer> {
        let mut result = Vec::new();
        if let ObjCContainer::Class(class) = self {
            if let Some(base) = &class.base_class {
                result.push(ObjCContainer::Class(base.clone()));
            }
        }
        result.extend(
            self.protocols()
                .iter()
                .map(|p| ObjCContainer::Protocol(p.clone())),
        );
        result
    }

    pub fn as_class(&self) -> Option<&Rc<ObjCClass>> {
        match self {
            ObjCContainer::Class(c) => Some(c),
            ObjCContainer::Protocol(_) => None,
        }
    }
}

/// An `@interface Cls (Name)` category.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjCCategory {
    pub name: String,
    pub class: Rc<ObjCClass>,
    pub methods: Vec<ObjCMethod>,
    pub properties: Vec<ObjCProperty>,
}
