//! Method sets of Objective-C classes and protocols.
//!
//! Objective-C lets a container redeclare, inherit and adopt methods
//! freely. The managed side needs each container to declare exactly the
//! methods its own class has to spell out: redeclarations that differ from
//! the inherited ones, inherited methods returning the receiver type,
//! initializers, required protocol methods, and methods inherited from more
//! than one supertype.

use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;

use cinterop_index::{ObjCClass, ObjCContainer, ObjCMethod, ObjCProperty, ObjCProtocol};

/// Adopted protocols with their inherited protocols, depth first.
pub fn protocols_with_supers(container: &ObjCContainer) -> Vec<Rc<ObjCProtocol>> {
    let mut result = Vec::new();
    for protocol in container.protocols() {
        result.push(protocol.clone());
        result.extend(protocols_with_supers(&ObjCContainer::Protocol(protocol.clone())));
    }
    result
}

/// All transitive supertypes, each once, nearest first.
pub fn super_types(container: &ObjCContainer) -> Vec<ObjCContainer> {
    let mut result: Vec<ObjCContainer> = Vec::new();
    for immediate in container.immediate_super_types() {
        let mut candidates = vec![immediate.clone()];
        candidates.extend(super_types(&immediate));
        for candidate in candidates {
            if !result.contains(&candidate) {
                result.push(candidate);
            }
        }
    }
    result
}

/// Methods declared by the container itself at one level.
pub fn declared_methods(container: &ObjCContainer, is_class: bool) -> Vec<ObjCMethod> {
    container
        .methods()
        .iter()
        .filter(|m| m.is_class == is_class)
        .cloned()
        .collect()
}

fn distinct_by_selector(methods: Vec<ObjCMethod>) -> Vec<ObjCMethod> {
    let mut seen = HashSet::new();
    methods
        .into_iter()
        .filter(|m| seen.insert(m.selector.clone()))
        .collect()
}

/// Methods reaching the container from its supertypes, one per selector.
pub fn inherited_methods(container: &ObjCContainer, is_class: bool) -> Vec<ObjCMethod> {
    let methods = container
        .immediate_super_types()
        .iter()
        .flat_map(|s| methods_with_inherited(s, is_class))
        .collect();
    distinct_by_selector(methods)
}

/// Declared methods followed by inherited ones, one per selector.
pub fn methods_with_inherited(container: &ObjCContainer, is_class: bool) -> Vec<ObjCMethod> {
    let mut methods = declared_methods(container, is_class);
    methods.extend(inherited_methods(container, is_class));
    distinct_by_selector(methods)
}

/// Whether a supertype declares a method with the same selector and level.
pub fn is_override(method: &ObjCMethod, container: &ObjCContainer) -> bool {
    super_types(container)
        .iter()
        .any(|s| s.methods().iter().any(|m| method.replaces(m)))
}

/// The methods the managed class of `container` has to declare.
pub fn compose_methods(container: &ObjCContainer, is_meta: bool) -> Vec<ObjCMethod> {
    let super_methods = inherited_methods(container, is_meta);

    let mut methods = declared_methods(container, is_meta);
    methods.retain(|m| !super_methods.contains(m));

    methods.extend(
        super_methods
            .iter()
            .filter(|m| m.returns_instancetype() || m.is_init)
            .cloned(),
    );

    if let ObjCContainer::Class(_) = container {
        for protocol in protocols_with_supers(container) {
            methods.extend(
                declared_methods(&ObjCContainer::Protocol(protocol), is_meta)
                    .into_iter()
                    .filter(|m| !m.is_optional),
            );
        }
    }

    // Only methods that are not abstract on the managed side can clash.
    let mut by_selector: Vec<(String, Vec<ObjCMethod>)> = Vec::new();
    for super_type in container.immediate_super_types() {
        let is_protocol = matches!(super_type, ObjCContainer::Protocol(_));
        for method in methods_with_inherited(&super_type, is_meta) {
            if is_protocol && !method.is_optional {
                continue;
            }
            match by_selector.iter_mut().find(|(s, _)| *s == method.selector) {
                Some((_, group)) => group.push(method),
                None => by_selector.push((method.selector.clone(), vec![method])),
            }
        }
    }
    methods.extend(
        by_selector
            .into_iter()
            .filter(|(_, group)| group.len() > 1)
            .filter_map(|(_, group)| group.into_iter().next()),
    );

    distinct_by_selector(methods)
}

/// Properties declared by the container at one level that do not replace
/// an inherited accessor.
pub fn compose_properties(container: &ObjCContainer, is_meta: bool) -> Vec<ObjCProperty> {
    let super_methods = inherited_methods(container, is_meta);
    container
        .properties()
        .iter()
        .filter(|p| p.getter.is_class == is_meta)
        .filter(|p| {
            !super_methods.iter().any(|m| {
                p.getter.replaces(m) || p.setter.as_ref().is_some_and(|s| s.replaces(m))
            })
        })
        .cloned()
        .collect()
}

/// Selectors of the designated initializers of `class`.
///
/// Explicitly designated initializers are authoritative. Without any, every
/// initializer the class declares counts, together with the designated
/// initializers of its superclass. Initializers of adopted protocols always
/// count.
pub fn designated_initializer_selectors(class: &Rc<ObjCClass>) -> BTreeSet<String> {
    let mut result = BTreeSet::new();
    collect_designated(class, &mut result);
    result
}

fn collect_designated(class: &Rc<ObjCClass>, result: &mut BTreeSet<String>) {
    let explicit: Vec<&ObjCMethod> = class
        .methods()
        .iter()
        .filter(|m| m.is_explicitly_designated_initializer && !m.is_class)
        .collect();

    if explicit.is_empty() {
        result.extend(
            class
                .methods()
                .iter()
                .filter(|m| !m.is_class && m.is_init)
                .map(|m| m.selector.clone()),
        );
        if let Some(base) = &class.base_class {
            collect_designated(base, result);
        }
    } else {
        result.extend(explicit.into_iter().map(|m| m.selector.clone()));
    }

    for super_type in super_types(&ObjCContainer::Class(class.clone())) {
        if let ObjCContainer::Protocol(_) = super_type {
            result.extend(
                declared_methods(&super_type, false)
                    .into_iter()
                    .filter(|m| m.is_init)
                    .map(|m| m.selector),
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use cinterop_index::{Nullability, ObjCMembers, ObjCPointerKind, Parameter, Type};

    pub(crate) fn method(selector: &str) -> ObjCMethod {
        let arity = selector.matches(':').count();
        ObjCMethod::new(
            selector,
            "v16@0:8",
            (0..arity)
                .map(|i| Parameter::new(format!("a{i}"), Type::int()))
                .collect(),
            Type::Void,
        )
    }

    pub(crate) fn init(selector: &str) -> ObjCMethod {
        let mut m = method(selector);
        m.return_type = Type::objc(ObjCPointerKind::InstanceType, Nullability::Nullable);
        m
    }

    fn members(methods: Vec<ObjCMethod>) -> ObjCMembers {
        ObjCMembers {
            methods,
            properties: vec![],
        }
    }

    fn selectors(methods: &[ObjCMethod]) -> Vec<&str> {
        methods.iter().map(|m| m.selector.as_str()).collect()
    }

    #[test]
    fn designated_initializers_are_inherited_without_explicit_ones() {
        let base = ObjCClass::with_members(
            "Base",
            None,
            vec![],
            members(vec![init("init"), init("initWithFrame:")]),
        );
        let derived = ObjCClass::with_members(
            "Derived",
            Some(base.clone()),
            vec![],
            members(vec![init("initWithName:")]),
        );
        let selectors: Vec<_> = designated_initializer_selectors(&derived).into_iter().collect();
        assert_eq!(selectors, vec!["init", "initWithFrame:", "initWithName:"]);
    }

    #[test]
    fn subclass_without_initializers_inherits_explicit_designated_set() {
        let mut designated = init("initWithFrame:");
        designated.is_explicitly_designated_initializer = true;
        let view = ObjCClass::with_members(
            "View",
            None,
            vec![],
            members(vec![init("init"), designated, init("initWithCoder:")]),
        );
        let button = ObjCClass::with_members("Button", Some(view), vec![], members(vec![]));
        let selectors: Vec<_> = designated_initializer_selectors(&button).into_iter().collect();
        assert_eq!(selectors, vec!["initWithFrame:"]);
    }

    #[test]
    fn explicit_designated_initializers_win() {
        let base = ObjCClass::with_members("Base", None, vec![], members(vec![init("init")]));
        let mut designated = init("initWithCoder:");
        designated.is_explicitly_designated_initializer = true;
        let protocol = ObjCProtocol::with_members(
            "Coding",
            vec![],
            members(vec![init("initWithData:")]),
        );
        let derived = ObjCClass::with_members(
            "Derived",
            Some(base),
            vec![protocol],
            members(vec![designated, init("initWithName:")]),
        );
        let selectors: Vec<_> = designated_initializer_selectors(&derived).into_iter().collect();
        assert_eq!(selectors, vec!["initWithCoder:", "initWithData:"]);
    }

    #[test]
    fn identical_redeclarations_are_dropped() {
        let base = ObjCClass::with_members(
            "Base",
            None,
            vec![],
            members(vec![method("count"), method("reset")]),
        );
        let mut changed = method("count");
        changed.encoding = "Q16@0:8".into();
        let derived = ObjCContainer::Class(ObjCClass::with_members(
            "Derived",
            Some(base),
            vec![],
            members(vec![changed, method("reset"), method("draw")]),
        ));
        assert_eq!(selectors(&compose_methods(&derived, false)), vec!["count", "draw"]);
        assert!(is_override(&method("reset"), &derived));
        assert!(!is_override(&method("draw"), &derived));
    }

    #[test]
    fn initializers_and_required_protocol_methods_are_added() {
        let base = ObjCClass::with_members(
            "Base",
            None,
            vec![],
            members(vec![init("init"), method("describe")]),
        );
        let mut optional = method("optionalHook");
        optional.is_optional = true;
        let drawable = ObjCProtocol::with_members(
            "Drawable",
            vec![],
            members(vec![method("draw"), optional]),
        );
        let derived = ObjCContainer::Class(ObjCClass::with_members(
            "Derived",
            Some(base),
            vec![drawable],
            members(vec![]),
        ));
        assert_eq!(selectors(&compose_methods(&derived, false)), vec!["init", "draw"]);
    }

    #[test]
    fn diamond_methods_get_one_representative() {
        let mut hook = method("hook");
        hook.is_optional = true;
        let base = ObjCClass::with_members("Base", None, vec![], members(vec![method("hook")]));
        let protocol = ObjCProtocol::with_members("Hooks", vec![], members(vec![hook]));
        let derived = ObjCContainer::Class(ObjCClass::with_members(
            "Derived",
            Some(base),
            vec![protocol],
            members(vec![]),
        ));
        let composed = compose_methods(&derived, false);
        assert_eq!(selectors(&composed), vec!["hook"]);
        assert!(!composed[0].is_optional);
    }

    #[test]
    fn overriding_properties_are_dropped() {
        let base = ObjCClass::with_members("Base", None, vec![], members(vec![method("title")]));
        let title = ObjCProperty {
            name: "title".into(),
            getter: method("title"),
            setter: Some(method("setTitle:")),
        };
        let color = ObjCProperty {
            name: "color".into(),
            getter: method("color"),
            setter: None,
        };
        let derived = ObjCClass::with_members(
            "Derived",
            Some(base),
            vec![],
            ObjCMembers {
                methods: vec![method("color")],
                properties: vec![title, color],
            },
        );
        let properties = compose_properties(&ObjCContainer::Class(derived), false);
        let names: Vec<_> = properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["color"]);
    }

    #[test]
    fn super_types_are_distinct() {
        let root = ObjCProtocol::new("Root", vec![]);
        let a = ObjCProtocol::new("A", vec![root.clone()]);
        let b = ObjCProtocol::new("B", vec![root]);
        let class = ObjCContainer::Class(ObjCClass::new("C", None, vec![a, b]));
        let names: Vec<_> = super_types(&class).iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["A", "Root", "B"]);
        assert_eq!(protocols_with_supers(&class).len(), 4);
    }
}
