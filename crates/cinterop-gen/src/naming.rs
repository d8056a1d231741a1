//! Managed names of native declarations for one library.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};

use cinterop_index::{EnumDef, NativeIndex, StructDecl};

use crate::config::{InteropConfig, ManagedPlatform};
use crate::managed::{known, Classifier};
use crate::mirror::DeclarationMapper;

/// Naming decisions backed by an interop configuration.
///
/// Anonymous structs are numbered in the order they are first asked for,
/// so the numbering is stable within one generation session.
#[derive(Debug)]
pub struct DeclarationNames {
    package: String,
    platform: ManagedPlatform,
    strict_enums: BTreeSet<String>,
    non_strict_enums: BTreeSet<String>,
    /// Typedef names; a struct with the same name gets a `Struct` suffix.
    forbidden_struct_names: HashSet<String>,
    anonymous_structs: RefCell<HashMap<String, String>>,
}

impl DeclarationNames {
    pub fn new(config: &InteropConfig, index: &NativeIndex) -> Self {
        Self {
            package: config.package.clone(),
            platform: config.platform,
            strict_enums: config.strict_enums.clone(),
            non_strict_enums: config.non_strict_enums.clone(),
            forbidden_struct_names: index.typedefs.iter().map(|t| t.name.clone()).collect(),
            anonymous_structs: RefCell::new(HashMap::new()),
        }
    }

    /// Managed name of a struct or union.
    pub fn struct_name(&self, decl: &StructDecl) -> String {
        if decl.is_anonymous() {
            let mut names = self.anonymous_structs.borrow_mut();
            let next = format!("anonymousStruct{}", names.len() + 1);
            return names.entry(decl.spelling.clone()).or_insert(next).clone();
        }
        let stripped = decl
            .spelling
            .strip_prefix("struct ")
            .or_else(|| decl.spelling.strip_prefix("union "))
            .unwrap_or(&decl.spelling);
        if self.forbidden_struct_names.contains(stripped) {
            format!("{stripped}Struct")
        } else {
            stripped.to_string()
        }
    }

    pub fn platform(&self) -> ManagedPlatform {
        self.platform
    }
}

impl DeclarationMapper for DeclarationNames {
    fn package(&self) -> &str {
        &self.package
    }

    fn class_for_pointed(&self, decl: &StructDecl) -> Classifier {
        let package = if decl.def().is_some() {
            self.package.as_str()
        } else {
            known::FORWARD_STRUCTS_PACKAGE
        };
        Classifier::top_level(package, self.struct_name(decl))
    }

    fn is_mapped_to_strict(&self, def: &EnumDef) -> bool {
        if def.is_anonymous() {
            return false;
        }
        let name = def.name();
        if self.strict_enums.contains(name) {
            return true;
        }
        if self.non_strict_enums.contains(name) {
            return false;
        }
        !def.constants.iter().any(|c| c.is_explicitly_defined)
    }

    fn name_for_value(&self, def: &EnumDef) -> String {
        def.name().to_string()
    }

    fn uses_unsigned_types(&self) -> bool {
        self.platform.uses_unsigned_types()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use cinterop_index::{EnumConstant, RecordKind, StructDef, Type, TypedefDef};

    fn defined(spelling: &str) -> Rc<StructDecl> {
        StructDecl::with_def(
            spelling,
            StructDef {
                size: 4,
                align: 4,
                kind: RecordKind::Struct,
                members: vec![],
            },
        )
    }

    fn names_with_typedef(typedef: &str) -> DeclarationNames {
        let mut index = NativeIndex::default();
        index
            .typedefs
            .push(Rc::new(TypedefDef::new(typedef, Type::int())));
        DeclarationNames::new(&InteropConfig::new("gfx"), &index)
    }

    #[test]
    fn struct_names() {
        let names = names_with_typedef("rect");
        assert_eq!(names.struct_name(&defined("struct point")), "point");
        assert_eq!(names.struct_name(&defined("union value")), "value");
        assert_eq!(names.struct_name(&defined("struct rect")), "rectStruct");
    }

    #[test]
    fn anonymous_structs_are_numbered_once() {
        let names = names_with_typedef("t");
        let a = defined("struct (anonymous at a.h:3:5)");
        let b = defined("struct (anonymous at a.h:9:1)");
        assert_eq!(names.struct_name(&a), "anonymousStruct1");
        assert_eq!(names.struct_name(&b), "anonymousStruct2");
        assert_eq!(names.struct_name(&a), "anonymousStruct1");
    }

    #[test]
    fn forward_structs_live_in_their_own_package() {
        let names = names_with_typedef("t");
        let forward = StructDecl::new("struct opaque");
        let classifier = names.class_for_pointed(&forward);
        assert_eq!(classifier.package, "cnames.structs");
        assert_eq!(names.class_for_pointed(&defined("struct point")).package, "gfx");
    }

    fn mode(explicit: bool) -> EnumDef {
        EnumDef {
            spelling: "enum mode".into(),
            base_type: Type::int(),
            constants: vec![EnumConstant {
                name: "MODE_A".into(),
                value: 4,
                is_explicitly_defined: explicit,
            }],
        }
    }

    #[test]
    fn enum_strictness() {
        let mut config = InteropConfig::new("gfx");
        let index = NativeIndex::default();
        let names = DeclarationNames::new(&config, &index);
        assert!(names.is_mapped_to_strict(&mode(false)));
        assert!(!names.is_mapped_to_strict(&mode(true)));

        config.strict_enums.insert("mode".into());
        let names = DeclarationNames::new(&config, &index);
        assert!(names.is_mapped_to_strict(&mode(true)));

        config.strict_enums.clear();
        config.non_strict_enums.insert("mode".into());
        let names = DeclarationNames::new(&config, &index);
        assert!(!names.is_mapped_to_strict(&mode(false)));

        let anonymous = EnumDef {
            spelling: "enum (anonymous at b.h:1:1)".into(),
            ..mode(false)
        };
        assert!(!names.is_mapped_to_strict(&anonymous));
    }
}
