//! One generation run over an indexed library.
//!
//! The session owns every counter and registry of the run. Declarations
//! are processed one at a time; a declaration that fails is logged and
//! skipped together with the bridges it registered, and the run goes on.
//! After all stubs are built the bridges are checked in one batch and the
//! stubs are rendered against the result.

use serde::Serialize;
use tracing::{debug, info, warn};

use cinterop_index::{GlobalDecl, Language, NativeIndex, NativeLibrary};
use cinterop_targets::Target;

use crate::bridge::{BridgeGenerator, ClientId};
use crate::config::{InteropConfig, ManagedPlatform};
use crate::constants::{constant_stub, ConstantStub};
use crate::error::Result;
use crate::function::{FunctionStub, FunctionStubBuilder, GlobalStub};
use crate::naming::DeclarationNames;
use crate::objc::{CategoryRegistry, ObjCCategoryStub, ObjCContainerStub, ObjCStubBuilder};
use crate::oracle::{ClangOracle, CompilabilityOracle};
use crate::struct_render::try_render_struct_or_union;
use crate::wrapper::CWrappersGenerator;

/// Layout-reproducing declaration of a struct or union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructLayout {
    pub name: String,
    /// `None` when the layout cannot be expressed in C.
    pub declaration: Option<String>,
}

/// Everything a run produced, ready for the downstream emitter.
#[derive(Debug, Serialize)]
pub struct GeneratedModule {
    pub package: String,
    pub functions: Vec<FunctionStub>,
    pub constants: Vec<ConstantStub>,
    pub globals: Vec<GlobalStub>,
    pub protocols: Vec<ObjCContainerStub>,
    pub classes: Vec<ObjCContainerStub>,
    pub categories: Vec<ObjCCategoryStub>,
    pub struct_layouts: Vec<StructLayout>,
    /// Rendered stubs followed by the managed halves of the bridges.
    pub managed_lines: Vec<String>,
    /// Native halves of the bridges.
    pub native_lines: Vec<String>,
    /// C callee wrappers.
    pub wrapper_lines: Vec<String>,
}

/// State of one generation run.
#[derive(Debug)]
pub struct GenerationSession {
    config: InteropConfig,
    target: Target,
    bridges: BridgeGenerator,
    wrappers: CWrappersGenerator,
    categories: CategoryRegistry,
}

impl GenerationSession {
    pub fn new(config: InteropConfig, target: Target) -> Self {
        let bridges = BridgeGenerator::new(config.package.clone(), config.platform, config.language);
        let wrappers = CWrappersGenerator::new(&config.package);
        Self {
            config,
            target,
            bridges,
            wrappers,
            categories: CategoryRegistry::new(),
        }
    }

    pub fn config(&self) -> &InteropConfig {
        &self.config
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The library every native fragment is compiled against: the headers
    /// bridges rely on, then the configured library.
    pub fn oracle_library(&self) -> NativeLibrary {
        let mut library = self.config.library();
        let mut headers = vec!["stdint.h".to_string(), "string.h".to_string()];
        if self.config.platform == ManagedPlatform::Jvm {
            headers.push("jni.h".to_string());
        }
        headers.append(&mut library.headers);
        library.headers = headers;
        if self.config.language == Language::ObjectiveC {
            library
                .additional_preamble_lines
                .push("void objc_terminate();".to_string());
        }
        library
    }

    /// A clang-backed oracle for this run.
    pub fn clang_oracle(&self) -> ClangOracle {
        ClangOracle::new(self.oracle_library(), &self.target)
    }

    /// Build all stubs for `index`, check the bridges with `oracle` and
    /// render the result.
    pub fn generate(
        self,
        index: &NativeIndex,
        oracle: &mut dyn CompilabilityOracle,
    ) -> Result<GeneratedModule> {
        let GenerationSession {
            config,
            target,
            mut bridges,
            mut wrappers,
            mut categories,
        } = self;
        let names = DeclarationNames::new(&config, index);

        let mut functions = Vec::new();
        let mut constants = Vec::new();
        let mut globals = Vec::new();
        let wrapper_lines = {
            let mut builder = FunctionStubBuilder::new(&names, &mut bridges, &mut wrappers)
                .no_string_conversion(config.no_string_conversion.clone());
            for function in &index.functions {
                if config.excluded_functions.contains(&function.name) {
                    debug!(function = %function.name, "excluded by configuration");
                    continue;
                }
                let client = ClientId::new();
                match builder.function_stub(function, client) {
                    Ok(Some(stub)) => functions.push(stub),
                    Ok(None) => {}
                    Err(err) => {
                        warn!(function = %function.name, error = %err, "skipping function");
                        builder.discard_client(client);
                    }
                }
            }

            for constant in index
                .constants
                .iter()
                .filter(|c| !config.excluded_macros.contains(c.name()))
            {
                match constant_stub(&names, config.platform, constant) {
                    Ok(Some(stub)) => constants.push(stub),
                    Ok(None) => {}
                    Err(err) => warn!(constant = %constant.name(), error = %err, "skipping constant"),
                }
            }

            let macros = index
                .wrapped_macros
                .iter()
                .filter(|m| !config.excluded_macros.contains(&m.name))
                .map(|m| GlobalDecl::new(m.name.clone(), m.ty.clone(), true));
            for global in macros.chain(index.globals.iter().cloned()) {
                match builder.global_stub(&global) {
                    Ok(stub) => globals.push(stub),
                    Err(err) => warn!(global = %global.name, error = %err, "skipping global"),
                }
            }
            builder.into_wrapper_lines()
        };

        let mut protocols = Vec::new();
        let mut classes = Vec::new();
        let mut category_stubs = Vec::new();
        let objc_runtime = target.family.has_objc_runtime();
        if config.language == Language::ObjectiveC && !objc_runtime {
            warn!(target = %target.name, "target has no Objective-C runtime, skipping Objective-C declarations");
        }
        if config.language == Language::ObjectiveC && objc_runtime {
            let architecture = target.architecture;
            let disable_checks = config.disable_designated_initializer_checks;

            for protocol in index.objc_protocols.iter().filter(|p| !p.is_forward_declaration) {
                let mut builder = ObjCStubBuilder::new(&names, &mut bridges, architecture)
                    .disable_designated_initializer_checks(disable_checks);
                match builder.protocol_stub(protocol) {
                    Ok(stub) => protocols.push(stub),
                    Err(err) => {
                        warn!(protocol = %protocol.name, error = %err, "skipping protocol");
                        builder.discard();
                    }
                }
            }

            let generated_classes = index
                .objc_classes
                .iter()
                .filter(|c| !c.is_forward_declaration && !c.is_string_subclass());
            for class in generated_classes {
                let mut builder = ObjCStubBuilder::new(&names, &mut bridges, architecture)
                    .disable_designated_initializer_checks(disable_checks);
                match builder.class_stub(class) {
                    Ok(stub) => classes.push(stub),
                    Err(err) => {
                        warn!(class = %class.name, error = %err, "skipping class");
                        builder.discard();
                    }
                }
            }

            for category in index
                .objc_categories
                .iter()
                .filter(|c| !c.class.is_string_subclass())
            {
                let mut builder = ObjCStubBuilder::new(&names, &mut bridges, architecture)
                    .disable_designated_initializer_checks(disable_checks);
                match builder.category_stub(category, &mut categories) {
                    Ok(stub) => category_stubs.push(stub),
                    Err(err) => {
                        warn!(
                            class = %category.class.name,
                            category = %category.name,
                            error = %err,
                            "skipping category"
                        );
                        builder.discard();
                    }
                }
            }
        }

        let mut struct_layouts = Vec::new();
        for decl in &index.structs {
            let Some(def) = decl.def() else { continue };
            let declaration = try_render_struct_or_union(def, 0);
            if declaration.is_none() {
                debug!(record = %decl.spelling, "layout cannot be reproduced in C");
            }
            struct_layouts.push(StructLayout {
                name: names.struct_name(decl),
                declaration,
            });
        }

        let prepared = bridges.prepare(oracle)?;

        let mut managed_lines = Vec::new();
        let mut emit = |lines: Vec<String>| {
            managed_lines.extend(lines);
            managed_lines.push(String::new());
        };
        functions.iter().for_each(|f| emit(f.render(&prepared)));
        constants.iter().for_each(|c| emit(vec![c.render()]));
        globals.iter().for_each(|g| emit(g.render()));
        protocols.iter().for_each(|p| emit(p.render(&prepared)));
        classes.iter().for_each(|c| emit(c.render(&prepared)));
        category_stubs.iter().for_each(|c| emit(c.render(&prepared)));
        managed_lines.extend(prepared.managed_lines().map(str::to_string));
        let native_lines: Vec<String> = prepared.native_lines().map(str::to_string).collect();

        info!(
            package = %config.package,
            functions = functions.len(),
            constants = constants.len(),
            globals = globals.len(),
            classes = classes.len(),
            protocols = protocols.len(),
            bridges = prepared.bridges().len(),
            "generated interop module"
        );

        Ok(GeneratedModule {
            package: config.package,
            functions,
            constants,
            globals,
            protocols,
            classes,
            categories: category_stubs,
            struct_layouts,
            managed_lines,
            native_lines,
            wrapper_lines,
        })
    }
}
