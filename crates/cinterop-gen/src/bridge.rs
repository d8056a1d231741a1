//! Paired managed/native bridge generation.
//!
//! A bridge is one call boundary: a managed declaration and a native
//! function sharing a base name. Bridges are accumulated per client (the
//! declaration that needs them) and validated in one batch by
//! [`BridgeGenerator::prepare`], which consumes the generator. A client
//! whose native fragments do not compile loses all of its bridges.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, warn};
use uuid::Uuid;

use cinterop_index::Language;

use crate::bridged::BridgedType;
use crate::code::{ManagedCodeBuilder, NativeCodeBuilder};
use crate::config::ManagedPlatform;
use crate::error::{GenError, Result};
use crate::managed::quote_literal;
use crate::oracle::CompilabilityOracle;

/// Opaque tag of the declaration owning a group of bridges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A typed expression crossing a bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeValue {
    pub ty: BridgedType,
    pub expr: String,
}

impl BridgeValue {
    pub fn new(ty: BridgedType, expr: impl Into<String>) -> Self {
        Self {
            ty,
            expr: expr.into(),
        }
    }
}

/// The two halves of one bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeBridge {
    pub client: ClientId,
    pub base_name: String,
    pub managed_lines: Vec<String>,
    pub native_lines: Vec<String>,
}

/// Whether the bridges of a client can be used.
pub trait BridgeSupport {
    fn is_supported(&self, client: ClientId) -> bool;
}

/// Replace every character that is not valid in a C identifier with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn jni_mangle(name: &str) -> String {
    name.replace('_', "_1")
        .replace('.', "_")
        .replace('$', "_00024")
}

/// Accumulates bridges for one generation session.
#[derive(Debug)]
pub struct BridgeGenerator {
    package: String,
    platform: ManagedPlatform,
    language: Language,
    /// Class holding top-level declarations on a JVM host.
    jvm_file_class: String,
    next_id: u32,
    bridges: Vec<NativeBridge>,
}

impl BridgeGenerator {
    pub fn new(package: impl Into<String>, platform: ManagedPlatform, language: Language) -> Self {
        let package = package.into();
        let jvm_file_class = default_file_class(&package);
        Self {
            package,
            platform,
            language,
            jvm_file_class,
            next_id: 0,
            bridges: Vec::new(),
        }
    }

    pub fn with_jvm_file_class(mut self, name: impl Into<String>) -> Self {
        self.jvm_file_class = name.into();
        self
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn platform(&self) -> ManagedPlatform {
        self.platform
    }

    pub fn language(&self) -> Language {
        self.language
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// A session-unique C symbol `{package}_{stem}_{N}`.
    pub fn fresh_symbol(&mut self, stem: &str) -> String {
        let id = self.next_id();
        format!("{}_{stem}_{id}", sanitize(&self.package))
    }

    /// Bridges accumulated so far, in creation order.
    pub fn bridges(&self) -> &[NativeBridge] {
        &self.bridges
    }

    /// Emit a bridge called from managed code and implemented natively.
    ///
    /// `body` receives the native parameter names and returns the native
    /// result expression; it may create nested bridges. Returns the
    /// managed call expression.
    pub fn managed_to_native<F>(
        &mut self,
        client: ClientId,
        return_type: BridgedType,
        values: &[BridgeValue],
        independent: bool,
        body: F,
    ) -> Result<String>
    where
        F: FnOnce(&mut BridgeGenerator, &mut NativeCodeBuilder, &[String]) -> Result<String>,
    {
        let id = self.next_id();
        let function = format!("bridge{id}");
        let symbol = format!("{}_{function}", sanitize(&self.package));

        let native_return = return_type.native_type(self.platform)?;
        let mut parameters: Vec<(String, &'static str)> = match self.platform {
            ManagedPlatform::Jvm => vec![("jniEnv".into(), "JNIEnv*"), ("jclss".into(), "jclass")],
            ManagedPlatform::Native => Vec::new(),
        };
        let names: Vec<String> = (0..values.len()).map(|i| format!("p{i}")).collect();
        for (name, value) in names.iter().zip(values) {
            parameters.push((name.clone(), value.ty.native_type(self.platform)?));
        }
        let joined = parameters
            .iter()
            .map(|(name, ty)| format!("{ty} {name}"))
            .collect::<Vec<_>>()
            .join(", ");

        let header = match self.platform {
            ManagedPlatform::Jvm => {
                let mut full_name = String::new();
                if !self.package.is_empty() {
                    full_name.push_str(&self.package);
                    full_name.push('.');
                }
                full_name.push_str(&self.jvm_file_class);
                full_name.push('.');
                full_name.push_str(&function);
                format!(
                    "JNIEXPORT {native_return} JNICALL Java_{} ({joined})",
                    jni_mangle(&full_name)
                )
            }
            ManagedPlatform::Native => format!("{native_return} {symbol} ({joined})"),
        };

        let mut native_lines = vec![format!("{header} {{")];
        let mut builder = NativeCodeBuilder::new();
        let expr = body(self, &mut builder, &names)?;
        if !return_type.is_void() {
            builder.out(format!("return ({native_return}){expr};"));
        } else if !expr.is_empty() {
            builder.out(format!("{expr};"));
        }
        native_lines.extend(builder.into_lines().into_iter().map(|l| format!("    {l}")));
        if self.language == Language::ObjectiveC {
            native_lines.insert(1, "@try {".to_string());
            native_lines.push("} @catch (id e) { objc_terminate(); }".to_string());
        }
        native_lines.push("}".to_string());

        let scope = self.package.as_str();
        let managed_parameters = names
            .iter()
            .zip(values)
            .map(|(name, value)| format!("{name}: {}", value.ty.managed_type().render(scope)))
            .collect::<Vec<_>>()
            .join(", ");
        let managed_return = return_type.managed_type().render(scope);
        let mut managed_lines = Vec::new();
        if self.platform == ManagedPlatform::Native {
            if independent {
                managed_lines.push("@Independent".to_string());
            }
            managed_lines.push(format!("@SymbolName({})", quote_literal(&symbol)));
        }
        managed_lines.push(format!(
            "private external fun {function}({managed_parameters}): {managed_return}"
        ));

        self.bridges.push(NativeBridge {
            client,
            base_name: symbol,
            managed_lines,
            native_lines,
        });

        let arguments = values.iter().map(|v| v.expr.as_str()).collect::<Vec<_>>();
        Ok(format!("{function}({})", arguments.join(", ")))
    }

    /// Emit a bridge called from native code and implemented in managed
    /// code. Only a natively compiled managed host can export functions.
    ///
    /// Returns the native call expression.
    pub fn native_to_managed<F>(
        &mut self,
        client: ClientId,
        return_type: BridgedType,
        values: &[BridgeValue],
        body: F,
    ) -> Result<String>
    where
        F: FnOnce(&mut BridgeGenerator, &mut ManagedCodeBuilder, &[String]) -> Result<String>,
    {
        if self.platform != ManagedPlatform::Native {
            return Err(GenError::UnsupportedOnPlatform {
                detail: "native code cannot call into a JVM host through a bridge".into(),
            });
        }
        let id = self.next_id();
        let function = format!("bridge{id}");
        let symbol = format!("{}_{function}", sanitize(&self.package));

        let native_return = return_type.native_type(self.platform)?;
        let names: Vec<String> = (0..values.len()).map(|i| format!("p{i}")).collect();
        let mut native_parameters = Vec::with_capacity(values.len());
        for (name, value) in names.iter().zip(values) {
            native_parameters.push(format!("{} {name}", value.ty.native_type(self.platform)?));
        }
        let native_lines = vec![format!(
            "{native_return} {symbol}({});",
            native_parameters.join(", ")
        )];

        let scope = self.package.clone();
        let managed_parameters = names
            .iter()
            .zip(values)
            .map(|(name, value)| format!("{name}: {}", value.ty.managed_type().render(&scope)))
            .collect::<Vec<_>>()
            .join(", ");
        let managed_return = return_type.managed_type().render(&scope);
        let mut managed_lines = vec![
            format!("@ExportForCppRuntime({})", quote_literal(&symbol)),
            format!("private fun {function}({managed_parameters}): {managed_return} {{"),
        ];
        let mut builder = ManagedCodeBuilder::new(scope);
        let mut expr = body(self, &mut builder, &names)?;
        if return_type == BridgedType::ObjCPointer {
            // The managed side may drop its reference once the bridge returns.
            expr = format!("objc_retainAutoreleaseReturnValue({expr})");
        }
        if !return_type.is_void() {
            builder.return_result(&expr);
        } else if !expr.is_empty() {
            builder.out(expr);
        }
        managed_lines.extend(builder.into_lines().into_iter().map(|l| format!("    {l}")));
        managed_lines.push("}".to_string());

        self.bridges.push(NativeBridge {
            client,
            base_name: symbol.clone(),
            managed_lines,
            native_lines,
        });

        let arguments = values.iter().map(|v| v.expr.as_str()).collect::<Vec<_>>();
        Ok(format!("{symbol}({})", arguments.join(", ")))
    }

    /// Add a hand-built bridge.
    pub fn insert_native_bridge(
        &mut self,
        client: ClientId,
        base_name: impl Into<String>,
        managed_lines: Vec<String>,
        native_lines: Vec<String>,
    ) {
        self.bridges.push(NativeBridge {
            client,
            base_name: base_name.into(),
            managed_lines,
            native_lines,
        });
    }

    /// Drop every bridge of `client`.
    pub fn discard_client(&mut self, client: ClientId) {
        self.bridges.retain(|b| b.client != client);
    }

    /// Check every native fragment once and keep the bridges of clients
    /// whose fragments all compile.
    pub fn prepare(self, oracle: &mut dyn CompilabilityOracle) -> Result<PreparedBridges> {
        let fragments: Vec<&[String]> = self
            .bridges
            .iter()
            .map(|b| b.native_lines.as_slice())
            .collect();
        let compilable = oracle.check(&fragments)?;
        if compilable.len() != fragments.len() {
            return Err(GenError::CompileCheck {
                detail: format!(
                    "oracle answered {} of {} fragments",
                    compilable.len(),
                    fragments.len()
                ),
            });
        }

        let mut excluded = HashSet::new();
        for (bridge, ok) in self.bridges.iter().zip(&compilable) {
            if !ok {
                warn!(
                    bridge = %bridge.base_name,
                    client = %bridge.client,
                    "native bridge does not compile, excluding its declaration"
                );
                excluded.insert(bridge.client);
            }
        }

        let bridges: Vec<NativeBridge> = self
            .bridges
            .into_iter()
            .filter(|b| !excluded.contains(&b.client))
            .collect();
        debug!(
            included = bridges.len(),
            excluded_clients = excluded.len(),
            "bridges prepared"
        );
        Ok(PreparedBridges { bridges, excluded })
    }
}

impl BridgeSupport for BridgeGenerator {
    /// Nothing is known to be unsupported before the compilability check.
    fn is_supported(&self, _client: ClientId) -> bool {
        true
    }
}

fn default_file_class(package: &str) -> String {
    let last = package.rsplit('.').next().unwrap_or(package);
    let mut chars = last.chars();
    match chars.next() {
        Some(first) => format!("{}{}Kt", first.to_ascii_uppercase(), chars.as_str()),
        None => "InteropKt".to_string(),
    }
}

/// Bridges that survived the compilability check.
#[derive(Debug)]
pub struct PreparedBridges {
    bridges: Vec<NativeBridge>,
    excluded: HashSet<ClientId>,
}

impl PreparedBridges {
    pub fn bridges(&self) -> &[NativeBridge] {
        &self.bridges
    }

    pub fn managed_lines(&self) -> impl Iterator<Item = &str> {
        self.bridges
            .iter()
            .flat_map(|b| b.managed_lines.iter().map(String::as_str))
    }

    pub fn native_lines(&self) -> impl Iterator<Item = &str> {
        self.bridges
            .iter()
            .flat_map(|b| b.native_lines.iter().map(String::as_str))
    }
}

impl BridgeSupport for PreparedBridges {
    fn is_supported(&self, client: ClientId) -> bool {
        !self.excluded.contains(&client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn native_c() -> BridgeGenerator {
        BridgeGenerator::new("platform.zlib", ManagedPlatform::Native, Language::C)
    }

    fn all_compile(fragments: &[&[String]]) -> Result<Vec<bool>> {
        Ok(vec![true; fragments.len()])
    }

    #[test]
    fn managed_to_native_on_native_host() {
        let mut generator = native_c();
        let client = ClientId::new();
        let call = generator
            .managed_to_native(
                client,
                BridgedType::Int,
                &[
                    BridgeValue::new(BridgedType::Int, "x"),
                    BridgeValue::new(BridgedType::NativePtr, "buf.rawValue"),
                ],
                true,
                |_, _, args| Ok(format!("compress({}, {})", args[0], args[1])),
            )
            .unwrap();
        assert_eq!(call, "bridge0(x, buf.rawValue)");

        let bridge = &generator.bridges()[0];
        assert_eq!(bridge.base_name, "platform_zlib_bridge0");
        assert_eq!(
            bridge.native_lines,
            vec![
                "int32_t platform_zlib_bridge0 (int32_t p0, void* p1) {",
                "    return (int32_t)compress(p0, p1);",
                "}",
            ]
        );
        assert_eq!(
            bridge.managed_lines,
            vec![
                "@Independent",
                "@SymbolName(\"platform_zlib_bridge0\")",
                "private external fun bridge0(p0: Int, p1: NativePtr): Int",
            ]
        );
    }

    #[test]
    fn void_result_is_a_statement() {
        let mut generator = native_c();
        generator
            .managed_to_native(ClientId::new(), BridgedType::Void, &[], false, |_, code, _| {
                code.out("int unused = 0;");
                Ok("reset()".into())
            })
            .unwrap();
        assert_eq!(
            generator.bridges()[0].native_lines,
            vec![
                "void platform_zlib_bridge0 () {",
                "    int unused = 0;",
                "    reset();",
                "}",
            ]
        );
    }

    #[test]
    fn jvm_host_uses_jni_names() {
        let mut generator =
            BridgeGenerator::new("my_lib.core", ManagedPlatform::Jvm, Language::C);
        generator
            .managed_to_native(
                ClientId::new(),
                BridgedType::Long,
                &[BridgeValue::new(BridgedType::NativePtr, "p")],
                false,
                |_, _, args| {
                    assert_eq!(args, ["p0"]);
                    Ok(format!("(intptr_t){}", args[0]))
                },
            )
            .unwrap();
        let bridge = &generator.bridges()[0];
        assert_eq!(
            bridge.native_lines[0],
            "JNIEXPORT jlong JNICALL Java_my_1lib_core_CoreKt_bridge0 (JNIEnv* jniEnv, jclass jclss, jlong p0) {"
        );
        assert_eq!(
            bridge.managed_lines,
            vec!["private external fun bridge0(p0: NativePtr): Long"]
        );
    }

    #[test]
    fn objective_c_bodies_catch_exceptions() {
        let mut generator =
            BridgeGenerator::new("ui", ManagedPlatform::Native, Language::ObjectiveC);
        generator
            .managed_to_native(
                ClientId::new(),
                BridgedType::ObjCPointer,
                &[BridgeValue::new(BridgedType::ObjCPointer, "obj.objcPtr()")],
                false,
                |_, _, args| Ok(format!("[{} copy]", args[0])),
            )
            .unwrap();
        assert_eq!(
            generator.bridges()[0].native_lines,
            vec![
                "id ui_bridge0 (id p0) {",
                "@try {",
                "    return (id)[p0 copy];",
                "} @catch (id e) { objc_terminate(); }",
                "}",
            ]
        );
    }

    #[test]
    fn native_to_managed_exports_a_managed_function() {
        let mut generator = native_c();
        let call = generator
            .native_to_managed(
                ClientId::new(),
                BridgedType::ObjCPointer,
                &[BridgeValue::new(BridgedType::Int, "count")],
                |_, code, args| {
                    code.out("val n = p0");
                    Ok(format!("make({})", args[0]))
                },
            )
            .unwrap();
        assert_eq!(call, "platform_zlib_bridge0(count)");
        let bridge = &generator.bridges()[0];
        assert_eq!(bridge.native_lines, vec!["id platform_zlib_bridge0(int32_t p0);"]);
        assert_eq!(
            bridge.managed_lines,
            vec![
                "@ExportForCppRuntime(\"platform_zlib_bridge0\")",
                "private fun bridge0(p0: Int): NativePtr {",
                "    val n = p0",
                "    return objc_retainAutoreleaseReturnValue(make(p0))",
                "}",
            ]
        );
    }

    #[test]
    fn native_to_managed_needs_native_host() {
        let mut generator = BridgeGenerator::new("p", ManagedPlatform::Jvm, Language::C);
        let err = generator
            .native_to_managed(ClientId::new(), BridgedType::Void, &[], |_, _, _| Ok(String::new()))
            .unwrap_err();
        assert!(matches!(err, GenError::UnsupportedOnPlatform { .. }));
        assert!(generator.bridges().is_empty());
    }

    #[test]
    fn nested_bridges_get_distinct_names() {
        let mut generator = native_c();
        let client = ClientId::new();
        generator
            .managed_to_native(client, BridgedType::Void, &[], false, |generator, _, _| {
                let inner = generator.native_to_managed(
                    client,
                    BridgedType::Void,
                    &[],
                    |_, _, _| Ok("callback()".into()),
                )?;
                Ok(format!("register({inner})"))
            })
            .unwrap();
        let symbol = generator.fresh_symbol("protocol");
        assert_eq!(symbol, "platform_zlib_protocol_2");

        let names: HashSet<_> = generator.bridges().iter().map(|b| &b.base_name).collect();
        assert_eq!(names.len(), 2);
        assert!(generator.bridges().iter().all(|b| b.client == client));
    }

    #[test]
    fn prepare_excludes_whole_clients() {
        let mut generator = native_c();
        let good = ClientId::new();
        let bad = ClientId::new();
        for client in [good, bad, bad] {
            generator
                .managed_to_native(client, BridgedType::Void, &[], false, |_, _, _| {
                    Ok("f()".into())
                })
                .unwrap();
        }
        assert!(generator.is_supported(bad));

        let mut calls = 0;
        let mut oracle = |fragments: &[&[String]]| -> Result<Vec<bool>> {
            calls += 1;
            // Only the last fragment fails.
            Ok((0..fragments.len()).map(|i| i + 1 < fragments.len()).collect())
        };
        let prepared = generator.prepare(&mut oracle).unwrap();
        assert_eq!(calls, 1);
        assert!(prepared.is_supported(good));
        assert!(!prepared.is_supported(bad));
        assert_eq!(prepared.bridges().len(), 1);
        assert_eq!(prepared.bridges()[0].client, good);
        assert_eq!(
            prepared.managed_lines().collect::<Vec<_>>(),
            vec![
                "@SymbolName(\"platform_zlib_bridge0\")",
                "private external fun bridge0(): Unit"
            ]
        );
        assert_eq!(prepared.native_lines().count(), 3);
    }

    #[test]
    fn prepare_rejects_short_answers() {
        let mut generator = native_c();
        generator.insert_native_bridge(ClientId::new(), "x", vec![], vec!["int x;".into()]);
        let mut oracle = |_: &[&[String]]| -> Result<Vec<bool>> { Ok(vec![]) };
        assert!(matches!(
            generator.prepare(&mut oracle),
            Err(GenError::CompileCheck { .. })
        ));
    }

    #[test]
    fn discard_and_insert() {
        let mut generator = native_c();
        let kept = ClientId::new();
        let dropped = ClientId::new();
        generator.insert_native_bridge(
            kept,
            "platform_zlib_protocol_0",
            vec!["fun getter() = ...".into()],
            vec!["Protocol* platform_zlib_protocol_0() { return @protocol(P); }".into()],
        );
        generator
            .managed_to_native(dropped, BridgedType::Void, &[], false, |_, _, _| Ok("g()".into()))
            .unwrap();
        generator.discard_client(dropped);
        assert_eq!(generator.bridges().len(), 1);
        let prepared = generator.prepare(&mut all_compile).unwrap();
        assert_eq!(prepared.bridges()[0].base_name, "platform_zlib_protocol_0");
    }

    #[test]
    fn fresh_symbols_are_prefixed_by_the_package() {
        let mut generator = native_c();
        let first = generator.fresh_symbol("htons");
        let second = generator.fresh_symbol("counter_getter");
        assert_eq!(first, "platform_zlib_htons_0");
        assert_eq!(second, "platform_zlib_counter_getter_1");
        assert!([&first, &second].iter().all(|s| s.starts_with("platform_zlib_")));
    }

    #[test]
    fn sanitize_package_names() {
        assert_eq!(sanitize("platform.zlib"), "platform_zlib");
        assert_eq!(sanitize("a-b.c0"), "a_b_c0");
    }
}
