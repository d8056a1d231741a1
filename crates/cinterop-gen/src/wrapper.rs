//! C callee wrappers.
//!
//! Function-like macros, compiler builtins and `static inline` functions
//! have no address the managed side could link against. For those an
//! always-inlined wrapper with the real signature is synthesized, and a
//! constant pointer bound to the requested symbol name holds its address:
//! a data object is always linkable even when the wrapped construct is not.
//! Global variables are read and written through the same kind of wrapper.

use tracing::debug;

use cinterop_index::{FunctionDecl, GlobalDecl, Type};

use crate::bridge::sanitize;

/// Native lines of one wrapper. Empty when no wrapper could be produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CCalleeWrapper {
    pub lines: Vec<String>,
}

impl CCalleeWrapper {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Produces wrappers with session-unique names.
#[derive(Debug)]
pub struct CWrappersGenerator {
    package: String,
    next_id: u32,
}

impl CWrappersGenerator {
    pub fn new(package: &str) -> Self {
        Self {
            package: sanitize(package),
            next_id: 0,
        }
    }

    fn wrapper_name(&mut self, stem: &str) -> String {
        let id = self.next_id;
        self.next_id += 1;
        format!("{}_{stem}_wrapper_{id}", self.package)
    }

    /// Wrapper forwarding to `function`, exported as `symbol`.
    ///
    /// A variadic function cannot be forwarded through a fixed signature;
    /// the result is then empty and callers have no thunk to link against.
    pub fn function_wrapper(&mut self, function: &FunctionDecl, symbol: &str) -> CCalleeWrapper {
        if function.is_variadic {
            debug!(function = %function.name, "no wrapper for variadic function");
            return CCalleeWrapper::default();
        }
        let wrapper = self.wrapper_name(&function.name);
        let parameters: Vec<(String, &Type)> = function
            .parameters
            .iter()
            .enumerate()
            .map(|(i, p)| (format!("p{i}"), &p.ty))
            .collect();
        let arguments: Vec<&str> = parameters.iter().map(|(name, _)| name.as_str()).collect();
        let call = format!("{}({});", function.name, arguments.join(", "));
        let body = if function.return_type.is_void() {
            call
        } else {
            format!("return {call}")
        };
        create_wrapper(symbol, &wrapper, &function.return_type, &parameters, &body)
    }

    /// Wrapper returning the value of `global`.
    pub fn global_getter(&mut self, global: &GlobalDecl, symbol: &str) -> CCalleeWrapper {
        let wrapper = self.wrapper_name(&format!("{}_getter", global.name));
        let body = format!("return {};", global.name);
        create_wrapper(symbol, &wrapper, &global.ty, &[], &body)
    }

    /// Wrapper assigning its argument to `global`.
    pub fn global_setter(&mut self, global: &GlobalDecl, symbol: &str) -> CCalleeWrapper {
        let wrapper = self.wrapper_name(&format!("{}_setter", global.name));
        let body = format!("{} = p0;", global.name);
        create_wrapper(
            symbol,
            &wrapper,
            &Type::Void,
            &[("p0".to_string(), &global.ty)],
            &body,
        )
    }
}

fn create_wrapper(
    symbol: &str,
    wrapper: &str,
    return_type: &Type,
    parameters: &[(String, &Type)],
    body: &str,
) -> CCalleeWrapper {
    let parameters: Vec<String> = parameters.iter().map(|(name, ty)| ty.declare(name)).collect();
    CCalleeWrapper {
        lines: vec![
            "__attribute__((always_inline))".to_string(),
            return_type.declare(&format!("{wrapper}({})", parameters.join(", "))) + " {",
            body.to_string(),
            "}".to_string(),
            format!("const void* {symbol} __asm(\"{symbol}\");"),
            format!("const void* {symbol} = &{wrapper};"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinterop_index::Parameter;
    use pretty_assertions::assert_eq;

    #[test]
    fn function_wrapper_forwards_call() {
        let mut wrappers = CWrappersGenerator::new("platform.posix");
        let function = FunctionDecl::new(
            "htons",
            vec![Parameter::new("x", Type::integer(2, false, "uint16_t"))],
            Type::integer(2, false, "uint16_t"),
        );
        let wrapper = wrappers.function_wrapper(&function, "platform_posix_htons_0");
        assert_eq!(
            wrapper.lines,
            vec![
                "__attribute__((always_inline))",
                "uint16_t platform_posix_htons_wrapper_0(uint16_t p0) {",
                "return htons(p0);",
                "}",
                "const void* platform_posix_htons_0 __asm(\"platform_posix_htons_0\");",
                "const void* platform_posix_htons_0 = &platform_posix_htons_wrapper_0;",
            ]
        );
    }

    #[test]
    fn void_function_body_is_a_statement() {
        let mut wrappers = CWrappersGenerator::new("p");
        let function = FunctionDecl::new(
            "FD_ZERO",
            vec![Parameter::new("set", Type::pointer_to(Type::int()))],
            Type::Void,
        );
        let wrapper = wrappers.function_wrapper(&function, "sym");
        assert_eq!(wrapper.lines[1], "void p_FD_ZERO_wrapper_0(int *p0) {");
        assert_eq!(wrapper.lines[2], "FD_ZERO(p0);");
    }

    #[test]
    fn variadic_function_has_no_wrapper() {
        let mut wrappers = CWrappersGenerator::new("p");
        let mut function = FunctionDecl::new(
            "printf",
            vec![Parameter::new("fmt", Type::const_pointer_to(Type::Char))],
            Type::int(),
        );
        function.is_variadic = true;
        let wrapper = wrappers.function_wrapper(&function, "sym");
        assert!(wrapper.is_empty());

        let next = wrappers.function_wrapper(&FunctionDecl::new("f", vec![], Type::int()), "s");
        assert_eq!(next.lines[1], "int p_f_wrapper_0() {");
    }

    #[test]
    fn global_accessors() {
        let mut wrappers = CWrappersGenerator::new("lib");
        let global = GlobalDecl::new("errno_value", Type::int(), false);

        let getter = wrappers.global_getter(&global, "get_sym");
        assert_eq!(getter.lines[1], "int lib_errno_value_getter_wrapper_0() {");
        assert_eq!(getter.lines[2], "return errno_value;");

        let setter = wrappers.global_setter(&global, "set_sym");
        assert_eq!(setter.lines[1], "void lib_errno_value_setter_wrapper_1(int p0) {");
        assert_eq!(setter.lines[2], "errno_value = p0;");
        assert_eq!(setter.lines[5], "const void* set_sym = &lib_errno_value_setter_wrapper_1;");
    }
}
