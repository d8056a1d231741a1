//! Hand-written C prototype parser.
//!
//! Covers the declarations hand-written declaration tables need: builtin
//! and stdint types, `const` qualifiers, pointers, `struct` tags and
//! variadic functions. Integer sizes follow the LP64 data model. Does NOT
//! handle function pointers, array declarators or attributes.

use crate::error::{IndexError, Result};
use crate::functions::{FunctionDecl, GlobalDecl, Parameter};
use crate::records::StructDecl;
use crate::types::Type;

fn invalid(detail: impl Into<String>) -> IndexError {
    IndexError::InvalidSignature {
        detail: detail.into(),
    }
}

/// Parse a function prototype such as `int printf(const char* fmt, ...)`.
pub fn parse_function(input: &str) -> Result<FunctionDecl> {
    let input = input.trim().trim_end_matches(';').trim_end();
    if input.is_empty() {
        return Err(invalid("empty signature"));
    }

    let paren_pos = input.find('(').ok_or_else(|| invalid("missing '('"))?;
    if !input.ends_with(')') {
        return Err(invalid("missing ')'"));
    }

    let (return_type, name) = parse_declaration(&input[..paren_pos])?;
    if name.is_empty() {
        return Err(invalid("missing function name"));
    }
    let (parameters, is_variadic) = parse_params(&input[paren_pos + 1..input.len() - 1])?;

    let mut decl = FunctionDecl::new(name, parameters, return_type);
    decl.is_variadic = is_variadic;
    Ok(decl)
}

/// Parse a global variable declaration such as `const int32_t counter`.
///
/// A leading `const` on a non-pointer type makes the global read-only.
pub fn parse_global(input: &str) -> Result<GlobalDecl> {
    let input = input.trim().trim_end_matches(';').trim_end();
    let tokens = tokenize(input);
    let is_const = tokens.first() == Some(&"const") && !tokens.contains(&"*");
    let (ty, name) = parse_declaration(input)?;
    if name.is_empty() {
        return Err(invalid("missing variable name"));
    }
    Ok(GlobalDecl::new(name, ty, is_const))
}

/// Tokenize a declaration fragment, keeping `*` as separate tokens.
fn tokenize(s: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for part in s.split_whitespace() {
        let mut remaining = part;
        while !remaining.is_empty() {
            if let Some(star_pos) = remaining.find('*') {
                if star_pos > 0 {
                    tokens.push(&remaining[..star_pos]);
                }
                tokens.push("*");
                remaining = &remaining[star_pos + 1..];
            } else {
                tokens.push(remaining);
                break;
            }
        }
    }
    tokens
}

/// Parse a type specifier; returns the type, whether it was `const`, and
/// the number of tokens consumed.
fn parse_base_type(tokens: &[&str]) -> Result<(Type, bool, usize)> {
    let mut pos = 0;
    let is_const = tokens.first() == Some(&"const");
    if is_const {
        pos += 1;
    }
    let Some(&first) = tokens.get(pos) else {
        return Err(invalid("expected type"));
    };

    if first == "struct" || first == "union" {
        let name = tokens
            .get(pos + 1)
            .ok_or_else(|| invalid(format!("expected {first} name")))?;
        let decl = StructDecl::new(format!("{first} {name}"));
        return Ok((Type::Record(decl), is_const, pos + 2));
    }

    if first == "unsigned" || first == "signed" {
        let is_signed = first == "signed";
        pos += 1;
        let (size, spelling_tail) = match tokens.get(pos).copied() {
            Some("char") => {
                pos += 1;
                (1, "char")
            }
            Some("short") => {
                pos += 1;
                (2, "short")
            }
            Some("int") => {
                pos += 1;
                (4, "int")
            }
            Some("long") => {
                pos += 1;
                if tokens.get(pos) == Some(&"long") {
                    pos += 1;
                    (8, "long long")
                } else {
                    (8, "long")
                }
            }
            // Bare `unsigned` / `signed` means `int`.
            _ => (4, "int"),
        };
        let ty = Type::integer(size, is_signed, format!("{first} {spelling_tail}"));
        return Ok((ty, is_const, pos));
    }

    pos += 1;
    let ty = match first {
        "void" => Type::Void,
        "char" => Type::Char,
        "_Bool" | "bool" => Type::Bool,
        "short" => Type::integer(2, true, "short"),
        "int" => Type::int(),
        "long" => match tokens.get(pos).copied() {
            Some("long") => {
                pos += 1;
                Type::integer(8, true, "long long")
            }
            Some("double") => {
                pos += 1;
                Type::Unsupported {
                    spelling: "long double".into(),
                }
            }
            _ => Type::integer(8, true, "long"),
        },
        "float" => Type::floating(4, "float"),
        "double" => Type::floating(8, "double"),
        "size_t" | "uintptr_t" => Type::integer(8, false, first),
        "ssize_t" | "ptrdiff_t" | "intptr_t" => Type::integer(8, true, first),
        "int8_t" => Type::integer(1, true, first),
        "int16_t" => Type::integer(2, true, first),
        "int32_t" => Type::integer(4, true, first),
        "int64_t" => Type::integer(8, true, first),
        "uint8_t" => Type::integer(1, false, first),
        "uint16_t" => Type::integer(2, false, first),
        "uint32_t" => Type::integer(4, false, first),
        "uint64_t" => Type::integer(8, false, first),
        other => return Err(invalid(format!("unknown type '{other}'"))),
    };
    Ok((ty, is_const, pos))
}

/// Parse `type [*...] [name]`.
fn parse_declaration(s: &str) -> Result<(Type, String)> {
    let tokens = tokenize(s);
    if tokens.is_empty() {
        return Err(invalid("empty declaration"));
    }

    let (base, base_is_const, consumed) = parse_base_type(&tokens)?;

    let mut ty = base;
    let mut pointee_is_const = base_is_const;
    let mut name = String::new();
    for tok in &tokens[consumed..] {
        match *tok {
            "*" => {
                ty = Type::Pointer {
                    pointee: Box::new(ty),
                    pointee_is_const,
                };
                pointee_is_const = false;
            }
            // `char* const p`: the pointer itself is const.
            "const" => pointee_is_const = true,
            other if name.is_empty() => name = other.to_string(),
            other => return Err(invalid(format!("unexpected token '{other}'"))),
        }
    }

    Ok((ty, name))
}

/// Parse the parameter list between `(` and `)`.
fn parse_params(s: &str) -> Result<(Vec<Parameter>, bool)> {
    let s = s.trim();
    if s.is_empty() || s == "void" {
        return Ok((Vec::new(), false));
    }

    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let mut params = Vec::new();
    let mut is_variadic = false;

    for (i, part) in parts.iter().enumerate() {
        if *part == "..." {
            if i != parts.len() - 1 {
                return Err(invalid("'...' must be the last parameter"));
            }
            is_variadic = true;
            continue;
        }
        let (ty, name) = parse_declaration(part)?;
        if ty.is_void() {
            return Err(invalid("'void' parameter must be the only parameter"));
        }
        params.push(Parameter::new(name, ty));
    }

    Ok((params, is_variadic))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_function() {
        let decl = parse_function("double sin(double x)").unwrap();
        assert_eq!(decl.name, "sin");
        assert_eq!(decl.return_type, Type::floating(8, "double"));
        assert_eq!(decl.parameters.len(), 1);
        assert_eq!(decl.parameters[0].name, "x");
        assert!(!decl.is_variadic);
    }

    #[test]
    fn parse_void_return() {
        let decl = parse_function("void free(void* ptr)").unwrap();
        assert_eq!(decl.return_type, Type::Void);
        assert_eq!(decl.parameters[0].ty, Type::pointer_to(Type::Void));
    }

    #[test]
    fn parse_const_char_pointer() {
        let decl = parse_function("int puts(const char* s);").unwrap();
        assert_eq!(decl.parameters[0].ty, Type::const_pointer_to(Type::Char));
        assert_eq!(decl.parameters[0].ty.declare("s"), "const char *s");
    }

    #[test]
    fn parse_variadic() {
        let decl = parse_function("int printf(const char* fmt, ...)").unwrap();
        assert_eq!(decl.name, "printf");
        assert!(decl.is_variadic);
        assert_eq!(decl.parameters.len(), 1);
    }

    #[test]
    fn parse_integer_widths() {
        let decl =
            parse_function("uint64_t mix(unsigned char a, short b, unsigned long long c)").unwrap();
        assert_eq!(decl.return_type, Type::integer(8, false, "uint64_t"));
        assert_eq!(decl.parameters[0].ty, Type::integer(1, false, "unsigned char"));
        assert_eq!(decl.parameters[1].ty, Type::integer(2, true, "short"));
        assert_eq!(
            decl.parameters[2].ty,
            Type::integer(8, false, "unsigned long long")
        );
    }

    #[test]
    fn parse_struct_pointer() {
        let decl = parse_function("struct node* next(struct node* n)").unwrap();
        match &decl.return_type {
            Type::Pointer { pointee, .. } => match pointee.as_ref() {
                Type::Record(decl) => assert_eq!(decl.spelling, "struct node"),
                other => panic!("unexpected pointee {other:?}"),
            },
            other => panic!("unexpected return {other:?}"),
        }
    }

    #[test]
    fn parse_no_param_names() {
        let decl = parse_function("float sqrtf(float)").unwrap();
        assert!(decl.parameters[0].name.is_empty());
    }

    #[test]
    fn parse_void_params() {
        let decl = parse_function("int getpid(void)").unwrap();
        assert!(decl.parameters.is_empty());
    }

    #[test]
    fn long_double_is_unsupported() {
        let decl = parse_function("long double fabsl(long double x)").unwrap();
        assert!(matches!(decl.return_type, Type::Unsupported { .. }));
    }

    #[test]
    fn parse_globals() {
        let counter = parse_global("const int32_t counter;").unwrap();
        assert_eq!(counter.name, "counter");
        assert!(counter.is_const);

        let name = parse_global("const char* program_name").unwrap();
        assert!(!name.is_const);
        assert_eq!(name.ty, Type::const_pointer_to(Type::Char));
    }

    #[test]
    fn parse_errors() {
        assert!(parse_function("").is_err());
        assert!(parse_function("double sin double x").is_err());
        assert!(parse_function("int f(int a, ..., int b)").is_err());
        assert!(parse_function("quux f(int a)").is_err());
        assert!(parse_global("int").is_err());
    }
}
