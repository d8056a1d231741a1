//! Managed names derived from selectors.

use cinterop_index::ObjCMethod;

/// Managed parameter names of `method`.
///
/// All names but the first come from the selector keywords (`_N` when a
/// keyword is empty). The first one is the source name of the parameter,
/// or for constructors and factories the part of the first keyword after
/// `init`/`initWith`. Variadic methods get a trailing `args`. Clashes are
/// resolved by prefixing underscores.
pub fn parameter_names(method: &ObjCMethod, for_constructor_or_factory: bool) -> Vec<String> {
    let selector_parts: Vec<&str> = method.selector.split(':').collect();
    let mut result: Vec<String> = Vec::with_capacity(method.parameters.len() + 1);

    for index in 1..method.parameters.len() {
        let name = match selector_parts.get(index) {
            Some(part) if !part.is_empty() => part.to_string(),
            _ => format!("_{index}"),
        };
        let name = mangled(name, &result);
        result.push(name);
    }

    if !method.parameters.is_empty() {
        let name = first_parameter_candidate(method, for_constructor_or_factory);
        let name = mangled(name, &result);
        result.insert(0, name);
    }

    if method.is_variadic {
        let name = mangled("args".to_string(), &result);
        result.push(name);
    }

    result
}

fn mangled(mut name: String, taken: &[String]) -> String {
    while taken.contains(&name) {
        name.insert(0, '_');
    }
    name
}

fn first_parameter_candidate(method: &ObjCMethod, for_constructor_or_factory: bool) -> String {
    if for_constructor_or_factory {
        let first_part = method
            .selector
            .split(':')
            .next()
            .unwrap_or_default()
            .trim_start_matches('_');
        if let Some(rest) = first_part.strip_prefix("init") {
            let rest = rest.strip_prefix("With").unwrap_or(rest);
            if !rest.is_empty() {
                return decapitalize(rest);
            }
        }
    }
    match method.parameters.first() {
        Some(p) if !p.name.is_empty() => p.name.clone(),
        _ => "_0".to_string(),
    }
}

fn decapitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Managed name of a method: its first selector keyword. Names clashing
/// with `equals`, `hashCode` or `toString` of the managed root class get a
/// trailing `_`.
pub fn managed_name(method: &ObjCMethod) -> String {
    let candidate = method.selector.split(':').next().unwrap_or_default();
    let trimmed = candidate.trim_end_matches('_');
    let arity = method.parameters.len();
    if (trimmed == "equals" && arity == 1)
        || ((trimmed == "hashCode" || trimmed == "toString") && arity == 0)
    {
        format!("{candidate}_")
    } else {
        candidate.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinterop_index::{Parameter, Type};

    fn method(selector: &str, parameters: &[&str]) -> ObjCMethod {
        ObjCMethod::new(
            selector,
            "v@:",
            parameters
                .iter()
                .map(|name| Parameter::new(*name, Type::int()))
                .collect(),
            Type::Void,
        )
    }

    #[test]
    fn initializer_names_for_constructor() {
        let init = method("initWithName:age:", &["n", "a"]);
        assert_eq!(parameter_names(&init, true), vec!["name", "age"]);
        assert_eq!(parameter_names(&init, false), vec!["n", "age"]);
    }

    #[test]
    fn empty_keywords_and_clashes() {
        let m = method("setValue:value:", &["value", "other"]);
        assert_eq!(parameter_names(&m, false), vec!["_value", "value"]);

        let anonymous = method("combine::", &["", ""]);
        assert_eq!(parameter_names(&anonymous, false), vec!["_0", "_1"]);
    }

    #[test]
    fn variadic_methods_take_args() {
        let mut m = method("arrayWithObjects:", &["firstObj"]);
        m.is_variadic = true;
        assert_eq!(parameter_names(&m, false), vec!["firstObj", "args"]);
    }

    #[test]
    fn plain_init_keeps_source_name() {
        let init = method("init:", &["x"]);
        assert_eq!(parameter_names(&init, true), vec!["x"]);
        let underscored = method("_initWithFrame:", &["f"]);
        assert_eq!(parameter_names(&underscored, true), vec!["frame"]);
    }

    #[test]
    fn root_class_clashes_are_renamed() {
        assert_eq!(managed_name(&method("hashCode", &[])), "hashCode_");
        assert_eq!(managed_name(&method("equals:", &["o"])), "equals_");
        assert_eq!(managed_name(&method("equals:to:", &["a", "b"])), "equals");
        assert_eq!(managed_name(&method("setTitle:", &["t"])), "setTitle");
    }
}
