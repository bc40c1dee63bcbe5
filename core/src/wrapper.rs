//! Rendering of externally callable wrapper signatures.
//!
//! Site assembly generates one Python wrapper per command so the script can
//! be exposed as a tool. This module produces the `def` line for such a
//! wrapper from a [`CommandSignature`].

use crate::{CommandSignature, DefaultValue, ParameterKind, ParameterSpec, sanitize_identifier};

/// Builds the wrapper function name for one command of one script.
///
/// `function` is the command's Python function name, not its explicit
/// marker name, so wrappers stay stable when a command is renamed on the
/// command line.
///
/// # Examples
///
/// ```
/// use script_manifest_core::wrapper_function_name;
///
/// assert_eq!(wrapper_function_name("hello_world", "greet"), "hello_world_greet");
/// assert_eq!(wrapper_function_name("2fa", "Show Codes"), "_2fa_show_codes");
/// ```
pub fn wrapper_function_name(script_identifier: &str, function: &str) -> String {
    sanitize_identifier(&format!("{script_identifier}_{function}"))
}

/// Renders one parameter as `name: type[ = default]`.
///
/// Defaults that are not literals render as `None` so the rendered
/// signature stays valid when later parameters carry defaults.
pub fn render_parameter(parameter: &ParameterSpec) -> String {
    match &parameter.default {
        DefaultValue::NoDefault => format!("{}: {}", parameter.name, parameter.type_text),
        DefaultValue::NotALiteral => {
            format!("{}: {} = None", parameter.name, parameter.type_text)
        }
        DefaultValue::Literal(value) => format!(
            "{}: {} = {}",
            parameter.name,
            parameter.type_text,
            value.to_python()
        ),
    }
}

/// Renders the `def` line of a wrapper for `signature`.
///
/// A `/` follows the last positional-only parameter and a bare `*` precedes
/// the first keyword-only one, so a required keyword-only parameter after a
/// defaulted one still renders as valid Python.
///
/// # Examples
///
/// ```
/// use script_manifest_core::*;
///
/// let sig = CommandSignature::new("greet")
///     .with_parameter(ParameterSpec::new("name", "str"))
///     .with_parameter(
///         ParameterSpec::new("count", "int")
///             .with_default(DefaultValue::Literal(LiteralValue::Int(5))),
///     );
/// assert_eq!(
///     render_wrapper_signature("hello_greet", &sig),
///     "def hello_greet(name: str, count: int = 5):"
/// );
/// ```
pub fn render_wrapper_signature(function_name: &str, signature: &CommandSignature) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(signature.parameters.len() + 2);
    let last_positional_only = signature
        .parameters
        .iter()
        .rposition(|p| p.kind == ParameterKind::PositionalOnly);
    let mut keyword_only_started = false;

    for (index, parameter) in signature.parameters.iter().enumerate() {
        if parameter.kind == ParameterKind::KeywordOnly && !keyword_only_started {
            parts.push("*".to_string());
            keyword_only_started = true;
        }
        parts.push(render_parameter(parameter));
        if Some(index) == last_positional_only {
            parts.push("/".to_string());
        }
    }

    format!("def {function_name}({}):", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LiteralValue;

    #[test]
    fn test_not_a_literal_renders_as_none_default() {
        let param = ParameterSpec::new("stamp", "str").with_default(DefaultValue::NotALiteral);
        assert_eq!(render_parameter(&param), "stamp: str = None");
    }

    #[test]
    fn test_literal_none_default_is_kept() {
        let param = ParameterSpec::new("name", "Optional[str]")
            .with_default(DefaultValue::Literal(LiteralValue::None));
        assert_eq!(render_parameter(&param), "name: Optional[str] = None");
    }

    #[test]
    fn test_keyword_only_parameters_get_a_bare_star() {
        let sig = CommandSignature::new("f")
            .with_parameter(ParameterSpec::new("a", "str"))
            .with_parameter(
                ParameterSpec::new("b", "int")
                    .with_default(DefaultValue::Literal(LiteralValue::Int(1)))
                    .with_kind(ParameterKind::KeywordOnly),
            )
            .with_parameter(ParameterSpec::new("c", "str").with_kind(ParameterKind::KeywordOnly));
        assert_eq!(
            render_wrapper_signature("x_f", &sig),
            "def x_f(a: str, *, b: int = 1, c: str):"
        );
    }

    #[test]
    fn test_positional_only_parameters_get_a_slash() {
        let sig = CommandSignature::new("f")
            .with_parameter(ParameterSpec::new("a", "str").with_kind(ParameterKind::PositionalOnly))
            .with_parameter(ParameterSpec::new("b", "str"))
            .with_parameter(ParameterSpec::new("c", "str").with_kind(ParameterKind::KeywordOnly));
        assert_eq!(
            render_wrapper_signature("x_f", &sig),
            "def x_f(a: str, /, b: str, *, c: str):"
        );
    }

    #[test]
    fn test_string_default_uses_python_quoting() {
        let sig = CommandSignature::new("say").with_parameter(
            ParameterSpec::new("word", "str")
                .with_default(DefaultValue::Literal(LiteralValue::Str("hi".into()))),
        );
        assert_eq!(
            render_wrapper_signature("x_say", &sig),
            "def x_say(word: str = 'hi'):"
        );
    }
}
