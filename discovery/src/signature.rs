//! Static extraction of command signatures from Python syntax trees.
//!
//! Scripts mark their command entry points with a decorator call such as
//! `@app.command()`. [`CommandExtractor`] finds those functions in a
//! tree-sitter syntax tree and reconstructs their parameters (names,
//! annotation text, literal defaults) without importing or running the
//! script, since such scripts may have unmet dependencies or side effects.
//!
//! Only module-level functions are considered. Decorators are classified
//! into a closed set of shapes ([`DecoratorShape`]); only an attribute call
//! whose attribute is a configured marker name counts as a command marker.
//! Defaults go through [`parse_literal`], so anything that is not a
//! constant (a call, a name, an operator expression) is reported as
//! [`DefaultValue::NotALiteral`] rather than evaluated.

use script_manifest_core::{
    CommandMarker, CommandSignature, DefaultValue, LiteralValue, ParameterKind, ParameterSpec,
    parse_literal,
};
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use crate::config::ExtractorConfig;
use crate::error::{InspectError, Result};

/// Parses Python source into a tree-sitter syntax tree.
///
/// # Errors
///
/// Returns [`Grammar`](InspectError::Grammar) if the Python grammar cannot
/// be loaded, or [`SyntaxTree`](InspectError::SyntaxTree) if the parser
/// yields no tree. Syntax errors in the source do not fail; they surface as
/// error nodes that the extractor skips.
pub fn parse_python(source: &str) -> Result<Tree> {
    // Parsers are not shareable across threads; build one per call.
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|err| InspectError::Grammar(err.to_string()))?;
    parser
        .parse(source, None)
        .ok_or_else(|| InspectError::SyntaxTree("parser returned no tree".to_string()))
}

/// Extracts command signatures from Python source with default settings.
///
/// # Examples
///
/// ```
/// use script_manifest_core::{DefaultValue, LiteralValue};
/// use script_manifest_discovery::signature::extract_commands;
///
/// let source = "\
/// @app.command()
/// def greet(name: str, count: int = 5):
///     pass
/// ";
/// let commands = extract_commands(source).unwrap();
/// assert_eq!(commands[0].name, "greet");
/// assert_eq!(commands[0].parameters[1].default, DefaultValue::Literal(LiteralValue::Int(5)));
/// ```
pub fn extract_commands(source: &str) -> Result<Vec<CommandSignature>> {
    CommandExtractor::default().extract_source(source)
}

/// Syntactic shape of a decorator expression.
#[derive(Debug, Clone, Copy)]
pub enum DecoratorShape<'tree> {
    /// `@receiver.attribute(...)`
    AttributeCall {
        receiver: Node<'tree>,
        attribute: Node<'tree>,
        arguments: Option<Node<'tree>>,
    },
    /// `@callee(...)` where the callee is not an attribute access.
    Call { callee: Node<'tree> },
    /// `@receiver.attribute`
    Attribute {
        receiver: Node<'tree>,
        attribute: Node<'tree>,
    },
    /// `@name`
    Name(Node<'tree>),
    /// Anything else (subscripts, lambdas, error nodes).
    Unrecognized,
}

impl<'tree> DecoratorShape<'tree> {
    /// Classifies the expression inside a `decorator` node.
    pub fn classify(decorator: Node<'tree>) -> Self {
        let Some(expr) = first_named_child(decorator) else {
            return Self::Unrecognized;
        };
        match expr.kind() {
            "call" => {
                let Some(function) = expr.child_by_field_name("function") else {
                    return Self::Unrecognized;
                };
                let arguments = expr.child_by_field_name("arguments");
                if function.kind() == "attribute" {
                    match (
                        function.child_by_field_name("object"),
                        function.child_by_field_name("attribute"),
                    ) {
                        (Some(receiver), Some(attribute)) => Self::AttributeCall {
                            receiver,
                            attribute,
                            arguments,
                        },
                        _ => Self::Unrecognized,
                    }
                } else {
                    Self::Call { callee: function }
                }
            }
            "attribute" => match (
                expr.child_by_field_name("object"),
                expr.child_by_field_name("attribute"),
            ) {
                (Some(receiver), Some(attribute)) => Self::Attribute {
                    receiver,
                    attribute,
                },
                _ => Self::Unrecognized,
            },
            "identifier" => Self::Name(expr),
            _ => Self::Unrecognized,
        }
    }
}

/// Finds command entry points in Python syntax trees.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    markers: Vec<String>,
    fallback_type: String,
}

impl Default for CommandExtractor {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}

impl CommandExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            markers: config.marker_attributes.clone(),
            fallback_type: config.fallback_type.clone(),
        }
    }

    /// Parses `source` and extracts its commands.
    pub fn extract_source(&self, source: &str) -> Result<Vec<CommandSignature>> {
        let tree = parse_python(source)?;
        Ok(self.extract(&tree, source))
    }

    /// Extracts commands from an already parsed tree, in file order.
    ///
    /// `source` must be the text the tree was parsed from.
    pub fn extract(&self, tree: &Tree, source: &str) -> Vec<CommandSignature> {
        let bytes = source.as_bytes();
        let root = tree.root_node();
        let mut commands = Vec::new();

        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            if node.kind() != "decorated_definition" {
                continue;
            }
            let Some(definition) = node.child_by_field_name("definition") else {
                continue;
            };
            if definition.kind() != "function_definition" {
                continue;
            }
            let Some(marker) = self.find_marker(node, bytes) else {
                continue;
            };
            if let Some(signature) = self.build_signature(definition, marker, bytes) {
                debug!(
                    command = %signature.name,
                    parameters = signature.parameters.len(),
                    "found command"
                );
                commands.push(signature);
            }
        }

        commands
    }

    fn find_marker(&self, decorated: Node<'_>, source: &[u8]) -> Option<CommandMarker> {
        let mut cursor = decorated.walk();
        let decorators: Vec<Node<'_>> = decorated
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "decorator")
            .collect();

        decorators
            .into_iter()
            .find_map(|decorator| match DecoratorShape::classify(decorator) {
                DecoratorShape::AttributeCall {
                    receiver,
                    attribute,
                    arguments,
                } => {
                    let attribute = node_text(attribute, source)?;
                    if !self.markers.iter().any(|m| m == attribute) {
                        return None;
                    }
                    Some(CommandMarker {
                        receiver: node_text(receiver, source)?.to_string(),
                        attribute: attribute.to_string(),
                        explicit_name: arguments.and_then(|args| explicit_name(args, source)),
                    })
                }
                DecoratorShape::Call { .. }
                | DecoratorShape::Attribute { .. }
                | DecoratorShape::Name(_)
                | DecoratorShape::Unrecognized => None,
            })
    }

    fn build_signature(
        &self,
        function: Node<'_>,
        marker: CommandMarker,
        source: &[u8],
    ) -> Option<CommandSignature> {
        let name = node_text(function.child_by_field_name("name")?, source)?;
        let parameters = function
            .child_by_field_name("parameters")
            .map(|params| self.collect_parameters(params, source))
            .unwrap_or_default();
        let docstring = function
            .child_by_field_name("body")
            .and_then(|body| docstring(body, source));

        Some(CommandSignature {
            name: name.to_string(),
            parameters,
            marker,
            docstring,
        })
    }

    fn collect_parameters(&self, params: Node<'_>, source: &[u8]) -> Vec<ParameterSpec> {
        let mut out: Vec<ParameterSpec> = Vec::new();
        let mut keyword_only = false;

        let mut cursor = params.walk();
        for child in params.named_children(&mut cursor) {
            let (name_node, type_node, value_node) = match child.kind() {
                "identifier" => (Some(child), None, None),
                "typed_parameter" => {
                    let target = first_named_child(child);
                    match target.map(|t| t.kind()) {
                        Some("identifier") => (target, child.child_by_field_name("type"), None),
                        Some("list_splat_pattern") => {
                            keyword_only = true;
                            continue;
                        }
                        _ => continue,
                    }
                }
                "default_parameter" => (
                    child.child_by_field_name("name"),
                    None,
                    child.child_by_field_name("value"),
                ),
                "typed_default_parameter" => (
                    child.child_by_field_name("name"),
                    child.child_by_field_name("type"),
                    child.child_by_field_name("value"),
                ),
                "list_splat_pattern" | "keyword_separator" => {
                    keyword_only = true;
                    continue;
                }
                "positional_separator" => {
                    for param in &mut out {
                        param.kind = ParameterKind::PositionalOnly;
                    }
                    continue;
                }
                _ => continue,
            };

            let Some(name) = name_node.and_then(|node| node_text(node, source)) else {
                continue;
            };
            let type_text = type_node
                .and_then(|node| render_type(node, source))
                .unwrap_or_else(|| self.fallback_type.clone());
            let default = match value_node {
                Some(value) => literal_default(value, source),
                None => DefaultValue::NoDefault,
            };
            let kind = if keyword_only {
                ParameterKind::KeywordOnly
            } else {
                ParameterKind::PositionalOrKeyword
            };

            out.push(
                ParameterSpec::new(name, &type_text)
                    .with_default(default)
                    .with_kind(kind),
            );
        }

        out
    }
}

fn node_text<'s>(node: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    node.utf8_text(source).ok()
}

fn first_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");
    found
}

/// Renders an annotation as single-line source text.
fn render_type(node: Node<'_>, source: &[u8]) -> Option<String> {
    if node.has_error() {
        return None;
    }
    let text = node_text(node, source)?;
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let rendered = tighten_brackets(&collapsed);
    (!rendered.is_empty()).then_some(rendered)
}

/// Drops spaces just inside brackets and before commas, so
/// `Dict[ str , int ]` reads `Dict[str, int]`.
fn tighten_brackets(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ' ' {
            let after_open = out.ends_with(['[', '(']);
            let before_close = matches!(chars.peek(), Some(']' | ')' | ','));
            if after_open || before_close {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn literal_default(value: Node<'_>, source: &[u8]) -> DefaultValue {
    if value.has_error() {
        return DefaultValue::NotALiteral;
    }
    let Some(text) = node_text(value, source) else {
        return DefaultValue::NotALiteral;
    };
    match parse_literal(text) {
        Ok(literal) => DefaultValue::Literal(literal),
        Err(err) => {
            debug!(default = text, reason = %err, "default is not a literal");
            DefaultValue::NotALiteral
        }
    }
}

/// Reads a command name passed to the marker call, either as the first
/// positional string argument or as `name="..."`.
fn explicit_name(arguments: Node<'_>, source: &[u8]) -> Option<String> {
    let mut cursor = arguments.walk();
    let mut positional_seen = false;
    for arg in arguments.named_children(&mut cursor) {
        let value = match arg.kind() {
            "comment" => continue,
            "keyword_argument" => {
                let key = arg
                    .child_by_field_name("name")
                    .and_then(|n| node_text(n, source));
                if key != Some("name") {
                    continue;
                }
                arg.child_by_field_name("value")
            }
            "list_splat" | "dictionary_splat" => continue,
            _ if !positional_seen => {
                positional_seen = true;
                Some(arg)
            }
            _ => continue,
        };
        let text = value.and_then(|v| node_text(v, source))?;
        if let Ok(LiteralValue::Str(name)) = parse_literal(text) {
            return Some(name);
        }
    }
    None
}

/// Returns the cleaned docstring when the body starts with a string.
fn docstring(body: Node<'_>, source: &[u8]) -> Option<String> {
    let statement = first_named_child(body)?;
    if statement.kind() != "expression_statement" {
        return None;
    }
    let expr = first_named_child(statement)?;
    if !matches!(expr.kind(), "string" | "concatenated_string") {
        return None;
    }
    match parse_literal(node_text(expr, source)?) {
        Ok(LiteralValue::Str(text)) => {
            let cleaned = clean_docstring(&text);
            (!cleaned.is_empty()).then_some(cleaned)
        }
        _ => None,
    }
}

/// Strips the common indentation of continuation lines and surrounding
/// blank lines.
fn clean_docstring(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default().trim();
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out: Vec<&str> = Vec::with_capacity(rest.len() + 1);
    out.push(first);
    for line in rest {
        out.push(line.get(indent..).unwrap_or("").trim_end());
    }
    while out.first().is_some_and(|line| line.is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|line| line.is_empty()) {
        out.pop();
    }
    out.join("\n")
}
