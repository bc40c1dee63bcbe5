//! Type definitions for script manifests and command signatures.
//!
//! This module defines the value results produced by the metadata block
//! parser and the command-signature extractor. Every type is a plain
//! serializable value: results are created fresh per parse call and never
//! mutated by the extractors afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Version of the catalog contract (semver).
///
/// Embedded in every [`ScriptCatalog`](crate::ScriptCatalog) to track
/// compatibility with downstream site-assembly tooling.
pub const CATALOG_CONTRACT_VERSION: &str = "1.0.0";

/// Metadata key that always resolves to a list.
pub const DEPENDENCIES_KEY: &str = "dependencies";

/// Metadata key whose value overrides the synthesized script source.
pub const EXTERNAL_SOURCE_KEY: &str = "external_source";

/// Type text used when a parameter has no renderable annotation.
pub const DEFAULT_TYPE_TEXT: &str = "str";

/// Value of one metadata entry.
///
/// Serialized untagged: a scalar is a JSON string, a list is a JSON array.
///
/// # Examples
///
/// ```
/// use script_manifest_core::MetadataValue;
///
/// let value = MetadataValue::List(vec!["typer".into()]);
/// assert_eq!(value.as_list(), Some(&["typer".to_string()][..]));
/// assert_eq!(value.as_scalar(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Plain string value with surrounding quotes stripped.
    Scalar(String),
    /// Ordered list of strings; may be empty.
    List(Vec<String>),
}

impl MetadataValue {
    /// Returns the scalar text, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::List(_) => None,
        }
    }

    /// Returns the list items, if this is a list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Scalar(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<Vec<String>> for MetadataValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Ordered metadata recovered from a script's embedded manifest block.
///
/// Keys keep the position of their first occurrence; inserting an existing
/// key replaces its value (last write wins).
///
/// # Examples
///
/// ```
/// use script_manifest_core::{MetadataValue, ScriptMetadata};
///
/// let mut metadata = ScriptMetadata::new();
/// metadata.insert("title", MetadataValue::from("Hello"));
/// metadata.insert("version", MetadataValue::from("0.1.0"));
/// metadata.insert("title", MetadataValue::from("Hello World"));
///
/// let keys: Vec<&str> = metadata.keys().collect();
/// assert_eq!(keys, ["title", "version"]);
/// assert_eq!(metadata.title(), Some("Hello World"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptMetadata {
    /// Entries in file order.
    pub entries: IndexMap<String, MetadataValue>,
    /// Where the script can be fetched from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_source: Option<String>,
}

impl ScriptMetadata {
    /// Creates an empty metadata mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry, keeping the key's original position.
    ///
    /// Scalar values for [`DEPENDENCIES_KEY`] are coerced to a one-element
    /// list (or an empty list when blank) so that key is never a scalar.
    pub fn insert(&mut self, key: impl Into<String>, value: MetadataValue) {
        let key = key.into();
        let value = match value {
            MetadataValue::Scalar(text) if key == DEPENDENCIES_KEY => {
                if text.trim().is_empty() {
                    MetadataValue::List(Vec::new())
                } else {
                    MetadataValue::List(vec![text])
                }
            }
            other => other,
        };
        self.entries.insert(key, value);
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.get(key)
    }

    /// Returns the value under `key` if it is a scalar.
    pub fn get_scalar(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MetadataValue::as_scalar)
    }

    /// Returns the value under `key` if it is a list.
    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(MetadataValue::as_list)
    }

    /// Number of entries (excluding `script_source`).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the block had no entries or was absent.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// The `title` entry, when it is a scalar.
    pub fn title(&self) -> Option<&str> {
        self.get_scalar("title")
    }

    /// The `description` entry, when it is a scalar.
    pub fn description(&self) -> Option<&str> {
        self.get_scalar("description")
    }

    /// The title, or `Untitled Script`.
    pub fn title_or_default(&self) -> &str {
        self.title().unwrap_or("Untitled Script")
    }

    /// The description, or `No description provided.`.
    pub fn description_or_default(&self) -> &str {
        self.description().unwrap_or("No description provided.")
    }

    /// Dependencies declared by the script (empty when the key is absent).
    pub fn dependencies(&self) -> &[String] {
        self.get_list(DEPENDENCIES_KEY).unwrap_or(&[])
    }

    /// Fills [`script_source`](Self::script_source) from a base URL and the
    /// script's relative path, unless an `external_source` already set it.
    ///
    /// Returns the resolved source.
    ///
    /// # Examples
    ///
    /// ```
    /// use script_manifest_core::ScriptMetadata;
    ///
    /// let mut metadata = ScriptMetadata::new();
    /// let source = metadata.resolve_script_source("https://example.org/tools/", "/hello/0.1.0.py");
    /// assert_eq!(source, "https://example.org/tools/hello/0.1.0.py");
    /// ```
    pub fn resolve_script_source(&mut self, base_url: &str, relative_path: &str) -> &str {
        if self.script_source.is_none() {
            let base = base_url.trim_end_matches('/');
            let path = relative_path.trim_start_matches("./").trim_start_matches('/');
            self.script_source = Some(format!("{base}/{path}"));
        }
        self.script_source.as_deref().unwrap_or_default()
    }
}

/// A constant literal recovered from source text without evaluation.
///
/// # Examples
///
/// ```
/// use script_manifest_core::LiteralValue;
///
/// let value = LiteralValue::List(vec![LiteralValue::Int(1), LiteralValue::Str("a".into())]);
/// assert_eq!(value.to_python(), "[1, 'a']");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum LiteralValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<LiteralValue>),
    Tuple(Vec<LiteralValue>),
    Set(Vec<LiteralValue>),
    Dict(Vec<(LiteralValue, LiteralValue)>),
}

impl LiteralValue {
    /// Returns the string payload, if this is a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` for `None`, booleans, numbers, and strings.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::None | Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Str(_)
        )
    }
}

/// Default classification of one command parameter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    /// The parameter declares no default expression.
    #[default]
    NoDefault,
    /// A default expression exists but is not a constant literal.
    NotALiteral,
    /// The default is a constant literal.
    Literal(LiteralValue),
}

impl DefaultValue {
    /// Returns the literal, if the default is one.
    pub fn literal(&self) -> Option<&LiteralValue> {
        match self {
            Self::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` when the parameter declared any default expression.
    pub fn is_declared(&self) -> bool {
        !matches!(self, Self::NoDefault)
    }
}

/// How a parameter may be passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Ordinary parameter (the default).
    #[default]
    PositionalOrKeyword,
    /// Declared before a `/` separator.
    PositionalOnly,
    /// Declared after `*` or `*args`.
    KeywordOnly,
}

/// One parameter of a command function.
///
/// Defaults are trailing among the positional parameters only. Python lets
/// a required keyword-only parameter follow a defaulted one, so
/// [`KeywordOnly`](ParameterKind::KeywordOnly) parameters are exempt.
///
/// # Examples
///
/// ```
/// use script_manifest_core::{DefaultValue, LiteralValue, ParameterSpec};
///
/// let count = ParameterSpec::new("count", "int")
///     .with_default(DefaultValue::Literal(LiteralValue::Int(5)));
/// assert_eq!(count.type_text, "int");
/// assert!(count.default.is_declared());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    /// Source rendering of the annotation, or [`DEFAULT_TYPE_TEXT`].
    #[serde(rename = "type")]
    pub type_text: String,
    #[serde(default)]
    pub default: DefaultValue,
    #[serde(default)]
    pub kind: ParameterKind,
}

impl ParameterSpec {
    pub fn new(name: &str, type_text: &str) -> Self {
        Self {
            name: name.to_string(),
            type_text: type_text.to_string(),
            default: DefaultValue::NoDefault,
            kind: ParameterKind::PositionalOrKeyword,
        }
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = default;
        self
    }

    pub fn with_kind(mut self, kind: ParameterKind) -> Self {
        self.kind = kind;
        self
    }
}

/// The decorator call that marked a function as a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMarker {
    /// Receiver of the marker attribute (`app` in `@app.command()`).
    pub receiver: String,
    /// Marker attribute name (`command`).
    pub attribute: String,
    /// Name passed to the marker call, e.g. `@app.command("hello")`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_name: Option<String>,
}

/// Reconstructed signature of one command entry point.
///
/// # Examples
///
/// ```
/// use script_manifest_core::{CommandSignature, ParameterSpec};
///
/// let sig = CommandSignature::new("greet")
///     .with_parameter(ParameterSpec::new("name", "str"));
/// assert_eq!(sig.invocation_name(), "greet");
/// assert!(sig.find_parameter("name").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandSignature {
    /// Function name.
    pub name: String,
    /// Parameters in declaration order.
    pub parameters: Vec<ParameterSpec>,
    #[serde(default)]
    pub marker: CommandMarker,
    /// First-statement docstring, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
}

impl CommandSignature {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Looks a parameter up by name.
    pub fn find_parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Name the command is invoked by: the explicit marker name when given,
    /// otherwise the function name.
    pub fn invocation_name(&self) -> &str {
        self.marker.explicit_name.as_deref().unwrap_or(&self.name)
    }

    /// Parameters that can be passed by position, in declaration order.
    ///
    /// Within these, parameters with a default always follow those without.
    pub fn positional_parameters(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters
            .iter()
            .filter(|p| p.kind != ParameterKind::KeywordOnly)
    }

    /// Parameters after `*` or `*args`, in declaration order.
    pub fn keyword_only_parameters(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters
            .iter()
            .filter(|p| p.kind == ParameterKind::KeywordOnly)
    }

    /// Number of parameters that declare a default expression.
    pub fn default_count(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| p.default.is_declared())
            .count()
    }
}
