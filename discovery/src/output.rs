//! Output formatting for metadata, command signatures, reports and catalogs.

use script_manifest_core::{
    CommandSignature, DefaultValue, ParameterKind, ScriptCatalog, ScriptMetadata,
    format_metadata, render_wrapper_signature, sanitize_identifier, wrapper_function_name,
};
use serde::Serialize;

use crate::inspect::ScriptReport;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
}

fn serialize<T: Serialize>(value: &T, format: OutputFormat) -> Option<Result<String, String>> {
    match format {
        OutputFormat::Json => Some(
            serde_json::to_string_pretty(value)
                .map_err(|e| format!("JSON serialization failed: {e}")),
        ),
        OutputFormat::Yaml => Some(
            serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}")),
        ),
        OutputFormat::Markdown => None,
    }
}

/// Formats parsed metadata in the requested output format.
pub fn format_metadata_output(
    metadata: &ScriptMetadata,
    format: OutputFormat,
) -> Result<String, String> {
    serialize(metadata, format).unwrap_or_else(|| Ok(metadata_to_markdown(metadata)))
}

/// Formats extracted command signatures in the requested output format.
///
/// Markdown output shows wrapper signatures under `script_identifier`.
pub fn format_commands(
    commands: &[CommandSignature],
    script_identifier: &str,
    format: OutputFormat,
) -> Result<String, String> {
    serialize(&commands, format)
        .unwrap_or_else(|| Ok(commands_to_markdown(commands, script_identifier)))
}

/// Formats a full script report in the requested output format.
pub fn format_report(report: &ScriptReport, format: OutputFormat) -> Result<String, String> {
    serialize(report, format).unwrap_or_else(|| Ok(report_to_markdown(report)))
}

/// Formats a catalog in the requested output format.
pub fn format_catalog(catalog: &ScriptCatalog, format: OutputFormat) -> Result<String, String> {
    serialize(catalog, format).unwrap_or_else(|| Ok(catalog_to_markdown(catalog)))
}

fn metadata_to_markdown(metadata: &ScriptMetadata) -> String {
    let rows = format_metadata(metadata);
    if rows.is_empty() {
        return "_No metadata._\n".to_string();
    }

    let mut out = String::new();
    out.push_str("| Key | Value |\n");
    out.push_str("|-----|-------|\n");
    for row in rows {
        out.push_str(&format!(
            "| {} | {} |\n",
            row.label,
            escape_cell(&row.value)
        ));
    }
    out
}

fn commands_to_markdown(commands: &[CommandSignature], script_identifier: &str) -> String {
    if commands.is_empty() {
        return "_No commands._\n".to_string();
    }

    let mut out = String::new();
    for command in commands {
        out.push_str(&format!("### `{}`\n\n", command.invocation_name()));
        if let Some(doc) = &command.docstring {
            out.push_str(&format!("{doc}\n\n"));
        }

        let wrapper = wrapper_function_name(script_identifier, &command.name);
        out.push_str("```python\n");
        out.push_str(&render_wrapper_signature(&wrapper, command));
        out.push_str("\n```\n\n");

        if !command.parameters.is_empty() {
            out.push_str("| Parameter | Type | Default | Kind |\n");
            out.push_str("|-----------|------|---------|------|\n");
            for param in &command.parameters {
                let default = match &param.default {
                    DefaultValue::NoDefault => "-".to_string(),
                    DefaultValue::NotALiteral => "(computed)".to_string(),
                    DefaultValue::Literal(value) => format!("`{}`", value.to_python()),
                };
                let kind = match param.kind {
                    ParameterKind::PositionalOrKeyword => "positional or keyword",
                    ParameterKind::PositionalOnly => "positional only",
                    ParameterKind::KeywordOnly => "keyword only",
                };
                out.push_str(&format!(
                    "| `{}` | `{}` | {} | {kind} |\n",
                    param.name,
                    escape_cell(&param.type_text),
                    escape_cell(&default)
                ));
            }
            out.push('\n');
        }
    }
    out
}

fn report_to_markdown(report: &ScriptReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", report.metadata.title_or_default()));
    out.push_str(&format!("{}\n\n", report.metadata.description_or_default()));
    out.push_str(&format!("- **Path:** `{}`\n\n", report.path));

    out.push_str("## Metadata\n\n");
    out.push_str(&metadata_to_markdown(&report.metadata));
    out.push('\n');

    out.push_str("## Commands\n\n");
    out.push_str(&commands_to_markdown(
        &report.commands,
        &sanitize_identifier(&report.identifier_seed),
    ));

    if !report.warnings.is_empty() {
        out.push_str("## Warnings\n\n");
        for w in &report.warnings {
            out.push_str(&format!("- {w}\n"));
        }
    }

    out
}

fn catalog_to_markdown(catalog: &ScriptCatalog) -> String {
    let mut out = String::new();

    let title = catalog.name.as_deref().unwrap_or("Script Catalog");
    out.push_str(&format!("# {title}\n\n"));
    out.push_str(&format!("- **Version:** {}\n", catalog.version));
    out.push_str(&format!("- **Generated:** {}\n", catalog.generated_at));
    out.push_str(&format!("- **Scripts:** {}\n\n", catalog.script_count()));

    if catalog.scripts.is_empty() {
        return out;
    }

    out.push_str("| Identifier | Title | Commands | Path |\n");
    out.push_str("|------------|-------|----------|------|\n");
    for script in &catalog.scripts {
        let commands = script
            .commands
            .iter()
            .map(|c| format!("`{}`", c.invocation_name()))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "| `{}` | {} | {} | `{}` |\n",
            script.identifier,
            escape_cell(script.metadata.title_or_default()),
            commands,
            script.path
        ));
    }
    out
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use script_manifest_core::{LiteralValue, MetadataValue, ParameterSpec};

    fn sample_commands() -> Vec<CommandSignature> {
        vec![
            CommandSignature::new("greet")
                .with_parameter(ParameterSpec::new("name", "Optional[str]"))
                .with_parameter(
                    ParameterSpec::new("count", "int")
                        .with_default(DefaultValue::Literal(LiteralValue::Int(5))),
                ),
        ]
    }

    #[test]
    fn test_commands_markdown_shows_wrapper_signature() {
        let out = format_commands(&sample_commands(), "hello_world", OutputFormat::Markdown)
            .unwrap();
        assert!(out.contains("### `greet`"));
        assert!(out.contains("def hello_world_greet(name: Optional[str], count: int = 5):"));
        assert!(out.contains("| `count` | `int` | `5` | positional or keyword |"));
    }

    #[test]
    fn test_wrapper_name_uses_function_name() {
        let mut command = CommandSignature::new("purge_old")
            .with_parameter(ParameterSpec::new("days", "int"));
        command.marker.explicit_name = Some("purge".to_string());
        let out = format_commands(&[command], "cleanup", OutputFormat::Markdown).unwrap();
        assert!(out.contains("### `purge`"), "{out}");
        assert!(out.contains("def cleanup_purge_old(days: int):"), "{out}");
    }

    #[test]
    fn test_commands_json_shape() {
        let out = format_commands(&sample_commands(), "x", OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["name"], "greet");
        assert_eq!(value[0]["parameters"][1]["type"], "int");
        assert_eq!(value[0]["parameters"][0]["default"]["kind"], "no_default");
    }

    #[test]
    fn test_metadata_markdown_escapes_pipes() {
        let mut metadata = ScriptMetadata::new();
        metadata.insert("description", MetadataValue::from("a | b"));
        metadata.insert("dependencies", MetadataValue::List(vec!["typer".into()]));
        let out = format_metadata_output(&metadata, OutputFormat::Markdown).unwrap();
        assert!(out.contains("| Description | a \\| b |"));
        assert!(out.contains("| Dependencies | <ul><li>typer</li></ul> |"));
    }

    #[test]
    fn test_empty_metadata_markdown() {
        let out = format_metadata_output(&ScriptMetadata::new(), OutputFormat::Markdown).unwrap();
        assert_eq!(out, "_No metadata._\n");
    }

    #[test]
    fn test_metadata_yaml_keeps_order() {
        let mut metadata = ScriptMetadata::new();
        metadata.insert("title", MetadataValue::from("Hello"));
        metadata.insert("author", MetadataValue::from("me"));
        let out = format_metadata_output(&metadata, OutputFormat::Yaml).unwrap();
        let title = out.find("title").unwrap();
        let author = out.find("author").unwrap();
        assert!(title < author);
    }
}
