//! Display formatting for parsed script metadata.

use serde::{Deserialize, Serialize};

use crate::{MetadataValue, ScriptMetadata};

/// One display row produced by [`format_metadata`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedEntry {
    /// Title-cased key, e.g. `Requires-Python`.
    pub label: String,
    /// Scalar text, or `<ul><li>..</li></ul>` markup for lists.
    pub value: String,
}

/// Turns a metadata key into a display label.
///
/// Underscores become spaces, then each letter that follows a non-letter is
/// upper-cased and every other letter lower-cased.
///
/// # Examples
///
/// ```
/// use script_manifest_core::display_key;
///
/// assert_eq!(display_key("external_source"), "External Source");
/// assert_eq!(display_key("requires-python"), "Requires-Python");
/// ```
pub fn display_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut previous_is_letter = false;
    for ch in key.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    out
}

/// Renders list items as bullet markup, skipping empty items.
///
/// Item text is HTML-escaped.
pub fn bullet_list(items: &[String]) -> String {
    let mut out = String::from("<ul>");
    for item in items.iter().filter(|item| !item.is_empty()) {
        out.push_str("<li>");
        out.push_str(&escape_html(item));
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

/// Formats every entry for display, in file order.
///
/// A trailing `Script Source` row is added when the source is known.
///
/// # Examples
///
/// ```
/// use script_manifest_core::{MetadataValue, ScriptMetadata, format_metadata};
///
/// let mut metadata = ScriptMetadata::new();
/// metadata.insert("dependencies", MetadataValue::List(vec!["typer".into(), "".into()]));
///
/// let rows = format_metadata(&metadata);
/// assert_eq!(rows[0].label, "Dependencies");
/// assert_eq!(rows[0].value, "<ul><li>typer</li></ul>");
/// ```
pub fn format_metadata(metadata: &ScriptMetadata) -> Vec<FormattedEntry> {
    let mut rows: Vec<FormattedEntry> = metadata
        .iter()
        .map(|(key, value)| FormattedEntry {
            label: display_key(key),
            value: match value {
                MetadataValue::Scalar(text) => text.clone(),
                MetadataValue::List(items) => bullet_list(items),
            },
        })
        .collect();

    if let Some(source) = &metadata.script_source {
        rows.push(FormattedEntry {
            label: display_key("script_source"),
            value: source.clone(),
        });
    }
    rows
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}
