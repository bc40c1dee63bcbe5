//! Recovery parser for embedded script manifest blocks.
//!
//! A script may carry one manifest block inside its comments:
//!
//! ```text
//! # /// script
//! # title = "Hello World"
//! # dependencies = [
//! #   "typer",
//! # ]
//! # ///
//! ```
//!
//! The block has no formal grammar; it is hand-written and often sloppy.
//! [`MetadataParser`] walks it line by line with an explicit state machine
//! and never fails: every malformed line degrades to a fallback value and a
//! warning.
//!
//! | State              | Line                         | Transition                               |
//! |--------------------|------------------------------|------------------------------------------|
//! | `ExpectKey`        | contains `=`                 | begin key                                |
//! | `ExpectKey`        | anything else                | ignored                                  |
//! | `ScalarPending`    | contains `=`                 | commit scalar, begin key                 |
//! | `ScalarPending`    | comment without `=`          | ignored                                  |
//! | `ScalarPending`    | not a comment                | commit scalar → `ExpectKey`              |
//! | `ListContinuation` | comment                      | append items; `]` at end commits         |
//! | `ListContinuation` | not a comment                | commit list as-is → `ExpectKey`          |
//! | any                | end of block                 | commit pending                           |
//!
//! Beginning a key commits inline `[...]` lists immediately, opens a
//! `ListContinuation` for an unclosed `[`, and otherwise holds the value in
//! `ScalarPending`.

use std::sync::LazyLock;

use regex::Regex;
use script_manifest_core::{
    DEPENDENCIES_KEY, EXTERNAL_SOURCE_KEY, MetadataValue, ScriptMetadata, parse_string_list,
};
use tracing::debug;

/// Line that opens a manifest block.
pub const START_SENTINEL: &str = "# /// script";
/// Line that closes a manifest block.
pub const END_SENTINEL: &str = "# ///";

static BLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)# /// script\r?\n(.*?)# ///").expect("static regex must compile")
});

/// Returns the text between the start and end sentinels, if present.
///
/// # Examples
///
/// ```
/// use script_manifest_discovery::metadata::locate_block;
///
/// let text = "# /// script\n# title = \"x\"\n# ///\nprint()\n";
/// assert_eq!(locate_block(text), Some("# title = \"x\"\n"));
/// assert_eq!(locate_block("print()"), None);
/// ```
pub fn locate_block(text: &str) -> Option<&str> {
    BLOCK_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parses the manifest block of `text`, discarding warnings.
///
/// # Examples
///
/// ```
/// use script_manifest_discovery::metadata::parse_metadata;
///
/// let text = "# /// script\n# title = \"Hello\"\n# keywords = [\"a\", \"b\"]\n# ///\n";
/// let metadata = parse_metadata(text);
/// assert_eq!(metadata.title(), Some("Hello"));
/// assert_eq!(metadata.get_list("keywords").unwrap(), ["a", "b"]);
/// ```
pub fn parse_metadata(text: &str) -> ScriptMetadata {
    MetadataParser::new(text).parse()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseState {
    ExpectKey,
    ScalarPending { key: String, value: String },
    ListContinuation { key: String, items: Vec<String> },
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    text: &'a str,
    is_comment: bool,
    has_assignment: bool,
}

impl<'a> Line<'a> {
    fn classify(raw: &'a str) -> Self {
        let text = raw.trim();
        Self {
            text,
            is_comment: text.starts_with('#'),
            has_assignment: text.contains('='),
        }
    }
}

/// Line-oriented parser for one script's manifest block.
pub struct MetadataParser {
    text: String,
    warnings: Vec<String>,
}

impl MetadataParser {
    /// Creates a parser over the full text of a script.
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            warnings: Vec::new(),
        }
    }

    /// Recovery notes collected by the last [`parse`](Self::parse) call.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Parses the manifest block into ordered metadata.
    ///
    /// Returns empty metadata when the script has no block. When the block
    /// sets `external_source`, it becomes the `script_source`.
    pub fn parse(&mut self) -> ScriptMetadata {
        self.warnings.clear();
        let mut metadata = ScriptMetadata::new();

        let text = std::mem::take(&mut self.text);
        let Some(block) = locate_block(&text) else {
            debug!("no manifest block found");
            self.text = text;
            return metadata;
        };

        let mut state = ParseState::ExpectKey;
        for raw in block.trim().lines() {
            state = self.step(state, Line::classify(raw), &mut metadata);
        }
        self.finish(state, &mut metadata);

        match metadata.get(EXTERNAL_SOURCE_KEY).cloned() {
            Some(MetadataValue::Scalar(source)) => {
                metadata.script_source = Some(source);
            }
            Some(MetadataValue::List(_)) => {
                self.warn(format!(
                    "'{EXTERNAL_SOURCE_KEY}' is a list; ignoring it as script source"
                ));
            }
            None => {}
        }

        debug!(
            entries = metadata.len(),
            warnings = self.warnings.len(),
            "parsed manifest block"
        );
        self.text = text;
        metadata
    }

    fn step(
        &mut self,
        state: ParseState,
        line: Line<'_>,
        metadata: &mut ScriptMetadata,
    ) -> ParseState {
        match state {
            ParseState::ExpectKey if line.has_assignment => self.begin_key(line.text, metadata),
            ParseState::ExpectKey => ParseState::ExpectKey,
            ParseState::ScalarPending { key, value } if line.has_assignment => {
                self.commit_scalar(key, &value, metadata);
                self.begin_key(line.text, metadata)
            }
            ParseState::ScalarPending { key, value } if line.is_comment => {
                ParseState::ScalarPending { key, value }
            }
            ParseState::ScalarPending { key, value } => {
                self.warn(format!(
                    "value for '{key}' terminated by non-comment line: {}",
                    line.text
                ));
                self.commit_scalar(key, &value, metadata);
                ParseState::ExpectKey
            }
            ParseState::ListContinuation { key, mut items } if line.is_comment => {
                let content = strip_comment_marker(line.text);
                items.extend(collect_items(content));
                if line.text.ends_with(']') {
                    metadata.insert(key, MetadataValue::List(items));
                    ParseState::ExpectKey
                } else {
                    ParseState::ListContinuation { key, items }
                }
            }
            ParseState::ListContinuation { key, items } => {
                self.warn(format!(
                    "list for '{key}' terminated by non-comment line: {}",
                    line.text
                ));
                metadata.insert(key, MetadataValue::List(items));
                ParseState::ExpectKey
            }
        }
    }

    fn finish(&mut self, state: ParseState, metadata: &mut ScriptMetadata) {
        match state {
            ParseState::ExpectKey => {}
            ParseState::ScalarPending { key, value } => self.commit_scalar(key, &value, metadata),
            ParseState::ListContinuation { key, items } => {
                self.warn(format!("list for '{key}' is missing its closing ']'"));
                metadata.insert(key, MetadataValue::List(items));
            }
        }
    }

    fn begin_key(&mut self, line: &str, metadata: &mut ScriptMetadata) -> ParseState {
        let Some((left, right)) = line.split_once('=') else {
            return ParseState::ExpectKey;
        };
        let key = strip_comment_marker(left).trim();
        if key.is_empty() {
            self.warn(format!("skipping assignment without a key: {line}"));
            return ParseState::ExpectKey;
        }
        let key = key.to_string();
        let value = right.trim();

        if value.starts_with('[') && value.len() >= 2 && value.ends_with(']') {
            let parsed = match parse_string_list(value) {
                Ok(items) => MetadataValue::List(items),
                Err(err) if key == DEPENDENCIES_KEY => {
                    self.warn(format!("malformed list for '{key}' ({err}); using empty list"));
                    MetadataValue::List(Vec::new())
                }
                Err(err) => {
                    self.warn(format!("malformed list for '{key}' ({err}); keeping raw text"));
                    MetadataValue::Scalar(strip_quotes(value).to_string())
                }
            };
            metadata.insert(key, parsed);
            return ParseState::ExpectKey;
        }

        if let Some(head) = value.strip_prefix('[') {
            return ParseState::ListContinuation {
                key,
                items: collect_items(head),
            };
        }

        ParseState::ScalarPending {
            key,
            value: value.to_string(),
        }
    }

    fn commit_scalar(&mut self, key: String, value: &str, metadata: &mut ScriptMetadata) {
        if key == DEPENDENCIES_KEY {
            self.warn(format!("'{key}' is not a list; coercing scalar value"));
        }
        metadata.insert(key, MetadataValue::Scalar(strip_quotes(value).to_string()));
    }

    fn warn(&mut self, message: String) {
        debug!("{message}");
        self.warnings.push(message);
    }
}

/// Strips leading `#` markers and blanks.
fn strip_comment_marker(text: &str) -> &str {
    text.trim_start_matches(['#', ' ', '\t'])
}

/// Strips surrounding double quotes, then single quotes.
fn strip_quotes(text: &str) -> &str {
    text.trim_matches('"').trim_matches('\'')
}

/// Extracts list items from one continuation line's content.
///
/// Quoted items are parsed as literals, so a line may contribute several;
/// anything else falls back to one item with brackets, commas, and quotes
/// trimmed.
fn collect_items(content: &str) -> Vec<String> {
    let body = content
        .trim()
        .trim_matches(['[', ']', ','])
        .trim();
    if body.is_empty() {
        return Vec::new();
    }

    if let Ok(items) = parse_string_list(&format!("[{body}\n]")) {
        return items.into_iter().filter(|item| !item.is_empty()).collect();
    }

    let item = strip_quotes(body).trim();
    if item.is_empty() {
        Vec::new()
    } else {
        vec![item.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(lines: &[&str]) -> String {
        let mut text = String::from("#!/usr/bin/env python3\n# /// script\n");
        for line in lines {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str("# ///\n\nimport sys\n");
        text
    }

    #[test]
    fn test_no_block_yields_empty_metadata() {
        let mut parser = MetadataParser::new("import sys\n# title = \"nope\"\n");
        let metadata = parser.parse();
        assert!(metadata.is_empty());
        assert!(metadata.script_source.is_none());
        assert!(parser.warnings().is_empty());
    }

    #[test]
    fn test_scalars_have_quotes_stripped() {
        let metadata = parse_metadata(&block(&[
            "# title = \"Hello World\"",
            "# license = 'MIT'",
            "# version = 0.1.0",
            "# requires-python = \">=3.10\"",
        ]));
        assert_eq!(metadata.title(), Some("Hello World"));
        assert_eq!(metadata.get_scalar("license"), Some("MIT"));
        assert_eq!(metadata.get_scalar("version"), Some("0.1.0"));
        assert_eq!(metadata.get_scalar("requires-python"), Some(">=3.10"));
    }

    #[test]
    fn test_inline_list_parses_in_order() {
        let metadata = parse_metadata(&block(&["# keywords = [\"a\", \"b\", \"c\"]"]));
        assert_eq!(metadata.get_list("keywords").unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn test_multiline_dependencies_keep_file_order() {
        let metadata = parse_metadata(&block(&[
            "# dependencies = [",
            "#   \"requests>=2.31\",",
            "#   'rich',",
            "#   \"typer[all]\",",
            "#   \"httpx\"",
            "# ]",
            "# title = \"After\"",
        ]));
        assert_eq!(
            metadata.dependencies(),
            ["requests>=2.31", "rich", "typer[all]", "httpx"]
        );
        assert_eq!(metadata.title(), Some("After"));
    }

    #[test]
    fn test_list_items_may_contain_equals_signs() {
        let metadata = parse_metadata(&block(&[
            "# dependencies = [",
            "#   \"numpy==1.26\",",
            "# ]",
        ]));
        assert_eq!(metadata.dependencies(), ["numpy==1.26"]);
    }

    #[test]
    fn test_list_opener_line_contributes_items() {
        let metadata = parse_metadata(&block(&[
            "# dependencies = [\"click\",",
            "#   \"rich\", \"httpx\",",
            "# ]",
        ]));
        assert_eq!(metadata.dependencies(), ["click", "rich", "httpx"]);
    }

    #[test]
    fn test_closing_bracket_on_item_line_commits() {
        let metadata = parse_metadata(&block(&[
            "# authors = [",
            "#   \"Ada\",",
            "#   \"Grace\"]",
            "# version = \"2\"",
        ]));
        assert_eq!(metadata.get_list("authors").unwrap(), ["Ada", "Grace"]);
        assert_eq!(metadata.get_scalar("version"), Some("2"));
    }

    #[test]
    fn test_malformed_inline_dependencies_degrade_to_empty_list() {
        let mut parser = MetadataParser::new(&block(&["# dependencies = [requests, rich]"]));
        let metadata = parser.parse();
        assert_eq!(
            metadata.get(DEPENDENCIES_KEY),
            Some(&MetadataValue::List(Vec::new()))
        );
        assert_eq!(parser.warnings().len(), 1);
    }

    #[test]
    fn test_malformed_inline_list_for_other_keys_keeps_raw_text() {
        let metadata = parse_metadata(&block(&["# keywords = [alpha, beta]"]));
        assert_eq!(metadata.get_scalar("keywords"), Some("[alpha, beta]"));
    }

    #[test]
    fn test_scalar_dependencies_become_a_list() {
        let metadata = parse_metadata(&block(&["# dependencies = \"typer\""]));
        assert_eq!(metadata.dependencies(), ["typer"]);
    }

    #[test]
    fn test_later_key_overwrites_earlier_in_place() {
        let metadata = parse_metadata(&block(&[
            "# title = \"First\"",
            "# author = \"A\"",
            "# title = \"Second\"",
        ]));
        let keys: Vec<&str> = metadata.keys().collect();
        assert_eq!(keys, ["title", "author"]);
        assert_eq!(metadata.title(), Some("Second"));
    }

    #[test]
    fn test_non_comment_line_commits_pending_list() {
        let mut parser = MetadataParser::new(&block(&[
            "# dependencies = [",
            "#   \"rich\",",
            "oops",
            "#   \"ignored\",",
        ]));
        let metadata = parser.parse();
        assert_eq!(metadata.dependencies(), ["rich"]);
        assert!(
            parser
                .warnings()
                .iter()
                .any(|w| w.contains("terminated by non-comment line"))
        );
    }

    #[test]
    fn test_non_comment_line_commits_pending_scalar() {
        let metadata = parse_metadata(&block(&["# title = \"Kept\"", "", "# author = \"B\""]));
        assert_eq!(metadata.title(), Some("Kept"));
        assert_eq!(metadata.get_scalar("author"), Some("B"));
    }

    #[test]
    fn test_comment_without_assignment_keeps_scalar_pending() {
        let metadata = parse_metadata(&block(&[
            "# title = \"Kept\"",
            "# just a remark",
            "#",
            "# version = \"1\"",
        ]));
        assert_eq!(metadata.title(), Some("Kept"));
        assert_eq!(metadata.get_scalar("version"), Some("1"));
        assert_eq!(metadata.len(), 2);
    }

    #[test]
    fn test_unterminated_list_is_committed_at_end() {
        let mut parser = MetadataParser::new(&block(&["# dependencies = [", "#   \"rich\","]));
        let metadata = parser.parse();
        assert_eq!(metadata.dependencies(), ["rich"]);
        assert!(parser.warnings().iter().any(|w| w.contains("closing")));
    }

    #[test]
    fn test_empty_key_is_skipped() {
        let mut parser = MetadataParser::new(&block(&["# = \"nothing\"", "# title = \"T\""]));
        let metadata = parser.parse();
        assert_eq!(metadata.len(), 1);
        assert_eq!(parser.warnings().len(), 1);
    }

    #[test]
    fn test_external_source_sets_script_source() {
        let metadata = parse_metadata(&block(&[
            "# title = \"Remote\"",
            "# external_source = \"https://gist.example/raw/tool.py\"",
        ]));
        assert_eq!(
            metadata.script_source.as_deref(),
            Some("https://gist.example/raw/tool.py")
        );
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "# /// script\r\n# title = \"Win\"\r\n# dependencies = [\r\n#   \"a\",\r\n# ]\r\n# ///\r\n";
        let metadata = parse_metadata(text);
        assert_eq!(metadata.title(), Some("Win"));
        assert_eq!(metadata.dependencies(), ["a"]);
    }

    #[test]
    fn test_parse_is_repeatable() {
        let mut parser = MetadataParser::new(&block(&["# dependencies = [oops"]));
        let first = parser.parse();
        let first_warnings = parser.warnings().to_vec();
        let second = parser.parse();
        assert_eq!(first, second);
        assert_eq!(first_warnings, parser.warnings());
    }
}
