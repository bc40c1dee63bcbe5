//! Basic script inspection example.
//!
//! Demonstrates how to recover a script's manifest and command signatures
//! from source text without running the script.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p script-manifest-discovery --example inspect_script
//! ```

use script_manifest_core::{format_metadata, render_wrapper_signature, wrapper_function_name};
use script_manifest_discovery::config::InspectConfig;
use script_manifest_discovery::inspect_script;

fn main() {
    // A script stored as `<name>/<version>.py`
    let source = r#"# /// script
# title = "Word Count"
# description = "Counts words in a file"
# dependencies = [
#   "typer>=0.9",
#   "rich",
# ]
# ///

import typer
from pathlib import Path

app = typer.Typer()


@app.command()
def count(path: Path, top: int = 10, ignore_case: bool = True):
    """Print the most common words."""
"#;

    let config = InspectConfig {
        base_url: "https://example.github.io/scripts".to_string(),
        ..InspectConfig::default()
    };

    let report = match inspect_script("word-count/1.0.0.py", source, &config) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("inspection failed: {err}");
            std::process::exit(1);
        }
    };

    println!("Script: {}", report.metadata.title_or_default());
    for row in format_metadata(&report.metadata) {
        println!("  {}: {}", row.label, row.value);
    }

    if !report.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &report.warnings {
            println!("  - {warning}");
        }
    }

    println!("\nCommands ({}):", report.commands.len());
    for command in &report.commands {
        let wrapper = wrapper_function_name(&report.identifier_seed, &command.name);
        println!("  {}", render_wrapper_signature(&wrapper, command));
        if let Some(doc) = &command.docstring {
            println!("      {doc}");
        }
    }
}
