//! Offline extraction of embedded script manifests and command signatures.
//!
//! Scripts in a collection carry their own manifest as a comment block and
//! mark their entry points with decorator calls. This crate recovers both
//! without importing or executing the script:
//!
//! - [`metadata`]: a tolerant line-oriented parser for the
//!   `# /// script` ... `# ///` block.
//! - [`signature`]: a tree-sitter walk that reconstructs decorated command
//!   functions, their parameter types and literal defaults.
//! - [`inspect`]: runs both over one script and assembles catalogs.
//!
//! # Example
//!
//! ```
//! use script_manifest_discovery::{extract_commands, parse_metadata};
//!
//! let source = "\
//! ## /// script
//! ## title = \"Hello World\"
//! ## dependencies = [\"typer\"]
//! ## ///
//! import typer
//! app = typer.Typer()
//!
//! @app.command()
//! def greet(name: str, count: int = 1):
//!     pass
//! ";
//!
//! let metadata = parse_metadata(source);
//! assert_eq!(metadata.title(), Some("Hello World"));
//! assert_eq!(metadata.dependencies(), ["typer".to_string()]);
//!
//! let commands = extract_commands(source).unwrap();
//! assert_eq!(commands[0].name, "greet");
//! assert_eq!(commands[0].parameters.len(), 2);
//! ```
//!
//! # Crate type
//!
//! This is a **library-only crate**. For command-line usage, use the
//! `script-manifest-cli` crate which provides the `script-inspect` binary.

pub mod config;
pub mod error;
pub mod inspect;
pub mod metadata;
pub mod output;
pub mod signature;

pub use config::InspectConfig;
pub use error::{InspectError, Result};
pub use inspect::{ScriptReport, build_catalog, inspect_file, inspect_script};
pub use metadata::{MetadataParser, parse_metadata};
pub use signature::{CommandExtractor, extract_commands};
