//! Core types for embedded script manifests and command signatures.
//!
//! This crate defines the value results shared by the extractors and the
//! site-assembly tooling that consumes them:
//!
//! - [`ScriptMetadata`] — ordered key/value manifest recovered from a
//!   script's comment block, plus the resolved script source.
//! - [`CommandSignature`] / [`ParameterSpec`] — reconstructed command entry
//!   points with type text and default classification.
//! - [`LiteralValue`] and [`parse_literal`] — a constrained parser for
//!   constant expressions that never evaluates code.
//! - [`sanitize_identifier`] and [`IdentifierAllocator`] — identifier-safe
//!   names for generated wrappers.
//! - [`format_metadata`] — display rows for metadata tables.
//! - [`ScriptCatalog`] — a versioned bundle of per-script records.
//!
//! # Example
//!
//! ```
//! use script_manifest_core::*;
//!
//! let mut metadata = ScriptMetadata::new();
//! metadata.insert("title", MetadataValue::from("Hello World"));
//!
//! let sig = CommandSignature::new("greet")
//!     .with_parameter(ParameterSpec::new("name", "str"));
//!
//! let mut record = ScriptRecord::new("hello_world", "hello-world/0.1.0.py", metadata);
//! record.commands.push(sig);
//!
//! let name = wrapper_function_name(&record.identifier, "greet");
//! assert_eq!(
//!     render_wrapper_signature(&name, &record.commands[0]),
//!     "def hello_world_greet(name: str):"
//! );
//! ```

mod catalog;
mod format;
mod literal;
mod naming;
mod types;
mod wrapper;

pub use catalog::{ScriptCatalog, ScriptRecord};
pub use format::{FormattedEntry, bullet_list, display_key, format_metadata};
pub use literal::{LiteralError, parse_literal, parse_string_list};
pub use naming::{IdentifierAllocator, sanitize_identifier};
pub use types::*;
pub use wrapper::{render_parameter, render_wrapper_signature, wrapper_function_name};
