use serde::{Deserialize, Serialize};

use crate::{CommandSignature, ScriptMetadata};

/// Everything extracted from one script file.
///
/// # Examples
///
/// ```
/// use script_manifest_core::*;
///
/// let record = ScriptRecord::new("hello_world", "hello-world/0.1.0.py", ScriptMetadata::new());
/// assert!(record.commands.is_empty());
/// assert_eq!(record.identifier, "hello_world");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptRecord {
    /// Collision-free identifier derived from the script's name.
    pub identifier: String,
    /// Path of the script relative to the collection root.
    pub path: String,
    pub metadata: ScriptMetadata,
    /// Command entry points in file order.
    pub commands: Vec<CommandSignature>,
    /// Recovery notes from metadata parsing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ScriptRecord {
    pub fn new(identifier: &str, path: &str, metadata: ScriptMetadata) -> Self {
        Self {
            identifier: identifier.to_string(),
            path: path.to_string(),
            metadata,
            commands: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Serializable bundle of script records handed to site assembly.
///
/// # Examples
///
/// ```
/// use script_manifest_core::*;
///
/// let mut catalog = ScriptCatalog::new("1.0.0", "2024-01-15T10:30:00Z");
/// catalog.scripts.push(ScriptRecord::new("hello", "hello/0.1.0.py", ScriptMetadata::new()));
///
/// assert_eq!(catalog.script_count(), 1);
/// assert!(catalog.find("hello").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptCatalog {
    /// Catalog contract version (from
    /// [`CATALOG_CONTRACT_VERSION`](crate::CATALOG_CONTRACT_VERSION)).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Catalog format version (semver string).
    pub version: String,
    pub name: Option<String>,
    /// ISO-8601 timestamp for catalog creation.
    pub generated_at: String,
    pub scripts: Vec<ScriptRecord>,
}

impl ScriptCatalog {
    pub fn new(version: impl Into<String>, generated_at: impl Into<String>) -> Self {
        Self {
            schema_version: Some(crate::CATALOG_CONTRACT_VERSION.to_string()),
            version: version.into(),
            name: None,
            generated_at: generated_at.into(),
            scripts: Vec::new(),
        }
    }

    pub fn script_count(&self) -> usize {
        self.scripts.len()
    }

    /// Looks a script up by identifier.
    pub fn find(&self, identifier: &str) -> Option<&ScriptRecord> {
        self.scripts.iter().find(|s| s.identifier == identifier)
    }
}
