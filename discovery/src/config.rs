//! Inspection configuration.
//!
//! Defines the YAML-serializable settings shared by the metadata parser,
//! the command extractor, and catalog assembly.
//!
//! # Example YAML
//!
//! ```yaml
//! base_url: "https://example.github.io/scripts"
//! exclude:
//!   - scratch/draft.py
//! extractor:
//!   marker_attributes:
//!     - command
//!   fallback_type: str
//! catalog:
//!   name: my-scripts
//! ```
//!
//! Every section is optional; missing fields take their defaults.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use script_manifest_core::DEFAULT_TYPE_TEXT;
use serde::{Deserialize, Serialize};

use crate::error::{InspectError, Result};

/// Settings for the command-signature extractor.
///
/// # Examples
///
/// ```
/// # use script_manifest_discovery::config::ExtractorConfig;
/// let config = ExtractorConfig::default();
/// assert_eq!(config.marker_attributes, ["command"]);
/// assert_eq!(config.fallback_type, "str");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Attribute names that mark a decorator call as a command marker
    /// (`command` matches `@app.command()`).
    pub marker_attributes: Vec<String>,
    /// Type text used when a parameter has no renderable annotation.
    pub fallback_type: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            marker_attributes: vec!["command".to_string()],
            fallback_type: DEFAULT_TYPE_TEXT.to_string(),
        }
    }
}

/// Settings for catalog assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Optional catalog name metadata.
    pub name: Option<String>,
}

/// Top-level inspection configuration.
///
/// Loaded from a YAML file (typically `script-manifest.yml` next to the
/// script collection).
///
/// # Examples
///
/// ```no_run
/// use script_manifest_discovery::config::InspectConfig;
///
/// let config = InspectConfig::load("script-manifest.yml").unwrap();
/// println!("scripts are served from {}", config.base_url);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    /// Base URL the script collection is published under; used to
    /// synthesize `script_source` when a script has no `external_source`.
    pub base_url: String,
    /// Relative paths (or bare file names) to skip when building catalogs.
    pub exclude: Vec<String>,
    pub extractor: ExtractorConfig,
    pub catalog: CatalogConfig,
}

impl InspectConfig {
    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](InspectError::Io) if the file cannot be read,
    /// [`Yaml`](InspectError::Yaml) if parsing fails, or
    /// [`InvalidConfig`](InspectError::InvalidConfig) if validation fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Checks that the extractor has something to match and a fallback type.
    pub fn validate(&self) -> Result<()> {
        let markers = &self.extractor.marker_attributes;
        if markers.is_empty() {
            return Err(InspectError::InvalidConfig(
                "extractor.marker_attributes cannot be empty".to_string(),
            ));
        }
        if markers.iter().any(|m| m.trim().is_empty()) {
            return Err(InspectError::InvalidConfig(
                "extractor.marker_attributes cannot contain blank names".to_string(),
            ));
        }
        if self.extractor.fallback_type.trim().is_empty() {
            return Err(InspectError::InvalidConfig(
                "extractor.fallback_type cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns `true` if the script at `relative_path` should be skipped.
    ///
    /// An entry matches either the whole relative path or the file name.
    pub fn is_excluded(&self, relative_path: &str) -> bool {
        let normalized = relative_path.trim_start_matches("./");
        let file_name = Path::new(normalized)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(normalized);
        self.exclude
            .iter()
            .any(|entry| entry == normalized || entry == file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
base_url: "https://example.github.io/scripts"
exclude:
  - scratch/draft.py
  - broken.py
extractor:
  marker_attributes:
    - command
    - callback
  fallback_type: Any
catalog:
  name: my-scripts
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: InspectConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.base_url, "https://example.github.io/scripts");
        assert_eq!(config.extractor.marker_attributes, ["command", "callback"]);
        assert_eq!(config.extractor.fallback_type, "Any");
        assert_eq!(config.catalog.name.as_deref(), Some("my-scripts"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_minimal_uses_defaults() {
        let config: InspectConfig = serde_yaml::from_str("base_url: https://x.org").unwrap();
        assert_eq!(config.extractor, ExtractorConfig::default());
        assert!(config.exclude.is_empty());
        assert!(config.catalog.name.is_none());
    }

    #[test]
    fn test_validate_rejects_empty_markers() {
        let yaml = "extractor:\n  marker_attributes: []\n";
        let config: InspectConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(InspectError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_blank_fallback_type() {
        let mut config = InspectConfig::default();
        config.extractor.fallback_type = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_excluded_matches_path_or_file_name() {
        let config: InspectConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert!(config.is_excluded("scratch/draft.py"));
        assert!(config.is_excluded("./scratch/draft.py"));
        assert!(config.is_excluded("tools/broken.py"));
        assert!(!config.is_excluded("hello-world/0.1.0.py"));
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script-manifest.yml");

        let original: InspectConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = InspectConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }
}
